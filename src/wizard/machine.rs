//! Composer state machine
//!
//! Pure transition function over `(state, event)`. Side effects the caller
//! must run (persisting a draft, performing the final submission) are returned
//! as an [`Effect`] instead of being executed here, so the machine can be
//! driven and tested without storage or network.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::step::StepRegistry;
use super::validity::{validate_fields, FieldErrors};
use super::value::{merge, merged, DraftValue};
use crate::error::SubmitFailure;

/// Where the wizard is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Collecting step values
    Editing,
    /// Final submission in flight
    Submitting,
    /// Final submission succeeded; terminal
    Submitted,
}

/// State owned by one running wizard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposerState {
    pub current_step: String,
    pub value: DraftValue,
    pub is_submitting: bool,
    pub phase: Phase,
    /// Last submission failure, kept for display until the next attempt
    pub failure: Option<SubmitFailure>,
    /// Entity returned by a successful submission
    pub entity: Option<Value>,
}

impl ComposerState {
    /// Fresh wizard positioned on the first step
    pub fn new(registry: &StepRegistry) -> Self {
        Self::with_value(registry, DraftValue::new())
    }

    /// Wizard seeded with an existing value (edit or duplicate flows)
    pub fn with_value(registry: &StepRegistry, value: DraftValue) -> Self {
        Self {
            current_step: registry.first().id.to_string(),
            value,
            is_submitting: false,
            phase: Phase::Editing,
            failure: None,
            entity: None,
        }
    }

    /// Resume a draft.
    ///
    /// Lands on `last_step` when it exists and every step before it is done;
    /// otherwise on the first incomplete step, or the last step when all are
    /// done.
    pub fn resume(registry: &StepRegistry, value: DraftValue, last_step: Option<&str>) -> Self {
        let current = match last_step {
            Some(id) if registry.predecessors_done(id, &value) => id,
            _ => registry
                .first_incomplete(&value)
                .unwrap_or_else(|| registry.last())
                .id,
        };

        Self {
            current_step: current.to_string(),
            ..Self::with_value(registry, value)
        }
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Submitted
    }
}

/// Input to the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum ComposerEvent {
    /// A step form was submitted with its partial value
    SubmitStep { step_id: String, value: DraftValue },
    GoBack,
    GoToStep(String),
    SubmissionSucceeded(Value),
    SubmissionFailed(SubmitFailure),
}

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Persist the in-progress value as a draft
    SaveDraft,
    /// Perform the final submission with the aggregate value
    Submit(DraftValue),
}

/// Why an event left the state unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    UnknownStep,
    /// A step before the target is not done
    IncompletePredecessors,
    /// A submission is in flight
    Busy,
    /// The wizard already submitted
    Finished,
    /// Submission result arrived while no submission was in flight
    NotSubmitting,
}

/// What a transition did
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Step value accepted; moved to `to`
    Advanced { from: String, to: String },
    /// Navigation changed the current step
    Moved { to: String },
    /// Navigation was a no-op (e.g. back on the first step)
    Unchanged,
    /// Final submission triggered
    Submitting,
    Completed,
    Failed(SubmitFailure),
    Blocked(BlockReason),
    /// Local validation failed for the submitted step
    Rejected(FieldErrors),
}

#[derive(Debug, Clone)]
pub struct Transition {
    pub state: ComposerState,
    pub effect: Option<Effect>,
    pub outcome: Outcome,
}

impl Transition {
    fn stay(state: &ComposerState, outcome: Outcome) -> Self {
        Self {
            state: state.clone(),
            effect: None,
            outcome,
        }
    }
}

/// Apply `event` to `state`
pub fn transition(registry: &StepRegistry, state: &ComposerState, event: ComposerEvent) -> Transition {
    match event {
        ComposerEvent::SubmitStep { step_id, value } => submit_step(registry, state, &step_id, &value),
        ComposerEvent::GoBack => go_back(registry, state),
        ComposerEvent::GoToStep(step_id) => go_to_step(registry, state, &step_id),
        ComposerEvent::SubmissionSucceeded(entity) => {
            if state.phase != Phase::Submitting {
                return Transition::stay(state, Outcome::Blocked(BlockReason::NotSubmitting));
            }
            Transition {
                state: ComposerState {
                    is_submitting: false,
                    phase: Phase::Submitted,
                    failure: None,
                    entity: Some(entity),
                    ..state.clone()
                },
                effect: None,
                outcome: Outcome::Completed,
            }
        }
        ComposerEvent::SubmissionFailed(failure) => {
            if state.phase != Phase::Submitting {
                return Transition::stay(state, Outcome::Blocked(BlockReason::NotSubmitting));
            }
            // Stay on the last step so the user can fix and retry.
            Transition {
                state: ComposerState {
                    current_step: registry.last().id.to_string(),
                    is_submitting: false,
                    phase: Phase::Editing,
                    failure: Some(failure.clone()),
                    ..state.clone()
                },
                effect: None,
                outcome: Outcome::Failed(failure),
            }
        }
    }
}

fn guard_editing(state: &ComposerState) -> Option<Transition> {
    match state.phase {
        Phase::Editing => None,
        Phase::Submitting => Some(Transition::stay(state, Outcome::Blocked(BlockReason::Busy))),
        Phase::Submitted => Some(Transition::stay(state, Outcome::Blocked(BlockReason::Finished))),
    }
}

fn submit_step(
    registry: &StepRegistry,
    state: &ComposerState,
    step_id: &str,
    partial: &DraftValue,
) -> Transition {
    if let Some(blocked) = guard_editing(state) {
        return blocked;
    }
    let Some(step) = registry.get(step_id) else {
        return Transition::stay(state, Outcome::Blocked(BlockReason::UnknownStep));
    };

    let candidate = merged(&state.value, partial);
    if let Err(errors) = validate_fields(step.fields, &candidate) {
        return Transition::stay(state, Outcome::Rejected(errors));
    }

    let mut next = state.clone();
    merge(&mut next.value, partial);

    if registry.is_last(step_id) && registry.all_done(&next.value) {
        next.is_submitting = true;
        next.phase = Phase::Submitting;
        next.failure = None;
        let submit = next.value.clone();
        return Transition {
            state: next,
            effect: Some(Effect::Submit(submit)),
            outcome: Outcome::Submitting,
        };
    }

    let target = next_target(registry, step_id, &next.value);
    next.current_step = target.to_string();
    Transition {
        state: next,
        effect: Some(Effect::SaveDraft),
        outcome: Outcome::Advanced {
            from: step_id.to_string(),
            to: target.to_string(),
        },
    }
}

/// Step to show after `step_id` was submitted: the next incomplete step after
/// it, else the immediate next step, else (when submitted from the last step
/// with gaps left behind) the first incomplete step.
fn next_target<'r>(registry: &'r StepRegistry, step_id: &str, value: &DraftValue) -> &'r str {
    let position = registry.position(step_id).unwrap_or(0);
    let later = &registry.steps()[position + 1..];

    if let Some(step) = later.iter().find(|s| !(s.is_done)(value)) {
        return step.id;
    }
    if let Some(step) = later.first() {
        return step.id;
    }
    registry
        .first_incomplete(value)
        .unwrap_or_else(|| registry.last())
        .id
}

fn go_back(registry: &StepRegistry, state: &ComposerState) -> Transition {
    if let Some(blocked) = guard_editing(state) {
        return blocked;
    }
    match registry.previous(&state.current_step) {
        Some(prev) => Transition {
            state: ComposerState {
                current_step: prev.id.to_string(),
                ..state.clone()
            },
            effect: None,
            outcome: Outcome::Moved {
                to: prev.id.to_string(),
            },
        },
        None => Transition::stay(state, Outcome::Unchanged),
    }
}

fn go_to_step(registry: &StepRegistry, state: &ComposerState, step_id: &str) -> Transition {
    if let Some(blocked) = guard_editing(state) {
        return blocked;
    }
    if !registry.contains(step_id) {
        return Transition::stay(state, Outcome::Blocked(BlockReason::UnknownStep));
    }
    if !registry.predecessors_done(step_id, &state.value) {
        return Transition::stay(state, Outcome::Blocked(BlockReason::IncompletePredecessors));
    }
    if state.current_step == step_id {
        return Transition::stay(state, Outcome::Unchanged);
    }
    Transition {
        state: ComposerState {
            current_step: step_id.to_string(),
            ..state.clone()
        },
        effect: None,
        outcome: Outcome::Moved {
            to: step_id.to_string(),
        },
    }
}

//! Running wizard: binds the state machine to draft storage and submission

use std::sync::Arc;

use super::kind::SubmitMode;
use super::location::StepLocation;
use super::machine::{transition, ComposerEvent, ComposerState, Effect, Outcome};
use super::step::{LabelContext, StepDescriptor, StepRegistry};
use super::validity::ValidityTracker;
use super::value::DraftValue;
use crate::api::SubmissionDispatcher;
use crate::drafts::{Draft, DraftStore};
use crate::error::ComposerError;

/// One in-progress wizard session
pub struct Composer {
    registry: StepRegistry,
    mode: SubmitMode,
    state: ComposerState,
    drafts: Arc<dyn DraftStore>,
    dispatcher: SubmissionDispatcher,
    /// Stable for the session once the first draft is written
    draft_index: Option<usize>,
    draft: Option<Draft>,
}

impl Composer {
    /// New wizard on its first step
    pub fn start(
        registry: StepRegistry,
        mode: SubmitMode,
        drafts: Arc<dyn DraftStore>,
        dispatcher: SubmissionDispatcher,
    ) -> Self {
        Self::with_value(registry, mode, DraftValue::new(), drafts, dispatcher)
    }

    /// New wizard seeded with an existing entity (edit and duplicate flows)
    pub fn with_value(
        registry: StepRegistry,
        mode: SubmitMode,
        value: DraftValue,
        drafts: Arc<dyn DraftStore>,
        dispatcher: SubmissionDispatcher,
    ) -> Self {
        let state = ComposerState::with_value(&registry, value);
        tracing::debug!(wizard = %registry.kind(), ?mode, "composer started");
        Self {
            registry,
            mode,
            state,
            drafts,
            dispatcher,
            draft_index: None,
            draft: None,
        }
    }

    /// Resume the draft at `index`.
    ///
    /// `step_hint` (usually from the URL) wins over the step stored in the
    /// draft when every step before it is done.
    pub fn resume(
        registry: StepRegistry,
        index: usize,
        step_hint: Option<&str>,
        mode: SubmitMode,
        drafts: Arc<dyn DraftStore>,
        dispatcher: SubmissionDispatcher,
    ) -> Result<Self, ComposerError> {
        let draft = drafts.get(index)?.ok_or(ComposerError::DraftNotFound(index))?;

        let step = step_hint
            .filter(|hint| registry.predecessors_done(hint, &draft.value))
            .or(draft.step_id.as_deref());
        let state = ComposerState::resume(&registry, draft.value.clone(), step);

        tracing::info!(
            wizard = %registry.kind(),
            draft = index,
            step = %state.current_step,
            "resumed draft"
        );
        Ok(Self {
            registry,
            mode,
            state,
            drafts,
            dispatcher,
            draft_index: Some(index),
            draft: Some(draft),
        })
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    pub fn mode(&self) -> &SubmitMode {
        &self.mode
    }

    pub fn state(&self) -> &ComposerState {
        &self.state
    }

    pub fn draft_index(&self) -> Option<usize> {
        self.draft_index
    }

    pub fn current_step(&self) -> &StepDescriptor {
        // current_step always names a registry step
        self.registry
            .get(&self.state.current_step)
            .unwrap_or_else(|| self.registry.first())
    }

    pub fn label(&self, step: &StepDescriptor) -> String {
        step.label.render(&LabelContext {
            mode: &self.mode,
            value: &self.state.value,
        })
    }

    pub fn validity(&self) -> ValidityTracker {
        ValidityTracker::evaluate(&self.registry, &self.state.value)
    }

    pub fn location(&self) -> StepLocation {
        StepLocation::new(self.state.current_step.clone(), self.draft_index)
    }

    /// Submit a step form. Runs the final submission when this completes
    /// the wizard.
    pub async fn submit_step(&mut self, step_id: &str, value: DraftValue) -> Outcome {
        let (outcome, effect) = self.apply(ComposerEvent::SubmitStep {
            step_id: step_id.to_string(),
            value,
        });

        match effect {
            Some(Effect::SaveDraft) => {
                self.save_draft();
                outcome
            }
            Some(Effect::Submit(value)) => self.run_submission(value).await,
            None => outcome,
        }
    }

    /// Re-run the final submission after a failure
    pub async fn retry(&mut self) -> Outcome {
        let last = self.registry.last().id;
        self.submit_step(last, DraftValue::new()).await
    }

    pub fn go_back(&mut self) -> Outcome {
        self.apply(ComposerEvent::GoBack).0
    }

    pub fn go_to_step(&mut self, step_id: &str) -> Outcome {
        self.apply(ComposerEvent::GoToStep(step_id.to_string())).0
    }

    /// Abandon the wizard and delete its draft
    pub fn discard(&mut self) -> Result<(), ComposerError> {
        if let Some(index) = self.draft_index.take() {
            self.drafts.discard(index)?;
            tracing::info!(wizard = %self.registry.kind(), draft = index, "draft discarded");
        }
        self.draft = None;
        Ok(())
    }

    fn apply(&mut self, event: ComposerEvent) -> (Outcome, Option<Effect>) {
        let t = transition(&self.registry, &self.state, event);
        tracing::debug!(
            wizard = %self.registry.kind(),
            step = %t.state.current_step,
            outcome = ?t.outcome,
            "composer transition"
        );
        self.state = t.state;
        (t.outcome, t.effect)
    }

    async fn run_submission(&mut self, value: DraftValue) -> Outcome {
        let result = self
            .dispatcher
            .submit(&self.registry, &value, &self.mode)
            .await;

        let event = match result {
            Ok(entity) => ComposerEvent::SubmissionSucceeded(entity),
            Err(failure) => ComposerEvent::SubmissionFailed(failure),
        };
        let (outcome, _) = self.apply(event);

        match outcome {
            Outcome::Completed => {
                if let Err(e) = self.discard() {
                    tracing::warn!(error = %e, "failed to discard submitted draft");
                }
            }
            // Keep the latest value so the user can retry after a reload
            Outcome::Failed(_) => self.save_draft(),
            _ => {}
        }
        outcome
    }

    /// Persist the current value. Storage errors are logged, never fatal.
    fn save_draft(&mut self) {
        if !self.mode.persists_drafts() {
            return;
        }

        let step_id = Some(self.state.current_step.clone());
        let draft = match &self.draft {
            Some(existing) => existing.updated(self.state.value.clone(), step_id),
            None => Draft::new(self.state.value.clone(), step_id),
        };

        let saved = match self.draft_index {
            Some(index) => self.drafts.save(index, draft.clone()),
            None => self.drafts.insert(draft.clone()),
        };

        match saved {
            Ok(index) => {
                tracing::debug!(wizard = %self.registry.kind(), draft = index, "draft saved");
                self.draft_index = Some(index);
                self.draft = Some(draft);
            }
            Err(e) => {
                tracing::warn!(wizard = %self.registry.kind(), error = %e, "failed to save draft");
            }
        }
    }
}

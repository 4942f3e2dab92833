//! Step descriptors and the static registry that orders them

use thiserror::Error;

use super::kind::{SubmitMode, WizardKind};
use super::validity::FieldSchema;
use super::value::DraftValue;

/// Context available when computing a step label
#[derive(Debug, Clone, Copy)]
pub struct LabelContext<'a> {
    pub mode: &'a SubmitMode,
    pub value: &'a DraftValue,
}

/// Label for a step, fixed or derived from the wizard's current state
#[derive(Clone, Copy)]
pub enum StepLabel {
    Static(&'static str),
    Contextual(fn(&LabelContext<'_>) -> String),
}

impl StepLabel {
    pub fn render(&self, ctx: &LabelContext<'_>) -> String {
        match self {
            StepLabel::Static(label) => (*label).to_string(),
            StepLabel::Contextual(f) => f(ctx),
        }
    }
}

impl std::fmt::Debug for StepLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepLabel::Static(label) => write!(f, "Static({label:?})"),
            StepLabel::Contextual(_) => f.write_str("Contextual(..)"),
        }
    }
}

/// Static metadata for one step of a wizard
#[derive(Clone, Copy)]
pub struct StepDescriptor {
    pub id: &'static str,
    pub label: StepLabel,
    /// Whether the aggregate value already satisfies this step
    pub is_done: fn(&DraftValue) -> bool,
    /// Form definition rendered for this step; also its validation schema
    pub fields: &'static [FieldSchema],
}

impl std::fmt::Debug for StepDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepDescriptor")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

impl StepDescriptor {
    /// Whether this step's form declares `field`
    pub fn declares(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.name == field)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("wizard '{0}' has no steps")]
    Empty(WizardKind),
    #[error("wizard '{0}' declares step '{1}' more than once")]
    DuplicateStep(WizardKind, &'static str),
}

/// Ordered step table for a wizard; array order is wizard order
#[derive(Debug, Clone)]
pub struct StepRegistry {
    kind: WizardKind,
    steps: Vec<StepDescriptor>,
}

impl StepRegistry {
    pub fn new(kind: WizardKind, steps: Vec<StepDescriptor>) -> Result<Self, RegistryError> {
        if steps.is_empty() {
            return Err(RegistryError::Empty(kind));
        }
        for (i, step) in steps.iter().enumerate() {
            if steps[..i].iter().any(|s| s.id == step.id) {
                return Err(RegistryError::DuplicateStep(kind, step.id));
            }
        }
        Ok(Self { kind, steps })
    }

    pub fn kind(&self) -> WizardKind {
        self.kind
    }

    pub fn steps(&self) -> &[StepDescriptor] {
        &self.steps
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.steps.iter().map(|s| s.id)
    }

    pub fn get(&self, id: &str) -> Option<&StepDescriptor> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn first(&self) -> &StepDescriptor {
        // non-empty by construction
        &self.steps[0]
    }

    pub fn last(&self) -> &StepDescriptor {
        &self.steps[self.steps.len() - 1]
    }

    pub fn is_last(&self, id: &str) -> bool {
        self.last().id == id
    }

    pub fn next(&self, id: &str) -> Option<&StepDescriptor> {
        self.position(id).and_then(|i| self.steps.get(i + 1))
    }

    pub fn previous(&self, id: &str) -> Option<&StepDescriptor> {
        self.position(id)
            .and_then(|i| i.checked_sub(1))
            .map(|i| &self.steps[i])
    }

    pub fn all_done(&self, value: &DraftValue) -> bool {
        self.steps.iter().all(|s| (s.is_done)(value))
    }

    pub fn first_incomplete(&self, value: &DraftValue) -> Option<&StepDescriptor> {
        self.steps.iter().find(|s| !(s.is_done)(value))
    }

    /// Whether every step before `id` is done. False for unknown ids.
    pub fn predecessors_done(&self, id: &str, value: &DraftValue) -> bool {
        match self.position(id) {
            Some(i) => self.steps[..i].iter().all(|s| (s.is_done)(value)),
            None => false,
        }
    }

    /// First step whose form declares `field`
    pub fn step_for_field(&self, field: &str) -> Option<&StepDescriptor> {
        self.steps.iter().find(|s| s.declares(field))
    }
}

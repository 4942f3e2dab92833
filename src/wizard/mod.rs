//! Multi-step composer: step registry, validity, state machine and the
//! runtime that ties them to drafts and submission.

pub mod composer;
pub mod kind;
pub mod location;
pub mod machine;
pub mod step;
pub mod validity;
pub mod value;


pub use composer::Composer;
pub use kind::{SubmitMode, WizardKind};
pub use location::StepLocation;
pub use machine::{transition, BlockReason, ComposerEvent, ComposerState, Effect, Outcome, Phase};
pub use step::{StepDescriptor, StepLabel, StepRegistry};
pub use validity::{FieldErrors, FieldSchema, FieldType, StepValidity, ValidityTracker};
pub use value::DraftValue;

//! Wizard definitions for the platform's entities
//!
//! Each entity contributes a static step table and the request shape the
//! remote API accepts for it.

pub mod organization;
pub mod project;

use crate::api::EntityShape;
use crate::wizard::kind::WizardKind;

/// Request shape for `kind`
pub fn shape(kind: WizardKind) -> EntityShape {
    match kind {
        WizardKind::Project => project::SHAPE,
        WizardKind::Organization => organization::SHAPE,
    }
}

//! Error taxonomy surfaced by the composer
//!
//! Local validation errors stay inside the state machine and never reach the
//! network. Submission failures are caught at the dispatcher boundary and
//! re-surfaced as composer state so the user can retry by hand.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::drafts::DraftError;

/// A server field error mapped back onto the step whose form owns the field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AttributedFieldError {
    /// None when no step declares the field
    pub step_id: Option<String>,
    pub field: String,
    pub message: String,
}

/// Why a final submission did not produce an entity
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmitFailure {
    /// Transport failure or unexpected response; retry manually
    #[error("network error: {message}")]
    Network { message: String },
    /// The remote API rejected field-level content
    #[error("server rejected {} field(s)", errors.len())]
    ServerValidation { errors: Vec<AttributedFieldError> },
}

impl SubmitFailure {
    pub fn network(message: impl Into<String>) -> Self {
        SubmitFailure::Network {
            message: message.into(),
        }
    }

    /// Field errors attributed to `step_id`
    pub fn errors_for_step(&self, step_id: &str) -> Vec<&AttributedFieldError> {
        match self {
            SubmitFailure::ServerValidation { errors } => errors
                .iter()
                .filter(|e| e.step_id.as_deref() == Some(step_id))
                .collect(),
            SubmitFailure::Network { .. } => Vec::new(),
        }
    }
}

/// Errors raised while setting up or driving a composer session
#[derive(Debug, Error)]
pub enum ComposerError {
    #[error("draft {0} does not exist")]
    DraftNotFound(usize),
    #[error(transparent)]
    Draft(#[from] DraftError),
}

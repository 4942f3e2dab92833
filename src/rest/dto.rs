//! Data Transfer Objects for the REST API.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::drafts::Draft;
use crate::error::{AttributedFieldError, SubmitFailure};
use crate::wizard::validity::{FieldErrors, FieldSchema, FieldType};
use crate::wizard::{Composer, Phase, StepDescriptor, StepLocation, SubmitMode, WizardKind};
use crate::wizard::value::DraftValue;

// =============================================================================
// Health DTOs
// =============================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
    pub wizard_count: usize,
    pub session_count: usize,
}

// =============================================================================
// Wizard DTOs
// =============================================================================

/// Summary of a wizard for listing
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WizardSummary {
    pub kind: WizardKind,
    pub name: String,
    /// Remote collection the entity is submitted to
    pub collection: String,
    pub step_count: usize,
}

impl From<WizardKind> for WizardSummary {
    fn from(kind: WizardKind) -> Self {
        Self {
            kind,
            name: kind.display_name().to_string(),
            collection: kind.collection().to_string(),
            step_count: kind.registry().steps().len(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FieldResponse {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl From<&FieldSchema> for FieldResponse {
    fn from(f: &FieldSchema) -> Self {
        Self {
            name: f.name.to_string(),
            label: f.label.to_string(),
            field_type: f.field_type,
            required: f.required,
            max_length: f.max_length,
        }
    }
}

/// Step definition as shown to a client
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StepResponse {
    pub id: String,
    pub label: String,
    pub fields: Vec<FieldResponse>,
}

impl StepResponse {
    pub fn new(step: &StepDescriptor, label: String) -> Self {
        Self {
            id: step.id.to_string(),
            label,
            fields: step.fields.iter().map(FieldResponse::from).collect(),
        }
    }
}

// =============================================================================
// Draft DTOs
// =============================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DraftResponse {
    pub index: usize,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    #[schema(value_type = Object)]
    pub value: DraftValue,
}

impl DraftResponse {
    pub fn new(index: usize, draft: Draft) -> Self {
        Self {
            index,
            created_at: draft.created_at,
            updated_at: draft.updated_at,
            step_id: draft.step_id,
            value: draft.value,
        }
    }
}

// =============================================================================
// Session DTOs
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    #[default]
    Create,
    Edit,
    Duplicate,
}

/// Request to start a wizard session
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub mode: SessionMode,
    /// Record being edited (required for `edit`)
    #[serde(default)]
    pub entity_id: Option<String>,
    /// Resume this draft instead of starting empty
    #[serde(default)]
    pub draft: Option<usize>,
    /// Step to open when resuming, usually read from the page URL
    #[serde(default)]
    pub step: Option<String>,
    /// Initial value for edit and duplicate flows
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub value: Option<DraftValue>,
}

impl CreateSessionRequest {
    pub fn submit_mode(&self) -> Result<SubmitMode, String> {
        match (self.mode, &self.entity_id) {
            (SessionMode::Create, _) => Ok(SubmitMode::Create),
            (SessionMode::Duplicate, _) => Ok(SubmitMode::Duplicate),
            (SessionMode::Edit, Some(id)) if !id.trim().is_empty() => {
                Ok(SubmitMode::Edit { id: id.clone() })
            }
            (SessionMode::Edit, _) => Err("edit sessions need an entity_id".to_string()),
        }
    }
}

/// One step of a running session
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionStep {
    pub id: String,
    pub label: String,
    pub current: bool,
    pub done: bool,
    pub valid: bool,
    /// Local validation messages for this step's fields
    pub errors: FieldErrors,
    /// Server errors from the last submission attributed to this step
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub server_errors: Vec<AttributedFieldError>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub id: Uuid,
    pub kind: WizardKind,
    pub mode: SubmitMode,
    pub phase: Phase,
    pub current_step: String,
    pub is_submitting: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft_index: Option<usize>,
    pub location: StepLocation,
    pub steps: Vec<SessionStep>,
    #[schema(value_type = Object)]
    pub value: DraftValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<SubmitFailure>,
    /// Entity stored by the remote API once submitted
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub entity: Option<Value>,
}

impl SessionResponse {
    pub fn from_composer(id: Uuid, composer: &Composer) -> Self {
        let state = composer.state();
        let validity = composer.validity();

        let steps = composer
            .registry()
            .steps()
            .iter()
            .map(|step| {
                let (done, valid, errors) = match validity.get(step.id) {
                    Some(v) => (v.done, v.valid, v.errors.clone()),
                    None => (false, false, FieldErrors::new()),
                };
                let server_errors = state
                    .failure
                    .as_ref()
                    .map(|f| f.errors_for_step(step.id).into_iter().cloned().collect())
                    .unwrap_or_default();

                SessionStep {
                    id: step.id.to_string(),
                    label: composer.label(step),
                    current: state.current_step == step.id,
                    done,
                    valid,
                    errors,
                    server_errors,
                }
            })
            .collect();

        Self {
            id,
            kind: composer.registry().kind(),
            mode: composer.mode().clone(),
            phase: state.phase,
            current_step: state.current_step.clone(),
            is_submitting: state.is_submitting,
            draft_index: composer.draft_index(),
            location: composer.location(),
            steps,
            value: state.value.clone(),
            failure: state.failure.clone(),
            entity: state.entity.clone(),
        }
    }
}

/// What a session action did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Advanced,
    Moved,
    Unchanged,
    Submitting,
    Completed,
    Failed,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransitionResponse {
    pub outcome: OutcomeKind,
    pub session: SessionResponse,
}

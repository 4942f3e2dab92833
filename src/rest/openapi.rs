//! OpenAPI specification builder using utoipa.

use utoipa::OpenApi;

use crate::drafts::Draft;
use crate::error::{AttributedFieldError, SubmitFailure};
use crate::rest::dto::{
    CreateSessionRequest, DraftResponse, FieldResponse, HealthResponse, OutcomeKind,
    SessionMode, SessionResponse, SessionStep, StatusResponse, StepResponse, TransitionResponse,
    WizardSummary,
};
use crate::rest::error::ErrorResponse;
use crate::wizard::validity::FieldType;
use crate::wizard::{Phase, StepLocation, SubmitMode, WizardKind};

/// OpenAPI documentation for the composer REST API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Composer API",
        description = "REST API for driving multi-step entity composers: step navigation, drafts and final submission.",
        license(name = "MIT")
    ),
    paths(
        // Health endpoints
        crate::rest::routes::health::health,
        crate::rest::routes::health::status,
        crate::rest::routes::health::openapi,
        // Wizard endpoints
        crate::rest::routes::wizards::list,
        crate::rest::routes::wizards::steps,
        // Draft endpoints
        crate::rest::routes::drafts::list,
        crate::rest::routes::drafts::discard,
        // Session endpoints
        crate::rest::routes::sessions::create,
        crate::rest::routes::sessions::get_one,
        crate::rest::routes::sessions::discard,
        crate::rest::routes::sessions::submit_step,
        crate::rest::routes::sessions::back,
        crate::rest::routes::sessions::go_to,
    ),
    components(
        schemas(
            // Response types
            HealthResponse,
            StatusResponse,
            WizardSummary,
            StepResponse,
            FieldResponse,
            FieldType,
            DraftResponse,
            Draft,
            SessionResponse,
            SessionStep,
            TransitionResponse,
            OutcomeKind,
            StepLocation,
            Phase,
            SubmitFailure,
            AttributedFieldError,
            ErrorResponse,
            // Request types
            CreateSessionRequest,
            SessionMode,
            SubmitMode,
            WizardKind,
        )
    ),
    tags(
        (name = "Health", description = "Health check and status endpoints"),
        (name = "Wizards", description = "Wizard definitions and their steps"),
        (name = "Drafts", description = "Stored in-progress wizard values"),
        (name = "Sessions", description = "Running wizards: step submission and navigation"),
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate the OpenAPI specification as a JSON string
    pub fn json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }
}

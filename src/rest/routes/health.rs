//! Health check, status and API description endpoints.

use axum::{extract::State, Json};
use utoipa::OpenApi;

use crate::rest::dto::{HealthResponse, StatusResponse};
use crate::rest::openapi::ApiDoc;
use crate::rest::state::ApiState;
use crate::wizard::WizardKind;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Get service status with session info
#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "Health",
    responses(
        (status = 200, description = "Service status with session info", body = StatusResponse)
    )
)]
pub async fn status(State(state): State<ApiState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        wizard_count: WizardKind::all().len(),
        session_count: state.session_count().await,
    })
}

/// OpenAPI description of this API
#[utoipa::path(
    get,
    path = "/api/v1/openapi.json",
    tag = "Health",
    responses(
        (status = 200, description = "OpenAPI document", body = Object)
    )
)]
pub async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockEntityApi;
    use crate::config::Config;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_health() {
        let resp = health().await;
        assert_eq!(resp.status, "ok");
        assert!(!resp.version.is_empty());
    }

    #[tokio::test]
    async fn test_status() {
        let state = ApiState::new(Config::default(), Arc::new(MockEntityApi::new()));

        let resp = status(State(state)).await;
        assert_eq!(resp.status, "ok");
        assert_eq!(resp.wizard_count, 2);
        assert_eq!(resp.session_count, 0);
    }

    #[tokio::test]
    async fn test_openapi_lists_session_routes() {
        let doc = openapi().await;
        assert!(doc.paths.paths.contains_key("/api/v1/sessions/{id}/steps/{step_id}"));
    }
}

//! Wizard session endpoints.
//!
//! A session is one running composer held in server memory. Step submissions,
//! navigation and discard act on it; drafts are persisted per wizard kind as a
//! side effect.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use uuid::Uuid;

use super::wizards::parse_kind;
use crate::rest::dto::{CreateSessionRequest, OutcomeKind, SessionResponse, TransitionResponse};
use crate::rest::error::{ApiError, ErrorResponse};
use crate::rest::state::{ApiState, SharedComposer};
use crate::wizard::value::from_json;
use crate::wizard::{BlockReason, Composer, Outcome};

async fn find(state: &ApiState, id: Uuid) -> Result<SharedComposer, ApiError> {
    state
        .session(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Session '{}' not found", id)))
}

/// Map a composer outcome onto a response kind or an error status
fn outcome_kind(outcome: Outcome, step_id: &str) -> Result<OutcomeKind, ApiError> {
    match outcome {
        Outcome::Advanced { .. } => Ok(OutcomeKind::Advanced),
        Outcome::Moved { .. } => Ok(OutcomeKind::Moved),
        Outcome::Unchanged => Ok(OutcomeKind::Unchanged),
        Outcome::Submitting => Ok(OutcomeKind::Submitting),
        Outcome::Completed => Ok(OutcomeKind::Completed),
        Outcome::Failed(_) => Ok(OutcomeKind::Failed),
        Outcome::Rejected(fields) => Err(ApiError::ValidationError {
            message: format!("Step '{}' failed validation", step_id),
            fields,
        }),
        Outcome::Blocked(BlockReason::UnknownStep) => {
            Err(ApiError::NotFound(format!("Step '{}' not found", step_id)))
        }
        Outcome::Blocked(BlockReason::IncompletePredecessors) => Err(ApiError::Conflict(
            format!("Steps before '{}' are not complete", step_id),
        )),
        Outcome::Blocked(BlockReason::Busy) => {
            Err(ApiError::Conflict("A submission is in progress".to_string()))
        }
        Outcome::Blocked(BlockReason::Finished) => {
            Err(ApiError::Conflict("The wizard was already submitted".to_string()))
        }
        Outcome::Blocked(BlockReason::NotSubmitting) => {
            Err(ApiError::Conflict("No submission is in progress".to_string()))
        }
    }
}

/// Start a wizard session, optionally resuming a draft
#[utoipa::path(
    post,
    path = "/api/v1/wizards/{kind}/sessions",
    tag = "Sessions",
    params(
        ("kind" = String, Path, description = "Wizard kind")
    ),
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session started", body = SessionResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Wizard or draft not found", body = ErrorResponse)
    )
)]
pub async fn create(
    State(state): State<ApiState>,
    Path(kind): Path<String>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let kind = parse_kind(&kind)?;
    let mode = request.submit_mode().map_err(ApiError::BadRequest)?;
    let drafts = state.draft_store(kind);
    let dispatcher = state.dispatcher(kind);

    let composer = match request.draft {
        Some(index) => Composer::resume(
            kind.registry(),
            index,
            request.step.as_deref(),
            mode,
            drafts,
            dispatcher,
        )?,
        None => Composer::with_value(
            kind.registry(),
            mode,
            request.value.unwrap_or_default(),
            drafts,
            dispatcher,
        ),
    };

    let id = Uuid::new_v4();
    let body = SessionResponse::from_composer(id, &composer);
    state.insert_session(id, composer).await;
    tracing::info!(wizard = %kind, session = %id, "session started");

    Ok((StatusCode::CREATED, Json(body)))
}

/// Get a session
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}",
    tag = "Sessions",
    params(
        ("id" = Uuid, Path, description = "Session id")
    ),
    responses(
        (status = 200, description = "Session state", body = SessionResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    )
)]
pub async fn get_one(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = find(&state, id).await?;
    let composer = session.lock().await;
    Ok(Json(SessionResponse::from_composer(id, &composer)))
}

/// Abandon a session and delete its draft
#[utoipa::path(
    delete,
    path = "/api/v1/sessions/{id}",
    tag = "Sessions",
    params(
        ("id" = Uuid, Path, description = "Session id")
    ),
    responses(
        (status = 204, description = "Session discarded"),
        (status = 404, description = "Session not found", body = ErrorResponse)
    )
)]
pub async fn discard(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let session = state
        .remove_session(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Session '{}' not found", id)))?;
    session.lock().await.discard()?;
    tracing::info!(session = %id, "session discarded");
    Ok(StatusCode::NO_CONTENT)
}

/// Submit one step's form values
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/steps/{step_id}",
    tag = "Sessions",
    params(
        ("id" = Uuid, Path, description = "Session id"),
        ("step_id" = String, Path, description = "Step being submitted")
    ),
    request_body(content = Object, description = "Partial value collected by the step form"),
    responses(
        (status = 200, description = "Step accepted", body = TransitionResponse),
        (status = 400, description = "Body is not a JSON object", body = ErrorResponse),
        (status = 404, description = "Session or step not found", body = ErrorResponse),
        (status = 409, description = "Wizard is busy or finished", body = ErrorResponse),
        (status = 422, description = "Step values failed validation", body = ErrorResponse)
    )
)]
pub async fn submit_step(
    State(state): State<ApiState>,
    Path((id, step_id)): Path<(Uuid, String)>,
    Json(body): Json<Value>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let partial = from_json(body)
        .ok_or_else(|| ApiError::BadRequest("Step values must be a JSON object".to_string()))?;

    let session = find(&state, id).await?;
    let mut composer = session.lock().await;
    let outcome = composer.submit_step(&step_id, partial).await;
    let completed = outcome == Outcome::Completed;

    let response = TransitionResponse {
        outcome: outcome_kind(outcome, &step_id)?,
        session: SessionResponse::from_composer(id, &composer),
    };
    drop(composer);

    // A submitted wizard is finished; its session goes with it
    if completed {
        state.remove_session(id).await;
        tracing::info!(session = %id, "session completed");
    }

    Ok(Json(response))
}

/// Move to the previous step
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/back",
    tag = "Sessions",
    params(
        ("id" = Uuid, Path, description = "Session id")
    ),
    responses(
        (status = 200, description = "Navigation applied", body = TransitionResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 409, description = "Wizard is busy or finished", body = ErrorResponse)
    )
)]
pub async fn back(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let session = find(&state, id).await?;
    let mut composer = session.lock().await;
    let current = composer.state().current_step.clone();
    let outcome = composer.go_back();

    Ok(Json(TransitionResponse {
        outcome: outcome_kind(outcome, &current)?,
        session: SessionResponse::from_composer(id, &composer),
    }))
}

/// Jump to a step; every step before it must be complete
#[utoipa::path(
    put,
    path = "/api/v1/sessions/{id}/current/{step_id}",
    tag = "Sessions",
    params(
        ("id" = Uuid, Path, description = "Session id"),
        ("step_id" = String, Path, description = "Target step")
    ),
    responses(
        (status = 200, description = "Navigation applied", body = TransitionResponse),
        (status = 404, description = "Session or step not found", body = ErrorResponse),
        (status = 409, description = "Earlier steps incomplete, or wizard busy", body = ErrorResponse)
    )
)]
pub async fn go_to(
    State(state): State<ApiState>,
    Path((id, step_id)): Path<(Uuid, String)>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let session = find(&state, id).await?;
    let mut composer = session.lock().await;
    let outcome = composer.go_to_step(&step_id);

    Ok(Json(TransitionResponse {
        outcome: outcome_kind(outcome, &step_id)?,
        session: SessionResponse::from_composer(id, &composer),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError as RemoteError, MockEntityApi};
    use crate::config::Config;
    use crate::rest::dto::SessionMode;
    use crate::wizard::Phase;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn state(dir: &TempDir, api: Arc<MockEntityApi>) -> ApiState {
        ApiState::with_drafts_dir(Config::default(), api, dir.path().to_path_buf())
    }

    async fn start(state: &ApiState, kind: &str, request: CreateSessionRequest) -> SessionResponse {
        let (status, Json(body)) = create(State(state.clone()), Path(kind.to_string()), Json(request))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        body
    }

    async fn submit(
        state: &ApiState,
        id: Uuid,
        step: &str,
        body: Value,
    ) -> Result<Json<TransitionResponse>, ApiError> {
        submit_step(State(state.clone()), Path((id, step.to_string())), Json(body)).await
    }

    #[tokio::test]
    async fn test_organization_flow_completes() {
        let dir = TempDir::new().unwrap();
        let api = Arc::new(MockEntityApi::new());
        let state = state(&dir, api.clone());

        let session = start(&state, "organization", CreateSessionRequest::default()).await;
        assert_eq!(session.current_step, "basics");
        assert_eq!(session.steps.len(), 3);
        assert!(session.steps[0].current);

        let resp = submit(
            &state,
            session.id,
            "basics",
            json!({"name": "Harbor Shelter", "description": "Animal rescue"}),
        )
        .await
        .unwrap();
        assert_eq!(resp.outcome, OutcomeKind::Advanced);
        assert_eq!(resp.session.current_step, "contact");
        assert_eq!(resp.session.draft_index, Some(0));

        submit(&state, session.id, "contact", json!({"email": "hi@harbor.org"}))
            .await
            .unwrap();
        let resp = submit(&state, session.id, "causes", json!({"causes": [{"id": "animals"}]}))
            .await
            .unwrap();

        assert_eq!(resp.outcome, OutcomeKind::Completed);
        assert_eq!(resp.session.phase, Phase::Submitted);
        assert_eq!(resp.session.entity.as_ref().unwrap()["id"], "organizations-1");
        assert_eq!(api.calls().len(), 1);
        // the draft is gone once submitted
        assert!(state
            .draft_store(crate::wizard::WizardKind::Organization)
            .list()
            .unwrap()
            .is_empty());

        // and so is the session
        assert_eq!(state.session_count().await, 0);
        assert!(matches!(
            get_one(State(state.clone()), Path(session.id)).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_session_is_kept_for_retry() {
        let dir = TempDir::new().unwrap();
        let api = Arc::new(MockEntityApi::new());
        api.push_response(Err(RemoteError::network("api", "connection reset")));
        let state = state(&dir, api);

        let session = start(&state, "organization", CreateSessionRequest::default()).await;
        submit(&state, session.id, "basics", json!({"name": "Harbor", "description": "d"}))
            .await
            .unwrap();
        submit(&state, session.id, "contact", json!({"email": "hi@harbor.org"}))
            .await
            .unwrap();
        let resp = submit(&state, session.id, "causes", json!({"causes": ["animals"]}))
            .await
            .unwrap();

        assert_eq!(resp.outcome, OutcomeKind::Failed);
        assert_eq!(state.session_count().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_sessions_get_distinct_drafts() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir, Arc::new(MockEntityApi::new()));

        let a = start(&state, "project", CreateSessionRequest::default()).await;
        let b = start(&state, "project", CreateSessionRequest::default()).await;

        let (ra, rb) = tokio::join!(
            submit(&state, a.id, "basics", json!({"title": "A", "organization": {"id": 1}})),
            submit(&state, b.id, "basics", json!({"title": "B", "organization": {"id": 2}})),
        );
        let ia = ra.unwrap().session.draft_index.unwrap();
        let ib = rb.unwrap().session.draft_index.unwrap();
        let mut indices = vec![ia, ib];
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1]);

        let store = state.draft_store(crate::wizard::WizardKind::Project);
        assert_eq!(store.list().unwrap().len(), 2);
        assert_eq!(store.get(ia).unwrap().unwrap().value["title"], "A");
        assert_eq!(store.get(ib).unwrap().unwrap().value["title"], "B");
    }

    #[tokio::test]
    async fn test_invalid_step_returns_field_errors() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir, Arc::new(MockEntityApi::new()));
        let session = start(&state, "organization", CreateSessionRequest::default()).await;

        let err = submit(&state, session.id, "basics", json!({"name": ""}))
            .await
            .unwrap_err();
        match err {
            ApiError::ValidationError { fields, .. } => {
                assert!(fields.contains_key("name"));
                assert!(fields.contains_key("description"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_go_to_incomplete_step_conflicts() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir, Arc::new(MockEntityApi::new()));
        let session = start(&state, "project", CreateSessionRequest::default()).await;

        let err = go_to(State(state.clone()), Path((session.id, "roles".to_string())))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        let err = go_to(State(state.clone()), Path((session.id, "nope".to_string())))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_back_from_first_step_is_unchanged() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir, Arc::new(MockEntityApi::new()));
        let session = start(&state, "project", CreateSessionRequest::default()).await;

        let resp = back(State(state.clone()), Path(session.id)).await.unwrap();
        assert_eq!(resp.outcome, OutcomeKind::Unchanged);
        assert_eq!(resp.session.current_step, "basics");
    }

    #[tokio::test]
    async fn test_server_errors_attach_to_steps() {
        let dir = TempDir::new().unwrap();
        let api = Arc::new(MockEntityApi::new());
        let mut errors = BTreeMap::new();
        errors.insert("email".to_string(), "is already registered".to_string());
        api.push_response(Err(RemoteError::field_errors("api", errors)));
        let state = state(&dir, api);

        let seed = from_json(json!({
            "name": "Harbor Shelter",
            "description": "Animal rescue",
            "email": "hi@harbor.org",
            "causes": [{"id": "animals"}]
        }));
        let session = start(
            &state,
            "organization",
            CreateSessionRequest {
                mode: SessionMode::Duplicate,
                value: seed,
                ..Default::default()
            },
        )
        .await;

        let resp = submit(&state, session.id, "causes", json!({})).await.unwrap();
        assert_eq!(resp.outcome, OutcomeKind::Failed);
        assert_eq!(resp.session.current_step, "causes");
        let contact = resp.session.steps.iter().find(|s| s.id == "contact").unwrap();
        assert_eq!(contact.server_errors.len(), 1);
        assert_eq!(contact.server_errors[0].message, "is already registered");
    }

    #[tokio::test]
    async fn test_resume_and_discard_session() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir, Arc::new(MockEntityApi::new()));

        let first = start(&state, "project", CreateSessionRequest::default()).await;
        submit(
            &state,
            first.id,
            "basics",
            json!({"title": "Reading buddies", "organization": {"id": 3}}),
        )
        .await
        .unwrap();

        let resumed = start(
            &state,
            "project",
            CreateSessionRequest {
                draft: Some(0),
                step: Some("description".to_string()),
                ..Default::default()
            },
        )
        .await;
        assert_eq!(resumed.current_step, "description");
        assert_eq!(resumed.value["title"], "Reading buddies");
        assert_eq!(resumed.location.draft_index, Some(0));

        let status = discard(State(state.clone()), Path(resumed.id)).await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(matches!(
            get_one(State(state.clone()), Path(resumed.id)).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(state
            .draft_store(crate::wizard::WizardKind::Project)
            .list()
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_resume_missing_draft_is_not_found() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir, Arc::new(MockEntityApi::new()));
        let result = create(
            State(state),
            Path("project".to_string()),
            Json(CreateSessionRequest {
                draft: Some(7),
                ..Default::default()
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_non_object_body_is_rejected() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir, Arc::new(MockEntityApi::new()));
        let session = start(&state, "project", CreateSessionRequest::default()).await;

        let err = submit(&state, session.id, "basics", json!(["title"])).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}

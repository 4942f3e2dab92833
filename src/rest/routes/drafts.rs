//! Draft listing and discard endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::wizards::parse_kind;
use crate::rest::dto::DraftResponse;
use crate::rest::error::{ApiError, ErrorResponse};
use crate::rest::state::ApiState;

/// List stored drafts of a wizard
#[utoipa::path(
    get,
    path = "/api/v1/wizards/{kind}/drafts",
    tag = "Drafts",
    params(
        ("kind" = String, Path, description = "Wizard kind")
    ),
    responses(
        (status = 200, description = "Live drafts in index order", body = Vec<DraftResponse>),
        (status = 404, description = "Wizard not found", body = ErrorResponse)
    )
)]
pub async fn list(
    State(state): State<ApiState>,
    Path(kind): Path<String>,
) -> Result<Json<Vec<DraftResponse>>, ApiError> {
    let kind = parse_kind(&kind)?;
    let drafts = state.draft_store(kind).entries()?;

    Ok(Json(
        drafts
            .into_iter()
            .map(|(index, draft)| DraftResponse::new(index, draft))
            .collect(),
    ))
}

/// Discard a stored draft. Other drafts keep their indices.
#[utoipa::path(
    delete,
    path = "/api/v1/wizards/{kind}/drafts/{index}",
    tag = "Drafts",
    params(
        ("kind" = String, Path, description = "Wizard kind"),
        ("index" = usize, Path, description = "Draft index")
    ),
    responses(
        (status = 204, description = "Draft discarded"),
        (status = 404, description = "Wizard not found", body = ErrorResponse)
    )
)]
pub async fn discard(
    State(state): State<ApiState>,
    Path((kind, index)): Path<(String, usize)>,
) -> Result<StatusCode, ApiError> {
    let kind = parse_kind(&kind)?;
    state.draft_store(kind).discard(index)?;
    tracing::info!(wizard = %kind, draft = index, "draft discarded");
    Ok(StatusCode::NO_CONTENT)
}

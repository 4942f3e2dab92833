//! Wizard definition endpoints.

use axum::{extract::Path, Json};

use crate::rest::dto::{StepResponse, WizardSummary};
use crate::rest::error::{ApiError, ErrorResponse};
use crate::wizard::step::LabelContext;
use crate::wizard::value::DraftValue;
use crate::wizard::{SubmitMode, WizardKind};

/// Resolve the `{kind}` path segment
pub(crate) fn parse_kind(kind: &str) -> Result<WizardKind, ApiError> {
    kind.parse()
        .map_err(|_| ApiError::NotFound(format!("Wizard '{}' not found", kind)))
}

/// List all wizards
#[utoipa::path(
    get,
    path = "/api/v1/wizards",
    tag = "Wizards",
    responses(
        (status = 200, description = "List of wizards", body = Vec<WizardSummary>)
    )
)]
pub async fn list() -> Json<Vec<WizardSummary>> {
    Json(
        WizardKind::all()
            .iter()
            .copied()
            .map(WizardSummary::from)
            .collect(),
    )
}

/// List the steps of a wizard in order
#[utoipa::path(
    get,
    path = "/api/v1/wizards/{kind}/steps",
    tag = "Wizards",
    params(
        ("kind" = String, Path, description = "Wizard kind (project, organization)")
    ),
    responses(
        (status = 200, description = "Ordered steps", body = Vec<StepResponse>),
        (status = 404, description = "Wizard not found", body = ErrorResponse)
    )
)]
pub async fn steps(Path(kind): Path<String>) -> Result<Json<Vec<StepResponse>>, ApiError> {
    let registry = parse_kind(&kind)?.registry();
    let empty = DraftValue::new();
    let ctx = LabelContext {
        mode: &SubmitMode::Create,
        value: &empty,
    };

    let steps = registry
        .steps()
        .iter()
        .map(|step| StepResponse::new(step, step.label.render(&ctx)))
        .collect();
    Ok(Json(steps))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_wizards() {
        let resp = list().await;
        assert_eq!(resp.len(), 2);
        assert_eq!(resp[0].kind, WizardKind::Project);
    }

    #[tokio::test]
    async fn test_project_steps() {
        let resp = steps(Path("project".to_string())).await.unwrap();
        let ids: Vec<_> = resp.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["basics", "description", "location", "roles"]);
        assert_eq!(resp[0].fields[0].name, "title");
        assert!(resp[0].fields[0].required);
    }

    #[tokio::test]
    async fn test_unknown_wizard() {
        let result = steps(Path("volunteer".to_string())).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }
}

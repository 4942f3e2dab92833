//! Final submission of a composed entity

use std::sync::Arc;

use serde_json::Value;

use super::error::ApiError;
use super::mapper::EntityShape;
use super::EntityApi;
use crate::entities;
use crate::error::{AttributedFieldError, SubmitFailure};
use crate::wizard::kind::{SubmitMode, WizardKind};
use crate::wizard::step::StepRegistry;
use crate::wizard::validity::FieldErrors;
use crate::wizard::value::DraftValue;

/// Performs the create/update call for one wizard kind
#[derive(Clone)]
pub struct SubmissionDispatcher {
    kind: WizardKind,
    shape: EntityShape,
    api: Arc<dyn EntityApi>,
}

impl SubmissionDispatcher {
    pub fn new(kind: WizardKind, api: Arc<dyn EntityApi>) -> Self {
        Self {
            kind,
            shape: entities::shape(kind),
            api,
        }
    }

    pub fn kind(&self) -> WizardKind {
        self.kind
    }

    /// Request body the API would receive for `value`
    pub fn prepare(&self, value: &DraftValue, mode: &SubmitMode) -> Value {
        self.shape.prepare(value, mode)
    }

    /// Send the aggregate value and return the entity the server stored.
    ///
    /// Field errors are attributed to the registry step whose form declares
    /// the field. Nothing is retried.
    pub async fn submit(
        &self,
        registry: &StepRegistry,
        value: &DraftValue,
        mode: &SubmitMode,
    ) -> Result<Value, SubmitFailure> {
        let body = self.prepare(value, mode);
        let collection = self.kind.collection();

        tracing::info!(wizard = %self.kind, ?mode, "submitting entity");
        let result = match mode {
            SubmitMode::Edit { id } => self.api.update(collection, id, body).await,
            SubmitMode::Create | SubmitMode::Duplicate => self.api.create(collection, body).await,
        };

        result.map_err(|err| {
            tracing::warn!(wizard = %self.kind, error = %err, "submission failed");
            self.to_failure(registry, err)
        })
    }

    fn to_failure(&self, registry: &StepRegistry, err: ApiError) -> SubmitFailure {
        match err {
            ApiError::FieldErrors { errors, .. } => SubmitFailure::ServerValidation {
                errors: self.attribute(registry, &errors),
            },
            other => SubmitFailure::network(other.to_string()),
        }
    }

    fn attribute(&self, registry: &StepRegistry, errors: &FieldErrors) -> Vec<AttributedFieldError> {
        errors
            .iter()
            .map(|(api_key, message)| {
                let field = self.shape.field_for_api_key(api_key);
                AttributedFieldError {
                    step_id: registry.step_for_field(field).map(|s| s.id.to_string()),
                    field: field.to_string(),
                    message: message.clone(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{MockEntityApi, RecordedCall};
    use crate::wizard::value::from_json;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn project_value() -> DraftValue {
        from_json(json!({
            "title": "Reading buddies",
            "organization": {"id": 3, "name": "Library"},
            "roles": [{"id": 8, "title": "Reader"}]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_posts_to_collection() {
        let api = Arc::new(MockEntityApi::new());
        api.push_response(Ok(json!({"id": "p1"})));
        let dispatcher = SubmissionDispatcher::new(WizardKind::Project, api.clone());
        let registry = WizardKind::Project.registry();

        let entity = dispatcher
            .submit(&registry, &project_value(), &SubmitMode::Create)
            .await
            .unwrap();

        assert_eq!(entity["id"], "p1");
        let calls = api.calls();
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            RecordedCall::Create { collection, body } => {
                assert_eq!(collection, "projects");
                assert_eq!(body["organization_id"], 3);
                assert!(body.get("organization").is_none());
            }
            other => panic!("expected create, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_edit_patches_resource() {
        let api = Arc::new(MockEntityApi::new());
        let dispatcher = SubmissionDispatcher::new(WizardKind::Project, api.clone());
        let registry = WizardKind::Project.registry();

        dispatcher
            .submit(&registry, &project_value(), &SubmitMode::Edit { id: "p9".into() })
            .await
            .unwrap();

        assert!(matches!(
            &api.calls()[0],
            RecordedCall::Update { collection, id, .. } if collection == "projects" && id == "p9"
        ));
    }

    #[tokio::test]
    async fn test_duplicate_strips_role_ids() {
        let api = Arc::new(MockEntityApi::new());
        let dispatcher = SubmissionDispatcher::new(WizardKind::Project, api.clone());
        let registry = WizardKind::Project.registry();

        dispatcher
            .submit(&registry, &project_value(), &SubmitMode::Duplicate)
            .await
            .unwrap();

        match &api.calls()[0] {
            RecordedCall::Create { body, .. } => {
                assert!(body["roles"][0].get("id").is_none());
                assert_eq!(body["roles"][0]["title"], "Reader");
            }
            other => panic!("expected create, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_field_errors_are_attributed_to_steps() {
        let api = Arc::new(MockEntityApi::new());
        let mut errors = BTreeMap::new();
        errors.insert("organization_id".to_string(), "is not a member".to_string());
        errors.insert("mystery".to_string(), "unknown".to_string());
        api.push_response(Err(ApiError::field_errors("api", errors)));
        let dispatcher = SubmissionDispatcher::new(WizardKind::Project, api);
        let registry = WizardKind::Project.registry();

        let failure = dispatcher
            .submit(&registry, &project_value(), &SubmitMode::Create)
            .await
            .unwrap_err();

        let SubmitFailure::ServerValidation { errors } = failure else {
            panic!("expected server validation failure");
        };
        assert_eq!(errors.len(), 2);
        let org = errors.iter().find(|e| e.field == "organization").unwrap();
        assert_eq!(org.step_id.as_deref(), Some("basics"));
        let mystery = errors.iter().find(|e| e.field == "mystery").unwrap();
        assert!(mystery.step_id.is_none());
    }

    #[tokio::test]
    async fn test_transport_errors_become_network_failures() {
        let api = Arc::new(MockEntityApi::new());
        api.push_response(Err(ApiError::http("api", 503, "unavailable")));
        let dispatcher = SubmissionDispatcher::new(WizardKind::Organization, api);
        let registry = WizardKind::Organization.registry();

        let failure = dispatcher
            .submit(&registry, &DraftValue::new(), &SubmitMode::Create)
            .await
            .unwrap_err();

        assert!(matches!(failure, SubmitFailure::Network { message } if message.contains("503")));
    }
}

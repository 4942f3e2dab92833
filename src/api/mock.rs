//! Scripted entity API for tests and offline runs

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use super::error::ApiError;
use super::EntityApi;

/// A call received by [`MockEntityApi`]
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Create {
        collection: String,
        body: Value,
    },
    Update {
        collection: String,
        id: String,
        body: Value,
    },
}

/// Returns queued responses in order; once the queue is empty, echoes the
/// request body with an `id` added.
#[derive(Debug, Default)]
pub struct MockEntityApi {
    responses: Mutex<VecDeque<Result<Value, ApiError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl MockEntityApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: Result<Value, ApiError>) {
        lock(&self.responses).push_back(response);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    fn respond(&self, call: RecordedCall, id: String) -> Result<Value, ApiError> {
        let body = match &call {
            RecordedCall::Create { body, .. } | RecordedCall::Update { body, .. } => body.clone(),
        };
        lock(&self.calls).push(call);

        if let Some(response) = lock(&self.responses).pop_front() {
            return response;
        }
        let mut echo = body;
        if let Value::Object(map) = &mut echo {
            map.insert("id".to_string(), Value::String(id));
        }
        Ok(echo)
    }
}

#[async_trait]
impl EntityApi for MockEntityApi {
    async fn create(&self, collection: &str, body: Value) -> Result<Value, ApiError> {
        let id = format!("{}-{}", collection, lock(&self.calls).len() + 1);
        self.respond(
            RecordedCall::Create {
                collection: collection.to_string(),
                body,
            },
            id,
        )
    }

    async fn update(&self, collection: &str, id: &str, body: Value) -> Result<Value, ApiError> {
        self.respond(
            RecordedCall::Update {
                collection: collection.to_string(),
                id: id.to_string(),
                body,
            },
            id.to_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_echoes_body_with_generated_id() {
        let api = MockEntityApi::new();
        let entity = api.create("projects", json!({"title": "t"})).await.unwrap();
        assert_eq!(entity, json!({"title": "t", "id": "projects-1"}));
    }

    #[tokio::test]
    async fn test_queued_responses_come_first() {
        let api = MockEntityApi::new();
        api.push_response(Err(ApiError::network("api", "down")));

        assert!(api.update("projects", "1", json!({})).await.is_err());
        assert!(api.update("projects", "1", json!({})).await.is_ok());
        assert_eq!(api.calls().len(), 2);
    }
}

//! Remote entity API and the submission dispatcher built on it
//!
//! This module provides:
//! - The `EntityApi` trait at the network seam
//! - A reqwest implementation talking to the platform's REST API
//! - The dispatcher that maps wizard values to API bodies and attributes
//!   server field errors back to steps

pub mod dispatcher;
pub mod error;
pub mod http;
pub mod mapper;
pub mod mock;
pub mod session;

pub use dispatcher::SubmissionDispatcher;
pub use error::ApiError;
pub use http::HttpEntityApi;
pub use mapper::EntityShape;
pub use mock::MockEntityApi;
pub use session::{EnvToken, StaticToken, TokenSource};

use async_trait::async_trait;
use serde_json::Value;

/// Create/update calls against an entity collection
#[async_trait]
pub trait EntityApi: Send + Sync {
    /// Create a record in `collection`, returning the stored entity
    async fn create(&self, collection: &str, body: Value) -> Result<Value, ApiError>;

    /// Partially update record `id` in `collection`
    async fn update(&self, collection: &str, id: &str, body: Value) -> Result<Value, ApiError>;
}

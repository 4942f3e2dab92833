//! REST implementation of the entity API

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;

use super::error::{parse_field_errors, ApiError};
use super::session::{EnvToken, TokenSource};
use super::EntityApi;
use crate::config::ApiConfig;

const PROVIDER_NAME: &str = "api";

/// Entity API over HTTP: `POST {base}/{collection}`, `PATCH {base}/{collection}/{id}`
pub struct HttpEntityApi {
    client: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl HttpEntityApi {
    pub fn new(
        base_url: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(ApiError::not_configured(PROVIDER_NAME));
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("composer/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::network(PROVIDER_NAME, e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    /// Build from configuration, reading the token from `api.token_env`
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::new(
            config.base_url.clone(),
            Arc::new(EnvToken::new(config.token_env.clone())),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("Accept", "application/json");
        match self.tokens.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, ApiError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| ApiError::network(PROVIDER_NAME, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::network(PROVIDER_NAME, e.to_string()))?;

        if status.is_success() {
            if body.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&body)
                .map_err(|e| ApiError::network(PROVIDER_NAME, format!("invalid response body: {e}")));
        }

        match status {
            StatusCode::UNAUTHORIZED => Err(ApiError::unauthorized(PROVIDER_NAME)),
            StatusCode::FORBIDDEN => Err(ApiError::forbidden(PROVIDER_NAME)),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                let parsed = serde_json::from_str::<Value>(&body)
                    .ok()
                    .and_then(|v| parse_field_errors(&v));
                match parsed {
                    Some(errors) => Err(ApiError::field_errors(PROVIDER_NAME, errors)),
                    None => Err(ApiError::http(PROVIDER_NAME, status.as_u16(), body)),
                }
            }
            _ => Err(ApiError::http(PROVIDER_NAME, status.as_u16(), body)),
        }
    }
}

#[async_trait]
impl EntityApi for HttpEntityApi {
    async fn create(&self, collection: &str, body: Value) -> Result<Value, ApiError> {
        let url = format!("{}/{}", self.base_url, collection);
        tracing::debug!(%url, "POST entity");
        self.send(self.client.post(&url).json(&body)).await
    }

    async fn update(&self, collection: &str, id: &str, body: Value) -> Result<Value, ApiError> {
        let url = format!("{}/{}/{}", self.base_url, collection, id);
        tracing::debug!(%url, "PATCH entity");
        self.send(self.client.patch(&url).json(&body)).await
    }
}

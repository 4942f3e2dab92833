//! Remote API error types

use serde_json::Value;
use thiserror::Error;

use crate::wizard::validity::FieldErrors;

/// Errors returned by the remote entity API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// 401 - session token missing, invalid or expired
    #[error("{provider}: Unauthorized (401)")]
    Unauthorized { provider: String },
    /// 403 - session lacks permission for this entity
    #[error("{provider}: Forbidden (403) - insufficient permissions")]
    Forbidden { provider: String },
    /// 400/422 with field-level messages
    #[error("{provider}: rejected {} field(s)", errors.len())]
    FieldErrors {
        provider: String,
        errors: FieldErrors,
    },
    /// Any other non-success status
    #[error("{provider}: HTTP {status} - {message}")]
    Http {
        provider: String,
        status: u16,
        message: String,
    },
    /// Transport failure: connection, timeout, undecodable body
    #[error("{provider}: Network error - {message}")]
    Network { provider: String, message: String },
    /// No base URL configured
    #[error("{provider}: Not configured")]
    NotConfigured { provider: String },
}

impl ApiError {
    pub fn unauthorized(provider: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            provider: provider.into(),
        }
    }

    pub fn forbidden(provider: impl Into<String>) -> Self {
        ApiError::Forbidden {
            provider: provider.into(),
        }
    }

    pub fn network(provider: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Network {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn http(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        ApiError::Http {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    pub fn field_errors(provider: impl Into<String>, errors: FieldErrors) -> Self {
        ApiError::FieldErrors {
            provider: provider.into(),
            errors,
        }
    }

    pub fn not_configured(provider: impl Into<String>) -> Self {
        ApiError::NotConfigured {
            provider: provider.into(),
        }
    }

    /// Check if this is an authentication error (401 or 403)
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            ApiError::Unauthorized { .. } | ApiError::Forbidden { .. }
        )
    }
}

/// Extract field errors from a rejection body.
///
/// Accepts `{"errors": {field: msg | [msg, ..]}}` or the same map at the top
/// level. Returns `None` when no field messages are found.
pub fn parse_field_errors(body: &Value) -> Option<FieldErrors> {
    let map = body
        .get("errors")
        .and_then(Value::as_object)
        .or_else(|| body.as_object())?;

    let errors: FieldErrors = map
        .iter()
        .filter_map(|(field, messages)| {
            let message = match messages {
                Value::String(s) => s.clone(),
                Value::Array(items) => {
                    let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
                    if parts.is_empty() {
                        return None;
                    }
                    parts.join("; ")
                }
                _ => return None,
            };
            Some((field.clone(), message))
        })
        .collect();

    if errors.is_empty() {
        None
    } else {
        Some(errors)
    }
}

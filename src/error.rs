//! Request-level error taxonomy.
//!
//! Every failure a handler can hit maps to one variant here. The
//! `IntoResponse` impl is the single place where errors become HTTP
//! responses, so handlers just return `Result<Response, RelayError>`.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::config::ENGINE_URL_KEYS;

#[derive(Debug, Error)]
pub enum RelayError {
    /// No engine base URL was resolved at startup.
    #[error("ENGINE_URL is not set")]
    ConfigMissing { seen_keys: Vec<(String, bool)> },

    #[error("Invalid JSON body: {0}")]
    InvalidJson(String),

    #[error("Topic is required")]
    EmptyTopic,

    #[error("Failed to reach engine {path}: {reason}")]
    UpstreamUnreachable { path: String, reason: String },

    #[error("Engine {path} did not respond within {}s", .limit.as_secs())]
    UpstreamTimeout { path: String, limit: Duration },

    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Not Found")]
    NotFound,
}

pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    /// Machine-readable code sent to the caller.
    pub fn code(&self) -> &'static str {
        match self {
            RelayError::ConfigMissing { .. } => "CONFIG_MISSING",
            RelayError::InvalidJson(_) => "INVALID_JSON",
            RelayError::EmptyTopic => "EMPTY_TOPIC",
            RelayError::UpstreamUnreachable { .. } => "ENGINE_UNREACHABLE",
            RelayError::UpstreamTimeout { .. } => "UPSTREAM_TIMEOUT",
            RelayError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            RelayError::NotFound => "NOT_FOUND",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::InvalidJson(_) | RelayError::EmptyTopic => StatusCode::BAD_REQUEST,
            RelayError::ConfigMissing { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::UpstreamUnreachable { .. } | RelayError::UpstreamTimeout { .. } => {
                StatusCode::BAD_GATEWAY
            }
            RelayError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            RelayError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    /// JSON body describing the failure.
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("code".into(), Value::from(self.code()));

        match self {
            RelayError::ConfigMissing { seen_keys } => {
                body.insert("error".into(), Value::from(self.to_string()));
                body.insert(
                    "hint".into(),
                    Value::from(format!(
                        "Set one of {} to the engine base URL (no trailing slash)",
                        ENGINE_URL_KEYS.join(", ")
                    )),
                );
                let seen: Map<String, Value> = seen_keys
                    .iter()
                    .map(|(key, set)| (key.clone(), Value::Bool(*set)))
                    .collect();
                body.insert("seenKeys".into(), Value::Object(seen));
            }
            RelayError::InvalidJson(detail) => {
                body.insert("error".into(), json!("Invalid JSON body"));
                body.insert("message".into(), Value::from(detail.as_str()));
            }
            RelayError::UpstreamUnreachable { path, reason } => {
                body.insert("error".into(), Value::from(format!("Failed to reach engine {path}")));
                body.insert("message".into(), Value::from(reason.as_str()));
            }
            RelayError::UpstreamTimeout { path, .. } => {
                body.insert("error".into(), Value::from(format!("Engine {path} timed out")));
                body.insert("message".into(), Value::from(self.to_string()));
            }
            _ => {
                body.insert("error".into(), Value::from(self.to_string()));
            }
        }

        Value::Object(body)
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Request failed");
        } else {
            tracing::warn!(code = self.code(), error = %self, "Request rejected");
        }
        crate::observability::metrics::record_failure(self.code());

        (status, Json(self.to_body())).into_response()
    }
}

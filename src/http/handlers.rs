//! Route handlers.
//!
//! Every handler follows the same path:
//! `Received → Normalizing → Relaying → Responding`. Failures at any step
//! become a `RelayError` and are rendered at the boundary.

use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, FailedToBufferBody},
        State,
    },
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
};

use crate::error::{RelayError, Result};
use crate::http::request::request_id;
use crate::http::response::passthrough;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::payload::normalize;

/// `POST /make` and `POST /execute`.
pub async fn execute_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Response {
    let start = Instant::now();
    let response = relay_execute(&state, &headers, body)
        .await
        .unwrap_or_else(|e| e.into_response());
    metrics::record_request("execute", response.status().as_u16(), start);
    response
}

async fn relay_execute(
    state: &AppState,
    headers: &HeaderMap,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Response> {
    let request_id = request_id(headers);

    if !state.upstream.is_configured() {
        return Err(RelayError::ConfigMissing {
            seen_keys: state.upstream.config().seen_keys.clone(),
        });
    }

    let bytes = match body {
        Ok(bytes) => bytes,
        Err(BytesRejection::FailedToBufferBody(FailedToBufferBody::LengthLimitError(_))) => {
            return Err(RelayError::PayloadTooLarge(state.config.limits.max_body_size));
        }
        Err(e) => {
            tracing::warn!(request_id = ?request_id, error = %e, "Failed to read request body");
            return Err(RelayError::InvalidJson(format!("failed to read body: {e}")));
        }
    };
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let payload = normalize(&bytes, content_type, &state.config.payload.default_mode)?;

    tracing::info!(
        request_id = ?request_id,
        mode = ?payload.mode(),
        prompt_chars = payload.prompt().chars().count(),
        "Relaying to engine"
    );

    let upstream = state.upstream.execute(&payload, request_id).await?;
    Ok(passthrough(upstream))
}

/// `GET /health`: mirror the engine's health endpoint.
pub async fn health_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let start = Instant::now();
    let response = match state.upstream.health(request_id(&headers)).await {
        Ok(upstream) => passthrough(upstream),
        Err(e) => e.into_response(),
    };
    metrics::record_request("health", response.status().as_u16(), start);
    response
}

/// Anything without a route.
pub async fn not_found() -> RelayError {
    RelayError::NotFound
}

//! Response pass-through.
//!
//! # Responsibilities
//! - Copy engine status and content-type to the caller
//! - Relay body bytes unmodified
//!
//! # Design Decisions
//! - The body is never re-serialized; it may not even be JSON
//! - Error responses are built by `RelayError`, not here

use axum::{
    body::Body,
    http::{header, HeaderValue},
    response::Response,
};

use crate::upstream::UpstreamResponse;

/// Build the caller-facing response from an engine reply.
pub fn passthrough(upstream: UpstreamResponse) -> Response {
    let content_type = upstream
        .content_type
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));

    let mut response = Response::new(Body::from(upstream.body));
    *response.status_mut() = upstream.status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, content_type);
    response
}

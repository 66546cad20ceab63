//! Request identification.
//!
//! # Responsibilities
//! - Expose the request ID to handlers so it can be forwarded to the engine
//!
//! # Design Decisions
//! - IDs are generated by tower-http's `MakeRequestUuid` in the server stack
//! - A caller-supplied `x-request-id` is kept, not replaced

use axum::http::{HeaderMap, HeaderName};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Read the request ID placed by the middleware.
pub fn request_id(headers: &HeaderMap) -> Option<&str> {
    headers.get(X_REQUEST_ID).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_reads_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_id(&headers), None);
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("abc-123"));
        assert_eq!(request_id(&headers), Some("abc-123"));
    }

    #[test]
    fn test_non_ascii_header_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, HeaderValue::from_bytes(b"\xffid").unwrap());
        assert_eq!(request_id(&headers), None);
    }
}

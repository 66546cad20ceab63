//! Upstream engine subsystem.
//!
//! # Data Flow
//! ```text
//! ForwardedPayload
//!     → client.rs (POST {base}/execute, x-request-id propagated)
//!     → resilience::timeouts (single deadline)
//!     → UpstreamResponse { status, content_type, body }
//! ```
//!
//! # Design Decisions
//! - The engine is opaque; responses are never parsed
//! - No retries, no circuit breaking: at-most-once delivery
//! - A missing base URL fails before any socket is opened

pub mod client;

pub use client::{UpstreamClient, UpstreamResponse};

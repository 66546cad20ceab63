//! Request payload subsystem.
//!
//! # Data Flow
//! ```text
//! raw body + content-type
//!     → parse_body (empty → {}, form → object, else JSON)
//!     → IncomingRequest (topic, country, merged extra)
//!     → ForwardedPayload { ...extra, prompt, mode }
//! ```
//!
//! # Design Decisions
//! - One normalization step isolates handlers from transport format
//! - Merge is a shallow override; nothing but the `extraJson` envelope is dropped
//! - Client errors are raised here so the relay is never invoked for them

pub mod normalize;

pub use normalize::{normalize, parse_body, ForwardedPayload, IncomingRequest, EXTRA_JSON_FIELD};

//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to engine:
//!     → timeouts.rs (enforce one deadline over the whole exchange)
//!     → On expiry: UPSTREAM_TIMEOUT, no retry
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Relayed POSTs are never retried (at-most-once delivery)

pub mod timeouts;

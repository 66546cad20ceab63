//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → handlers.rs (normalize, relay)
//!     → response.rs (pass-through)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;
pub mod ui;

pub use request::{request_id, X_REQUEST_ID};
pub use server::{AppState, HttpServer};

//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! .env (optional, dotenvy)
//!     → config file (TOML, optional)
//!     → loader.rs (parse, overlay environment and alias resolution)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → shared via Arc to all handlers
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Environment aliases are resolved here so handlers never read env vars

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigError, ENGINE_URL_KEYS};
pub use schema::{
    LimitsConfig, ListenerConfig, ObservabilityConfig, PayloadConfig, RelayConfig,
    UpstreamConfig,
};

//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0)
//! - Check the engine URL is an absolute http(s) URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - A missing engine URL is not an error here; requests fail with
//!   `CONFIG_MISSING` instead so the page and health probe stay reachable

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::RelayConfig;

/// A single semantic problem with the loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("upstream.base_url {url:?} is not a valid URL: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("upstream.base_url {0:?} must use http or https")]
    UnsupportedScheme(String),

    #[error("{field} must start with '/', got {value:?}")]
    RelativePath { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("observability.metrics_address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("environment variable {key} has invalid value {value:?}")]
    InvalidEnv { key: String, value: String },
}

/// Validate a fully assembled configuration.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Some(base) = config.upstream.base_url() {
        match Url::parse(base) {
            Ok(url) if url.scheme() != "http" && url.scheme() != "https" => {
                errors.push(ValidationError::UnsupportedScheme(base.to_string()));
            }
            Ok(_) => {}
            Err(e) => errors.push(ValidationError::InvalidBaseUrl {
                url: base.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    for (field, value) in [
        ("upstream.execute_path", &config.upstream.execute_path),
        ("upstream.health_path", &config.upstream.health_path),
    ] {
        if !value.starts_with('/') {
            errors.push(ValidationError::RelativePath {
                field,
                value: value.clone(),
            });
        }
    }

    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::Zero("upstream.timeout_secs"));
    }
    if config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::Zero("upstream.connect_timeout_secs"));
    }
    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::Zero("limits.max_body_size"));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

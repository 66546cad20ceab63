//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variables that may hold the engine base URL, highest
/// priority first.
pub const ENGINE_URL_KEYS: &[&str] = &["ENGINE_URL", "ENGINEURL", "FINISHFLOW_ENGINE_URL"];

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Outcome of looking up the engine URL across its candidate names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBaseUrl {
    pub value: Option<String>,
    pub seen_keys: Vec<(String, bool)>,
}

/// Resolve the engine base URL from an ordered list of candidate names.
///
/// The first value that is non-empty after trimming wins. Trailing slashes
/// are stripped so paths can be appended directly.
pub fn resolve_base_url<F>(keys: &[&str], lookup: F) -> ResolvedBaseUrl
where
    F: Fn(&str) -> Option<String>,
{
    let mut value = None;
    let mut seen_keys = Vec::with_capacity(keys.len());

    for key in keys {
        let raw = lookup(key);
        let trimmed = raw
            .as_deref()
            .map(|v| v.trim().trim_end_matches('/'))
            .filter(|v| !v.is_empty());

        seen_keys.push((key.to_string(), raw.as_deref().is_some_and(|v| !v.trim().is_empty())));

        if value.is_none() {
            value = trimmed.map(str::to_string);
        }
    }

    ResolvedBaseUrl { value, seen_keys }
}

/// Load configuration from a TOML file without validating it.
pub fn load_file(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: RelayConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Overlay environment variables onto `config`.
///
/// Returns the variables whose values could not be parsed.
pub fn apply_env<F>(config: &mut RelayConfig, lookup: F) -> Vec<ValidationError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut errors = Vec::new();

    let resolved = resolve_base_url(ENGINE_URL_KEYS, &lookup);
    if resolved.value.is_some() {
        config.upstream.base_url = resolved.value;
    } else if let Some(base) = config.upstream.base_url.take() {
        let base = base.trim().trim_end_matches('/').to_string();
        config.upstream.base_url = (!base.is_empty()).then_some(base);
    }
    config.upstream.seen_keys = resolved.seen_keys;

    if let Some(host) = non_empty(lookup("HOST")) {
        config.listener.host = host;
    }
    if let Some(port) = parse_env(&lookup, "PORT", &mut errors) {
        config.listener.port = port;
    }
    if let Some(secs) = parse_env(&lookup, "ENGINE_TIMEOUT_SECS", &mut errors) {
        config.upstream.timeout_secs = secs;
    }
    if let Some(addr) = non_empty(lookup("METRICS_ADDR")) {
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = addr;
    }

    errors
}

/// Build the effective configuration: defaults, then the optional file,
/// then the environment. Validation runs last over the merged result.
pub fn load<F>(path: Option<&Path>, lookup: F) -> Result<RelayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => load_file(path)?,
        None => RelayConfig::default(),
    };

    let mut errors = apply_env(&mut config, lookup);
    if let Err(more) = validate_config(&config) {
        errors.extend(more);
    }

    if errors.is_empty() {
        Ok(config)
    } else {
        Err(ConfigError::Validation(errors))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T, F>(lookup: &F, key: &str, errors: &mut Vec<ValidationError>) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let value = non_empty(lookup(key))?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            errors.push(ValidationError::InvalidEnv {
                key: key.to_string(),
                value,
            });
            None
        }
    }
}

//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// Engine endpoint and timeouts.
    pub upstream: UpstreamConfig,

    /// Payload shaping defaults.
    pub payload: PayloadConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Request limits.
    pub limits: LimitsConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind host (e.g., "0.0.0.0").
    pub host: String,

    /// Bind port.
    pub port: u16,
}

impl ListenerConfig {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 10000,
        }
    }
}

/// Upstream engine configuration.
///
/// Resolved once at startup and shared read-only afterwards. When
/// `base_url` is `None` every relay operation fails fast with a
/// configuration error instead of touching the network.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Engine base URL without trailing slash.
    pub base_url: Option<String>,

    /// Path that `/make` and `/execute` forward to.
    pub execute_path: String,

    /// Path that `/health` forwards to.
    pub health_path: String,

    /// Ceiling for one full upstream exchange, in seconds.
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Which candidate environment variables were set when the base URL
    /// was resolved. Reported back in configuration errors.
    #[serde(skip)]
    pub seen_keys: Vec<(String, bool)>,
}

impl UpstreamConfig {
    /// Whether an engine base URL is available.
    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            execute_path: "/execute".to_string(),
            health_path: "/health".to_string(),
            timeout_secs: 120,
            connect_timeout_secs: 10,
            seen_keys: Vec::new(),
        }
    }
}

/// Payload shaping configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PayloadConfig {
    /// Mode used when neither `mode` nor `country` is supplied.
    pub default_mode: String,
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            default_mode: "KR".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

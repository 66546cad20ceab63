//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Start the metrics exporter when enabled
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::RelayConfig;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Bring the relay up and serve until `shutdown` fires.
pub async fn launch(config: RelayConfig, shutdown: &Shutdown) -> Result<(), StartupError> {
    match config.upstream.base_url() {
        Some(url) => tracing::info!(
            engine = %url,
            timeout_secs = config.upstream.timeout_secs,
            "Engine configured"
        ),
        None => tracing::warn!(
            seen_keys = ?config.upstream.seen_keys,
            "Engine URL not set; proxied routes will answer CONFIG_MISSING"
        ),
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let addr = config.listener.bind_address();
    let server = HttpServer::new(config)?;
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(source) => return Err(StartupError::Bind { addr, source }),
    };

    server.run(listener, shutdown.subscribe()).await?;
    Ok(())
}

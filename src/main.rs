//! engine-relay
//!
//! Serves the web page and relays `/make` / `/execute` calls to the engine.
//!
//! ```text
//!     Browser                 ┌──────────────────────────────────────────┐
//!     ───────────────────────▶│  http::server (request id, trace)        │
//!                             │      → payload::normalize                │
//!                             │      → upstream::client (+ timeout)  ────┼──▶ Engine
//!     ◀───────────────────────│      ← http::response (pass-through) ◀───┼───
//!                             └──────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use engine_relay::config::loader;
use engine_relay::lifecycle::{self, signals, Shutdown};
use engine_relay::observability::logging;

#[derive(Parser)]
#[command(name = "engine-relay")]
#[command(about = "Web front-end that relays requests to the engine", long_about = None)]
struct Args {
    /// Optional TOML config file; environment variables override it.
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Listen port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is normal in hosted environments.
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let mut config = loader::load(args.config.as_deref(), |key| std::env::var(key).ok())?;
    if let Some(port) = args.port {
        config.listener.port = port;
    }

    logging::init(&config.observability.log_level);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address(),
        "engine-relay starting"
    );

    let shutdown = Shutdown::new();
    signals::forward_signals(shutdown.clone());

    lifecycle::launch(config, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use engine_relay::config::RelayConfig;
use engine_relay::http::HttpServer;
use engine_relay::lifecycle::Shutdown;
use serde_json::Value;
use tokio::net::TcpListener;

/// One request seen by the mock engine.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub path: String,
    pub body: Option<Value>,
    pub request_id: Option<String>,
}

/// Canned reply returned for every request.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
    pub delay: Duration,
}

impl Reply {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Clone)]
struct EngineState {
    reply: Reply,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

/// A mock engine bound to an ephemeral port.
#[derive(Clone)]
pub struct MockEngine {
    pub addr: SocketAddr,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

#[allow(dead_code)]
impl MockEngine {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

async fn engine_handler(
    State(state): State<EngineState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.calls.lock().unwrap().push(RecordedCall {
        path: uri.path().to_string(),
        body: serde_json::from_slice(&body).ok(),
        request_id: headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    if !state.reply.delay.is_zero() {
        tokio::time::sleep(state.reply.delay).await;
    }

    let status = StatusCode::from_u16(state.reply.status).unwrap();
    (
        status,
        [(header::CONTENT_TYPE, state.reply.content_type)],
        state.reply.body.clone(),
    )
        .into_response()
}

/// Start a mock engine that answers every path with `reply`.
pub async fn start_mock_engine(reply: Reply) -> MockEngine {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let calls = Arc::new(Mutex::new(Vec::new()));

    let app = Router::new().fallback(engine_handler).with_state(EngineState {
        reply,
        calls: calls.clone(),
    });
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockEngine { addr, calls }
}

/// Config pointing at `engine_url` with the given relay timeout.
#[allow(dead_code)]
pub fn relay_config(engine_url: Option<String>, timeout_secs: u64) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;
    config.upstream.base_url = engine_url;
    config.upstream.timeout_secs = timeout_secs;
    config
}

/// Start the relay on an ephemeral port. Trigger the returned handle to stop it.
pub async fn start_relay(config: RelayConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

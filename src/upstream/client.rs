//! HTTP client for the engine.
//!
//! # Responsibilities
//! - POST normalized payloads to `{base_url}{execute_path}`
//! - Probe `{base_url}{health_path}`
//! - Bound every exchange by the configured timeout
//! - Return the engine's status, content-type and body untouched

use axum::body::Bytes;
use axum::http::{header, HeaderValue, StatusCode};
use reqwest::{Client, RequestBuilder};

use crate::config::UpstreamConfig;
use crate::error::{RelayError, Result};
use crate::payload::ForwardedPayload;
use crate::resilience::timeouts::within;

/// Raw engine reply. Never parsed, only relayed.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

/// Client bound to one engine base URL.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    pub fn new(config: UpstreamConfig) -> std::result::Result<Self, reqwest::Error> {
        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout())
            .user_agent(concat!("engine-relay/", env!("CARGO_PKG_VERSION")));
        if config.base_url().is_some_and(is_loopback) {
            builder = builder.no_proxy();
        }
        let http = builder.build()?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    fn url(&self, path: &str) -> Result<String> {
        match self.config.base_url() {
            Some(base) => Ok(format!("{base}{path}")),
            None => Err(RelayError::ConfigMissing {
                seen_keys: self.config.seen_keys.clone(),
            }),
        }
    }

    /// Forward `payload` to the execute endpoint.
    pub async fn execute(
        &self,
        payload: &ForwardedPayload,
        request_id: Option<&str>,
    ) -> Result<UpstreamResponse> {
        self.relay(&self.config.execute_path, payload, request_id).await
    }

    /// POST `payload` as JSON to `path` on the engine.
    pub async fn relay(
        &self,
        path: &str,
        payload: &ForwardedPayload,
        request_id: Option<&str>,
    ) -> Result<UpstreamResponse> {
        let url = self.url(path)?;
        let request = self.http.post(&url).json(payload);
        self.send(path, request, request_id).await
    }

    /// GET the engine's health endpoint.
    pub async fn health(&self, request_id: Option<&str>) -> Result<UpstreamResponse> {
        let path = &self.config.health_path;
        let url = self.url(path)?;
        let request = self.http.get(&url);
        self.send(path, request, request_id).await
    }

    async fn send(
        &self,
        path: &str,
        mut request: RequestBuilder,
        request_id: Option<&str>,
    ) -> Result<UpstreamResponse> {
        if let Some(id) = request_id {
            request = request.header("x-request-id", id);
        }

        let limit = self.config.timeout();
        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>(UpstreamResponse {
                status,
                content_type,
                body,
            })
        };

        match within(limit, exchange).await {
            Ok(Ok(response)) => {
                tracing::debug!(
                    path = %path,
                    status = %response.status,
                    bytes = response.body.len(),
                    "Engine responded"
                );
                Ok(response)
            }
            Ok(Err(e)) if e.is_timeout() => Err(RelayError::UpstreamTimeout {
                path: path.to_string(),
                limit,
            }),
            Ok(Err(e)) => Err(RelayError::UpstreamUnreachable {
                path: path.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(RelayError::UpstreamTimeout {
                path: path.to_string(),
                limit,
            }),
        }
    }
}

/// An engine on the same host must never be reached through an HTTP proxy.
fn is_loopback(base_url: &str) -> bool {
    let Ok(url) = reqwest::Url::parse(base_url) else {
        return false;
    };
    match url.host() {
        Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
        Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    #[test]
    fn test_loopback_detection() {
        assert!(is_loopback("http://127.0.0.1:9000"));
        assert!(is_loopback("http://LOCALHOST"));
        assert!(is_loopback("http://[::1]:80"));
        assert!(!is_loopback("https://finishflow-live-1.onrender.com"));
        assert!(!is_loopback("not a url"));
    }

    #[tokio::test]
    async fn test_unconfigured_fails_without_network() {
        let client = UpstreamClient::new(UpstreamConfig {
            seen_keys: vec![("ENGINE_URL".into(), false)],
            ..UpstreamConfig::default()
        })
        .unwrap();

        let payload = crate::payload::IncomingRequest {
            topic: "t".into(),
            country: None,
            extra: Map::new(),
        }
        .into_payload("KR")
        .unwrap();

        let err = client.execute(&payload, None).await.unwrap_err();
        assert_eq!(err.code(), "CONFIG_MISSING");

        let err = client.health(None).await.unwrap_err();
        assert_eq!(err.code(), "CONFIG_MISSING");
    }

    #[tokio::test]
    async fn test_refused_connection_is_unreachable() {
        // Bind then drop to get a port with nothing listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = UpstreamClient::new(UpstreamConfig {
            base_url: Some(format!("http://{addr}")),
            ..UpstreamConfig::default()
        })
        .unwrap();

        let err = client.health(None).await.unwrap_err();
        assert_eq!(err.code(), "ENGINE_UNREACHABLE");
    }
}

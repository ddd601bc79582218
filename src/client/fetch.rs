//! `reqwest` based transport.
//!
//! # Examples
//!
//! ```ignore
//! use hypermedia_http::{ClientRuntime, ResourceContext, ReqwestTransport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runtime = ClientRuntime::new(ReqwestTransport::new());
//!     let context = ResourceContext::hal(runtime);
//!     let orders = context.get("http://example.com/orders", None)?.load(None).await?;
//!     println!("{:?}", orders.links());
//!     Ok(())
//! }
//! ```

use super::{config::ClientConfig, Transport};
use crate::error::{HypermediaError, Result};
use crate::types::{HttpRequest, HttpResponse};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Transport backed by a pooled `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    config: Arc<ClientConfig>,
}

impl ReqwestTransport {
    /// Create a transport with default configuration
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a transport with custom configuration
    pub fn with_config(config: ClientConfig) -> Self {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
            .pool_max_idle_per_host(config.max_idle_per_host)
            .user_agent(config.user_agent.clone());

        if !config.proxy_url.is_empty() {
            match reqwest::Proxy::all(&config.proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(e) => tracing::warn!("Ignoring invalid proxy '{}': {}", config.proxy_url, e),
            }
        }

        let client = builder.build().unwrap_or_else(|e| {
            tracing::warn!("Falling back to a default HTTP client: {}", e);
            reqwest::Client::default()
        });

        ReqwestTransport {
            client,
            config: Arc::new(config),
        }
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(client: reqwest::Client) -> Self {
        ReqwestTransport {
            client,
            config: Arc::new(ClientConfig::default()),
        }
    }

    /// Get the transport configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = url::Url::parse(&request.url)
            .map_err(|e| HypermediaError::Transport(format!("Invalid URL '{}': {}", request.url, e)))?;

        let mut req_builder = self.client.request(request.method.clone(), url);

        for (k, v) in &request.headers {
            req_builder = req_builder.header(k.as_str(), v.as_str());
        }

        if let Some(body) = request.body {
            req_builder = req_builder.body(body);
        }

        let response = req_builder
            .send()
            .await
            .map_err(|e| HypermediaError::Transport(e.to_string()))?;

        let status = response.status();

        let mut headers = BTreeMap::new();
        for (k, v) in response.headers() {
            if let Ok(val) = v.to_str() {
                headers
                    .entry(k.as_str().to_string())
                    .and_modify(|existing: &mut String| {
                        existing.push_str(", ");
                        existing.push_str(val);
                    })
                    .or_insert_with(|| val.to_string());
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| HypermediaError::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = request.method.clone();
        let url = request.url.clone();
        let result = self.send(request).await;

        if self.config.enable_logging {
            match &result {
                Ok(response) if !response.is_success() => {
                    tracing::warn!("{} {} failed: {} {}", method, url, response.status, response.status_text);
                }
                Err(e) => tracing::warn!("{} {} failed: {}", method, url, e),
                Ok(_) => {}
            }
        }

        result
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_creation() {
        let transport = ReqwestTransport::new();
        assert_eq!(transport.config().request_timeout_ms, 30_000);
        assert!(transport.config().enable_logging);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_unbuildable_config_warns() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let transport = tracing::subscriber::with_default(subscriber, || {
            ReqwestTransport::with_config(ClientConfig {
                user_agent: "bad\nagent".to_string(),
                ..Default::default()
            })
        });

        let output = String::from_utf8(logs.0.lock().clone()).unwrap();
        assert!(output.contains("Falling back to a default HTTP client"));
        assert_eq!(transport.config().user_agent, "bad\nagent");
    }

    #[tokio::test]
    async fn test_invalid_url_is_transport_error() {
        let transport = ReqwestTransport::new();
        let result = transport
            .execute(HttpRequest::new(http::Method::GET, "not a url"))
            .await;
        assert!(matches!(result, Err(HypermediaError::Transport(_))));
    }
}

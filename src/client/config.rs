//! Client configuration.

use serde::{Deserialize, Serialize};

/// Configuration of the [`ReqwestTransport`](super::ReqwestTransport).
///
/// ```
/// use hypermedia_http::client::ClientConfig;
///
/// let config: ClientConfig = serde_json::from_str(r#"{"proxy_url": "http://proxy:3128"}"#).unwrap();
/// assert_eq!(config.request_timeout_ms, 30_000);
/// assert_eq!(config.proxy_url, "http://proxy:3128");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,

    /// How long idle pooled connections are kept, in seconds
    pub pool_idle_timeout_secs: u64,

    /// Maximum idle connections per host
    pub max_idle_per_host: usize,

    /// Proxy for all requests; empty for none
    pub proxy_url: String,

    /// `User-Agent` header value
    pub user_agent: String,

    /// Log failed responses and transport errors
    pub enable_logging: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 30_000,
            pool_idle_timeout_secs: 90,
            max_idle_per_host: 32,
            proxy_url: String::new(),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            enable_logging: true,
        }
    }
}

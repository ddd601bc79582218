//! HTTP transport for hypermedia resources.
//!
//! The resource core never talks to the network directly. A
//! [`ResourceContext`](crate::ResourceContext) builds an
//! [`HttpRequest`](crate::types::HttpRequest) and hands it to a [`Transport`].
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── fetch  - ReqwestTransport, the production transport
//! ├── config - Client configuration
//! └── mock   - MockTransport for tests
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Transport`] | Executes request descriptors |
//! | [`ReqwestTransport`] | `reqwest` based transport |
//! | [`ClientConfig`] | Timeouts, proxy, pooling, logging |
//! | [`MockTransport`] | Canned responses and request recording |
//!
//! # Contract
//!
//! A transport returns `Ok(response)` for every response it receives,
//! whatever the status; the context classifies non-2xx statuses. `Err` is
//! reserved for requests that could not be sent or read.
//!
//! # Examples
//!
//! ```
//! use hypermedia_http::client::{ClientConfig, ReqwestTransport};
//!
//! let transport = ReqwestTransport::with_config(ClientConfig {
//!     request_timeout_ms: 5_000,
//!     ..Default::default()
//! });
//! assert_eq!(transport.config().request_timeout_ms, 5_000);
//! ```

mod config;
mod fetch;
pub mod mock;

pub use config::ClientConfig;
pub use fetch::ReqwestTransport;
pub use mock::MockTransport;

use crate::error::Result;
use crate::types::{HttpRequest, HttpResponse};
use async_trait::async_trait;

/// Executes request descriptors.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and return the response, whatever its status.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

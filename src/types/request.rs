//! Transport-agnostic request descriptor.
//!
//! Resource types build an [`HttpRequest`] for each verb; the context hands it
//! to the [`Transport`](crate::client::Transport).
//!
//! ```
//! use hypermedia_http::types::HttpRequest;
//! use http::Method;
//!
//! let request = HttpRequest::new(Method::GET, "http://example.com/orders")
//!     .with_header("Accept", "application/hal+json");
//! assert_eq!(request.header("accept"), Some("application/hal+json"));
//! assert!(request.body.is_none());
//! ```

use crate::error::Result;
use bytes::Bytes;
use http::Method;
use serde::Serialize;
use std::collections::BTreeMap;

/// How a response body should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseKind {
    /// Parse the body as JSON
    #[default]
    Json,
    /// Keep the raw bytes
    Binary,
}

/// A request to be executed by a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// HTTP method
    pub method: Method,
    /// Target URL
    pub url: String,
    /// Request headers
    pub headers: BTreeMap<String, String>,
    /// Request body
    pub body: Option<Bytes>,
    /// How the response body should be read
    pub response_kind: ResponseKind,
}

impl HttpRequest {
    /// Create a request without headers or body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
            response_kind: ResponseKind::Json,
        }
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add several headers.
    #[must_use]
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self.headers.insert(name.into(), value.into());
        }
        self
    }

    /// Set a raw body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body.
    pub fn with_json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        let body = serde_json::to_vec(value)?;
        Ok(self.with_body(body))
    }

    /// Set how the response body should be read.
    #[must_use]
    pub fn with_response_kind(mut self, kind: ResponseKind) -> Self {
        self.response_kind = kind;
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

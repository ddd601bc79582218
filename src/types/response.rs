//! Transport-agnostic response.
//!
//! # Examples
//!
//! ```
//! use hypermedia_http::types::HttpResponse;
//!
//! let response = HttpResponse::new(200, r#"{"name": "John"}"#)
//!     .with_header("Content-Type", "application/json");
//!
//! assert!(response.is_success());
//! assert_eq!(response.status_text, "OK");
//! assert_eq!(response.header("content-type"), Some("application/json"));
//! assert_eq!(response.json().unwrap()["name"], "John");
//! ```

use crate::error::Result;
use bytes::Bytes;
use serde_json::Value;
use std::collections::BTreeMap;

/// A response returned by a transport.
///
/// Header names are stored lowercase.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,

    /// Reason phrase; defaults to the canonical reason for `status`
    pub status_text: String,

    /// Response headers (lowercase names)
    pub headers: BTreeMap<String, String>,

    /// Response body
    pub body: Bytes,
}

impl HttpResponse {
    /// Create a response with status and body.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        let status_text = http::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or_default()
            .to_string();

        Self {
            status,
            status_text,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// Create an empty response with a status.
    pub fn empty(status: u16) -> Self {
        Self::new(status, Bytes::new())
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Override the reason phrase.
    #[must_use]
    pub fn with_status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = status_text.into();
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON; an empty body is `null`.
    pub fn json(&self) -> Result<Value> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&self.body)?)
    }
}

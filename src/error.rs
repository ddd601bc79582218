//! Error types for hypermedia resource handling.
//!
//! Errors fall into four groups:
//!
//! | Group | Variants | Raised by |
//! |-------|----------|-----------|
//! | Identity | [`NoResourceFactory`], [`SelfLinkMismatch`], [`AliasesDisabled`] | `ResourceContext::get`, `Resource::update` |
//! | Structural | [`MissingSelfLink`], [`InvalidPayload`] | HAL extraction |
//! | Unsupported | [`UnsupportedOperation`], [`UnknownCapability`] | resource types, profiles |
//! | Transport | [`Transport`], [`Response`] | HTTP verbs |
//!
//! Local invariant violations are returned immediately. Remote failures are
//! returned as [`HypermediaError::Response`] carrying a structured
//! [`ErrorPayload`] produced by the content-type keyed handler registry.
//!
//! [`NoResourceFactory`]: HypermediaError::NoResourceFactory
//! [`SelfLinkMismatch`]: HypermediaError::SelfLinkMismatch
//! [`AliasesDisabled`]: HypermediaError::AliasesDisabled
//! [`MissingSelfLink`]: HypermediaError::MissingSelfLink
//! [`InvalidPayload`]: HypermediaError::InvalidPayload
//! [`UnsupportedOperation`]: HypermediaError::UnsupportedOperation
//! [`UnknownCapability`]: HypermediaError::UnknownCapability
//! [`Transport`]: HypermediaError::Transport
//! [`Response`]: HypermediaError::Response

use crate::protocol::{self, media_types};
use crate::types::HttpResponse;
use crate::util::OneOrMany;
use bytes::Bytes;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HypermediaError>;

/// Errors produced by resources, contexts and transports.
#[derive(Debug, Error)]
pub enum HypermediaError {
    /// No factory was given and the context has no default factory.
    #[error("No resource factory: {0}")]
    NoResourceFactory(String),

    /// The `self` link of an update does not match the resource URI.
    #[error("Self link href differs: expected \"{expected}\", was \"{actual}\"")]
    SelfLinkMismatch {
        /// URI of the resource being updated
        expected: String,
        /// The href found in the `self` link
        actual: String,
    },

    /// A HAL payload has no `_links.self.href`.
    #[error("Self link href expected but not found")]
    MissingSelfLink,

    /// Aliases were requested on a context that does not allow them.
    #[error("Aliases are disabled for this context: {alias} -> {canonical}")]
    AliasesDisabled {
        /// The alias URI
        alias: String,
        /// The canonical URI the alias would resolve to
        canonical: String,
    },

    /// The resource type has no meaningful implementation for an operation.
    #[error("{resource_type} does not support the {operation} method")]
    UnsupportedOperation {
        /// Name of the resource type
        resource_type: &'static str,
        /// The HTTP method or operation
        operation: &'static str,
    },

    /// A payload had an unexpected shape.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// No active profile provides the named method.
    #[error("No capability '{name}' on {uri}")]
    UnknownCapability {
        /// Resource URI
        uri: String,
        /// Capability name
        name: String,
    },

    /// The resource outlived its context.
    #[error("Resource context dropped: {0}")]
    ContextDropped(String),

    /// A header value could not be parsed.
    #[error("Header parse error: {0}")]
    HeaderParse(String),

    /// A URI template could not be expanded.
    #[error("URI template error: {0}")]
    UriTemplate(String),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The request could not be sent or the response could not be read.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("{0}")]
    Response(Box<ResponseError>),
}

impl HypermediaError {
    /// The failed response, if this error came from the server.
    pub fn response(&self) -> Option<&ResponseError> {
        match self {
            HypermediaError::Response(response) => Some(response),
            _ => None,
        }
    }

    /// HTTP status of a failed response.
    pub fn status(&self) -> Option<u16> {
        self.response().map(|r| r.status)
    }
}

impl From<ResponseError> for HypermediaError {
    fn from(err: ResponseError) -> Self {
        HypermediaError::Response(Box::new(err))
    }
}

// ========== Structured error payloads ==========

/// Structured error produced by an error handler.
///
/// Nested `errors` carry the embedded errors of `vnd.error` style payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Human-readable message
    pub message: String,

    /// Nested errors
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorPayload>,
}

impl ErrorPayload {
    /// Create a payload with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    /// Parse a `vnd.error` document: `{message, _embedded: {errors: ...}}`.
    pub fn from_vnd_error(data: &Value) -> Self {
        let message = data
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let errors = data
            .get("_embedded")
            .and_then(|embedded| embedded.get("errors"))
            .map(|embeds| {
                OneOrMany::from_json(embeds.clone())
                    .into_vec()
                    .iter()
                    .map(ErrorPayload::from_vnd_error)
                    .collect()
            })
            .unwrap_or_default();

        Self { message, errors }
    }
}

/// A non-success HTTP response together with its structured error.
#[derive(Debug, Clone)]
pub struct ResponseError {
    /// HTTP status code
    pub status: u16,
    /// Reason phrase
    pub status_text: String,
    /// Response headers (lowercase names)
    pub headers: BTreeMap<String, String>,
    /// Raw response body
    pub body: Bytes,
    /// Error produced by the matching handler
    pub error: ErrorPayload,
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}: {}", self.status, self.error.message)
    }
}

// ========== Error handler registry ==========

/// Converts a failed response into a structured error.
pub type ErrorHandler = Arc<dyn Fn(&HttpResponse) -> ErrorPayload + Send + Sync>;

/// Content-type keyed registry of [`ErrorHandler`]s.
///
/// Lookup tries the exact `Content-Type` value first, then its essence
/// (`type/subtype` without parameters). When nothing matches, the error
/// message is the response status text.
#[derive(Clone)]
pub struct ErrorHandlerRegistry {
    handlers: Arc<RwLock<HashMap<String, ErrorHandler>>>,
}

impl ErrorHandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a registry with the `application/vnd.error+json` handler installed.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(media_types::VND_ERROR, |response: &HttpResponse| {
            match response.json() {
                Ok(data) => ErrorPayload::from_vnd_error(&data),
                Err(_) => ErrorPayload::new(response.status_text.clone()),
            }
        });
        registry
    }

    /// Register (or replace) the handler for a content type.
    pub fn register<F>(&self, content_type: impl Into<String>, handler: F)
    where
        F: Fn(&HttpResponse) -> ErrorPayload + Send + Sync + 'static,
    {
        self.handlers
            .write()
            .insert(content_type.into(), Arc::new(handler));
    }

    fn lookup(&self, content_type: &str) -> Option<ErrorHandler> {
        let handlers = self.handlers.read();
        if let Some(handler) = handlers.get(content_type) {
            return Some(handler.clone());
        }
        protocol::parse_media_type(content_type)
            .ok()
            .and_then(|media_type| handlers.get(&media_type.essence()).cloned())
    }

    /// Build the [`ResponseError`] for a failed response.
    pub fn handle(&self, response: &HttpResponse) -> ResponseError {
        let handler = response
            .header(http::header::CONTENT_TYPE.as_str())
            .and_then(|content_type| self.lookup(content_type));

        let error = match handler {
            Some(handler) => handler(response),
            None => ErrorPayload::new(response.status_text.clone()),
        };

        ResponseError {
            status: response.status,
            status_text: response.status_text.clone(),
            headers: response.headers.clone(),
            body: response.body.clone(),
            error,
        }
    }
}

impl Default for ErrorHandlerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for ErrorHandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self.handlers.read().keys().cloned().collect();
        keys.sort();
        f.debug_struct("ErrorHandlerRegistry")
            .field("content_types", &keys)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn failed(status: u16, status_text: &str, content_type: &str, body: &str) -> HttpResponse {
        HttpResponse::new(status, body.to_string())
            .with_status_text(status_text)
            .with_header("Content-Type", content_type)
    }

    #[test]
    fn test_default_message_is_status_text() {
        let registry = ErrorHandlerRegistry::new();
        let err = registry.handle(&failed(500, "Validation error", "application/problem+json", "{}"));
        assert_eq!(err.status, 500);
        assert_eq!(err.error.message, "Validation error");
    }

    #[test]
    fn test_handler_selected_by_content_type() {
        let registry = ErrorHandlerRegistry::new();
        registry.register("application/problem+json", |_: &HttpResponse| {
            ErrorPayload::new("problem")
        });
        registry.register("application/json", |_: &HttpResponse| ErrorPayload::new("json"));

        let err = registry.handle(&failed(400, "Bad Request", "application/problem+json", "{}"));
        assert_eq!(err.error.message, "problem");
    }

    #[test]
    fn test_handler_selected_by_essence() {
        let registry = ErrorHandlerRegistry::new();
        registry.register("application/problem+json", |_: &HttpResponse| {
            ErrorPayload::new("problem")
        });

        let err = registry.handle(&failed(
            400,
            "Bad Request",
            "application/problem+json; charset=utf-8",
            "{}",
        ));
        assert_eq!(err.error.message, "problem");
    }

    #[test]
    fn test_vnd_error_default_handler() {
        let registry = ErrorHandlerRegistry::with_defaults();
        let body = json!({
            "message": "Validatie fout",
            "_embedded": {
                "errors": [{"message": "name is required"}, {"message": "age too low"}]
            }
        });
        let err = registry.handle(&failed(
            500,
            "Internal Server Error",
            "application/vnd.error+json",
            &body.to_string(),
        ));
        assert_eq!(err.error.message, "Validatie fout");
        assert_eq!(err.error.errors.len(), 2);
        assert_eq!(err.error.errors[1].message, "age too low");
    }

    #[test]
    fn test_vnd_error_single_embedded() {
        let payload = ErrorPayload::from_vnd_error(&json!({
            "message": "outer",
            "_embedded": {"errors": {"message": "inner"}}
        }));
        assert_eq!(payload.errors, vec![ErrorPayload::new("inner")]);
    }

    #[test]
    fn test_self_link_mismatch_message() {
        let err = HypermediaError::SelfLinkMismatch {
            expected: "http://example.com".into(),
            actual: "http://example.com/other".into(),
        };
        assert_eq!(
            err.to_string(),
            "Self link href differs: expected \"http://example.com\", was \"http://example.com/other\""
        );
    }
}

//! Binary resources.
//!
//! A blob resource keeps its representation as two state properties: `data`
//! (the bytes, base64 encoded) and `type` (the media type of the bytes, if
//! known).

use super::{Resource, ResourceFactory, ResourceType};
use crate::error::{HypermediaError, Result};
use crate::protocol::media_types;
use crate::types::{HttpRequest, HttpResponse, ResponseKind};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use http::Method;
use serde_json::{json, Value};
use std::sync::Arc;

/// Resource holding raw bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlobResource;

impl BlobResource {
    /// A shared factory for blob resources.
    pub fn factory() -> ResourceFactory {
        Arc::new(BlobResource)
    }

    /// The bytes held by `resource`.
    pub fn bytes(resource: &Resource) -> Result<Option<Bytes>> {
        match resource.get_str("data") {
            Some(encoded) => STANDARD
                .decode(encoded)
                .map(|bytes| Some(Bytes::from(bytes)))
                .map_err(|e| HypermediaError::InvalidPayload(format!("blob data: {}", e))),
            None => Ok(None),
        }
    }

    /// Store bytes and their media type in `resource`.
    pub fn set_bytes(resource: &Resource, media_type: Option<&str>, bytes: &[u8]) {
        resource.set("data", STANDARD.encode(bytes));
        match media_type {
            Some(media_type) => resource.set("type", media_type),
            None => resource.remove("type"),
        };
    }

    /// The state of a blob resource for a binary response.
    pub(crate) fn payload(response: &HttpResponse) -> Value {
        let mut payload = json!({ "data": STANDARD.encode(&response.body) });
        if let Some(content_type) = response.header("content-type") {
            payload["type"] = Value::from(content_type);
        }
        payload
    }
}

impl ResourceType for BlobResource {
    fn name(&self) -> &'static str {
        "BlobResource"
    }

    fn get_request(&self, resource: &Resource) -> HttpRequest {
        HttpRequest::new(Method::GET, resource.uri())
            .with_header("Accept", media_types::ANY)
            .with_response_kind(ResponseKind::Binary)
    }

    fn put_request(&self, resource: &Resource) -> Result<HttpRequest> {
        let media_type = resource
            .get_str("type")
            .unwrap_or_else(|| media_types::OCTET_STREAM.to_string());
        let body = Self::bytes(resource)?.unwrap_or_default();

        Ok(HttpRequest::new(Method::PUT, resource.uri())
            .with_header("Content-Type", media_type)
            .with_body(body))
    }

    fn patch_request(&self, _resource: &Resource, _patch: &Value) -> Result<HttpRequest> {
        Err(HypermediaError::UnsupportedOperation {
            resource_type: self.name(),
            operation: "PATCH",
        })
    }
}

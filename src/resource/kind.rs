use super::{state_from_value, Resource};
use crate::error::Result;
use crate::protocol::media_types;
use crate::types::{HttpRequest, Links};
use bytes::Bytes;
use http::Method;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Shared handle to a resource type; passed wherever a resource may need to
/// be created.
pub type ResourceFactory = Arc<dyn ResourceType>;

/// Decides how a resource is requested and how responses update it.
///
/// Every method has a JSON default; implementors override what differs.
/// Resources created while updating a resource (embedded HAL resources, for
/// instance) share its type.
pub trait ResourceType: Send + Sync + 'static {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// GET request: `Accept: application/json`.
    fn get_request(&self, resource: &Resource) -> HttpRequest {
        HttpRequest::new(Method::GET, resource.uri()).with_header("Accept", media_types::JSON)
    }

    /// PUT request: the state as a JSON body.
    fn put_request(&self, resource: &Resource) -> Result<HttpRequest> {
        HttpRequest::new(Method::PUT, resource.uri())
            .with_header("Content-Type", media_types::JSON)
            .with_json(&resource.data())
    }

    /// PATCH request: `patch` as a JSON merge patch.
    fn patch_request(&self, resource: &Resource, patch: &Value) -> Result<HttpRequest> {
        HttpRequest::new(Method::PATCH, resource.uri())
            .with_header("Content-Type", media_types::MERGE_PATCH_JSON)
            .with_json(patch)
    }

    /// DELETE request without body.
    fn delete_request(&self, resource: &Resource) -> HttpRequest {
        HttpRequest::new(Method::DELETE, resource.uri())
    }

    /// POST request with caller-supplied body and headers.
    fn post_request(
        &self,
        resource: &Resource,
        body: Option<Bytes>,
        headers: BTreeMap<String, String>,
    ) -> HttpRequest {
        let mut request = HttpRequest::new(Method::POST, resource.uri()).with_headers(headers);
        request.body = body;
        request
    }

    /// Apply response data and links to `resource`.
    ///
    /// Returns the updated resources, `resource` first.
    fn update(&self, resource: &Resource, data: Value, links: Links) -> Result<Vec<Resource>> {
        let data = state_from_value(resource.uri(), data)?;
        resource.replace_state(data, links)?;
        Ok(vec![resource.clone()])
    }
}

/// Plain JSON resource.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainResource;

impl PlainResource {
    /// A shared factory for plain resources.
    pub fn factory() -> ResourceFactory {
        Arc::new(PlainResource)
    }
}

impl ResourceType for PlainResource {
    fn name(&self) -> &'static str {
        "Resource"
    }
}

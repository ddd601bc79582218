//! HAL resources.
//!
//! A HAL representation carries its links in `_links` and may embed related
//! resources in `_embedded`:
//!
//! ```json
//! {
//!   "_links": {"self": {"href": "http://example.com/orders/1"}},
//!   "_embedded": {
//!     "customer": {"_links": {"self": {"href": "http://example.com/customers/7"}}, "name": "John"}
//!   },
//!   "total": 30
//! }
//! ```
//!
//! Updating a HAL resource strips `_links` and `_embedded` from the state,
//! merges `_links` into the link table, adds a link for every embedded
//! resource that has none, and updates each embedded resource in the same
//! context. Embedded resources are created with the type of the resource being
//! updated.

use super::{Resource, ResourceFactory, ResourceType};
use crate::error::{HypermediaError, Result};
use crate::protocol::{media_types, rels};
use crate::types::{HttpRequest, Link, Links};
use crate::util::OneOrMany;
use http::Method;
use serde_json::{Map, Value};
use std::sync::Arc;

/// HAL (`application/hal+json`) resource.
#[derive(Debug, Clone, Copy, Default)]
pub struct HalResource;

impl HalResource {
    /// A shared factory for HAL resources.
    pub fn factory() -> ResourceFactory {
        Arc::new(HalResource)
    }
}

impl ResourceType for HalResource {
    fn name(&self) -> &'static str {
        "HalResource"
    }

    fn get_request(&self, resource: &Resource) -> HttpRequest {
        HttpRequest::new(Method::GET, resource.uri()).with_header("Accept", media_types::HAL_JSON)
    }

    fn update(&self, resource: &Resource, data: Value, links: Links) -> Result<Vec<Resource>> {
        extract_and_update(resource, data, links)
    }
}

/// Update `resource` and its embedded resources from a HAL representation.
///
/// Returns every updated resource in depth-first pre-order, `resource` first.
/// Custom resource types with HAL representations delegate their `update` to
/// this function.
///
/// The whole representation is walked before any state is replaced; on error
/// no resource is updated.
pub fn extract_and_update(resource: &Resource, data: Value, links: Links) -> Result<Vec<Resource>> {
    let mut extracted = Vec::new();
    extract(resource, Some(resource.clone()), data, links, &mut extracted)?;

    extracted
        .into_iter()
        .map(|(resource, data, links)| resource.replace_state(data, links))
        .collect()
}

/// An embedded resource with its flattened state and links.
type Extracted = (Resource, Map<String, Value>, Links);

fn extract(
    root: &Resource,
    target: Option<Resource>,
    data: Value,
    mut links: Links,
    extracted: &mut Vec<Extracted>,
) -> Result<()> {
    let Value::Object(mut data) = data else {
        return Err(HypermediaError::MissingSelfLink);
    };
    let href = self_href(&data).ok_or(HypermediaError::MissingSelfLink)?;

    if let Some(raw) = data.shift_remove("_links") {
        let hal_links: Links = serde_json::from_value(raw)?;
        links.extend(hal_links);
    }

    let resource = match target {
        Some(resource) => {
            resource.check_self_href(&href)?;
            resource
        }
        None => root.context()?.get(&href, Some(root.resource_type()))?,
    };
    let index = extracted.len();
    extracted.push((resource, Map::new(), Links::new()));

    if let Some(embedded) = data.shift_remove("_embedded") {
        let Value::Object(embedded) = embedded else {
            return Err(HypermediaError::InvalidPayload(format!(
                "_embedded of {} is not an object",
                href
            )));
        };

        for (rel, embeds) in embedded {
            let embeds = OneOrMany::from_json(embeds);
            if !links.contains_key(&rel) {
                let synthesized = embeds.map_ref(|embed| {
                    embed
                        .as_object()
                        .and_then(self_href)
                        .map(Link::new)
                        .ok_or(HypermediaError::MissingSelfLink)
                });
                links.insert(rel, synthesized.try_map(|link| link)?);
            }

            for embed in embeds {
                extract(root, None, embed, Links::new(), extracted)?;
            }
        }
    }

    extracted[index].1 = data;
    extracted[index].2 = links;
    Ok(())
}

fn self_href(data: &Map<String, Value>) -> Option<String> {
    let link = data.get("_links")?.get(rels::SELF)?;
    let link = match link {
        Value::Array(links) => links.first()?,
        other => other,
    };
    link.get("href")?.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_self_href() {
        let data = json!({"_links": {"self": {"href": "http://example.com"}}});
        assert_eq!(
            self_href(data.as_object().unwrap()).as_deref(),
            Some("http://example.com")
        );
    }

    #[test]
    fn test_self_href_from_array() {
        let data = json!({"_links": {"self": [{"href": "http://example.com/a"}, {"href": "http://example.com/b"}]}});
        assert_eq!(
            self_href(data.as_object().unwrap()).as_deref(),
            Some("http://example.com/a")
        );
    }

    #[test]
    fn test_self_href_missing() {
        assert!(self_href(json!({"_links": {}}).as_object().unwrap()).is_none());
        assert!(self_href(json!({"name": "John"}).as_object().unwrap()).is_none());
    }

    #[test]
    fn test_type_name() {
        assert_eq!(HalResource.name(), "HalResource");
    }
}

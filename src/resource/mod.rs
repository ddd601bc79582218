//! Hypermedia resources.
//!
//! A [`Resource`] is a shared handle to the client-side view of one remote
//! resource: its URI, link table, state properties, synchronization time and
//! profile. Resources are created by a [`ResourceContext`], which guarantees at
//! most one instance per URI; cloning a `Resource` clones the handle, not the
//! state.
//!
//! How a resource is requested and how a response updates it is decided by its
//! [`ResourceType`]:
//!
//! | Type | `Accept` | Update |
//! |------|----------|--------|
//! | [`PlainResource`] | `application/json` | replace state |
//! | [`HalResource`] | `application/hal+json` | extract `_links` and `_embedded` |
//! | [`BlobResource`] | `*/*` | keep the raw bytes |
//!
//! # Examples
//!
//! ```ignore
//! let context = ResourceContext::hal(runtime);
//! let order = context.get("http://example.com/orders/1", None)?;
//! order.load(None).await?;
//!
//! let customer = order.resolve_link_relation("customer", None, None)?;
//! let items = order.resolve_link_relation("item", Some(&json!({"page": 2})), None)?;
//! ```

mod blob;
mod hal;
mod kind;

pub use blob::BlobResource;
pub use hal::{extract_and_update, HalResource};
pub use kind::{PlainResource, ResourceFactory, ResourceType};

use crate::context::{ContextInner, ResourceContext};
use crate::error::{HypermediaError, Result};
use crate::merge::merge_patch_map;
use crate::profile::{Capabilities, Capability};
use crate::protocol::{expand_uri_template, rels};
use crate::runtime::ClientRuntime;
use crate::types::{HttpRequest, HttpResponse, Link, Links};
use crate::util::OneOrMany;
use bytes::Bytes;
use futures::future::{join_all, BoxFuture, FutureExt};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::SystemTime;

/// Mutable part of a resource.
#[derive(Default)]
struct ResourceState {
    data: Map<String, Value>,
    links: Links,
    sync_time: Option<SystemTime>,
    profile: Option<OneOrMany<String>>,
    capabilities: Vec<Arc<Capabilities>>,
}

struct ResourceInner {
    uri: String,
    resource_type: ResourceFactory,
    context: Weak<ContextInner>,
    runtime: Arc<ClientRuntime>,
    state: RwLock<ResourceState>,
}

/// Shared handle to a hypermedia resource.
#[derive(Clone)]
pub struct Resource {
    inner: Arc<ResourceInner>,
}

impl Resource {
    pub(crate) fn new(
        uri: String,
        resource_type: ResourceFactory,
        context: Weak<ContextInner>,
        runtime: Arc<ClientRuntime>,
    ) -> Self {
        Self {
            inner: Arc::new(ResourceInner {
                uri,
                resource_type,
                context,
                runtime,
                state: RwLock::new(ResourceState::default()),
            }),
        }
    }

    // ========== Identity ==========

    /// The resource URI.
    pub fn uri(&self) -> &str {
        &self.inner.uri
    }

    /// The type that created this resource.
    pub fn resource_type(&self) -> &ResourceFactory {
        &self.inner.resource_type
    }

    /// The context this resource belongs to.
    pub fn context(&self) -> Result<ResourceContext> {
        self.inner
            .context
            .upgrade()
            .map(ResourceContext::from_inner)
            .ok_or_else(|| HypermediaError::ContextDropped(self.inner.uri.clone()))
    }

    /// True if both handles refer to the same instance.
    pub fn ptr_eq(&self, other: &Resource) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ========== State ==========

    /// A copy of the state properties.
    pub fn data(&self) -> Map<String, Value> {
        self.inner.state.read().data.clone()
    }

    /// A state property.
    pub fn value(&self, name: &str) -> Option<Value> {
        self.inner.state.read().data.get(name).cloned()
    }

    /// A string state property.
    pub fn get_str(&self, name: &str) -> Option<String> {
        self.inner
            .state
            .read()
            .data
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Set a state property, returning the previous value.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.inner
            .state
            .write()
            .data
            .insert(name.into(), value.into())
    }

    /// Remove a state property.
    pub fn remove(&self, name: &str) -> Option<Value> {
        self.inner.state.write().data.shift_remove(name)
    }

    /// A copy of the link table.
    pub fn links(&self) -> Links {
        self.inner.state.read().links.clone()
    }

    /// The links of one relation.
    pub fn link(&self, rel: &str) -> Option<OneOrMany<Link>> {
        self.inner.state.read().links.get(rel).cloned()
    }

    /// Set the links of one relation.
    pub fn set_link(&self, rel: impl Into<String>, links: impl Into<OneOrMany<Link>>) {
        self.inner
            .state
            .write()
            .links
            .insert(rel.into(), links.into());
    }

    /// When the resource was last synchronized with the server.
    pub fn sync_time(&self) -> Option<SystemTime> {
        self.inner.state.read().sync_time
    }

    /// True once a GET or PUT has succeeded and no DELETE has since.
    pub fn is_synced(&self) -> bool {
        self.sync_time().is_some()
    }

    pub(crate) fn set_sync_time(&self, time: Option<SystemTime>) {
        self.inner.state.write().sync_time = time;
    }

    // ========== Profiles ==========

    /// The profile URI(s) of the resource.
    pub fn profile(&self) -> Option<OneOrMany<String>> {
        self.inner.state.read().profile.clone()
    }

    /// Change the profile.
    ///
    /// The capabilities of the previous profile are removed and those
    /// registered for the new profile(s) installed. Unregistered profiles
    /// contribute nothing.
    pub fn set_profile(&self, profile: Option<OneOrMany<String>>) {
        let capabilities = profile
            .as_ref()
            .map(|p| self.inner.runtime.profiles().resolve(p))
            .unwrap_or_default();

        let mut state = self.inner.state.write();
        state.profile = profile;
        state.capabilities = capabilities;
    }

    /// A state property, or else a value or accessor capability of an active
    /// profile.
    pub fn property(&self, name: &str) -> Option<Value> {
        let capability = {
            let state = self.inner.state.read();
            if let Some(value) = state.data.get(name) {
                return Some(value.clone());
            }
            find_capability(&state.capabilities, name)
        };

        match capability? {
            Capability::Value(value) => Some(value),
            Capability::Accessor(accessor) => Some(accessor(self)),
            Capability::Method(_) => None,
        }
    }

    /// True if an active profile provides `name`.
    pub fn has_capability(&self, name: &str) -> bool {
        find_capability(&self.inner.state.read().capabilities, name).is_some()
    }

    /// Call a method capability of an active profile.
    pub fn invoke(&self, name: &str, args: &[Value]) -> Result<Value> {
        let capability = find_capability(&self.inner.state.read().capabilities, name);
        match capability {
            Some(Capability::Method(method)) => method(self, args),
            _ => Err(HypermediaError::UnknownCapability {
                uri: self.inner.uri.clone(),
                name: name.to_string(),
            }),
        }
    }

    // ========== Link Resolution ==========

    /// Read an href (or array of hrefs) from a property.
    ///
    /// With `vars`, each href is expanded as a URI Template. Returns `None`
    /// when the property is absent or holds neither a string nor an array.
    pub fn resolve_property_href(
        &self,
        name: &str,
        vars: Option<&Value>,
    ) -> Result<Option<OneOrMany<String>>> {
        let Some(hrefs) = self
            .property(name)
            .and_then(|value| OneOrMany::hrefs_from_json(&value))
        else {
            return Ok(None);
        };

        match vars {
            Some(vars) => hrefs
                .try_map(|href| expand_uri_template(&href, vars))
                .map(Some),
            None => Ok(Some(hrefs)),
        }
    }

    /// Follow the href(s) of a property to resources of this context.
    pub fn resolve_property_relation(
        &self,
        name: &str,
        vars: Option<&Value>,
        factory: Option<&ResourceFactory>,
    ) -> Result<Option<OneOrMany<Resource>>> {
        match self.resolve_property_href(name, vars)? {
            Some(hrefs) => self.related(hrefs, factory).map(Some),
            None => Ok(None),
        }
    }

    /// The href(s) of a link relation.
    ///
    /// With `vars`, each href is expanded as a URI Template. Suspicious use of
    /// the relation is logged, see [`link_warnings`].
    pub fn resolve_link_href(
        &self,
        rel: &str,
        vars: Option<&Value>,
    ) -> Result<Option<OneOrMany<String>>> {
        let Some(links) = self.link(rel) else {
            return Ok(None);
        };

        for warning in link_warnings(rel, &links, vars.is_some()) {
            tracing::warn!("{}", warning);
        }

        match vars {
            Some(vars) => links
                .try_map(|link| expand_uri_template(&link.href, vars))
                .map(Some),
            None => Ok(Some(links.map(|link| link.href))),
        }
    }

    /// Follow a link relation to resources of this context.
    pub fn resolve_link_relation(
        &self,
        rel: &str,
        vars: Option<&Value>,
        factory: Option<&ResourceFactory>,
    ) -> Result<Option<OneOrMany<Resource>>> {
        match self.resolve_link_href(rel, vars)? {
            Some(hrefs) => self.related(hrefs, factory).map(Some),
            None => Ok(None),
        }
    }

    fn related(
        &self,
        hrefs: OneOrMany<String>,
        factory: Option<&ResourceFactory>,
    ) -> Result<OneOrMany<Resource>> {
        let context = self.context()?;
        hrefs.try_map(|href| context.get(&href, factory))
    }

    // ========== Loading ==========

    /// Ensure the resource is synchronized.
    ///
    /// Resolves immediately when the resource is synced (and, with
    /// `stale_before`, was synced at or after that time); otherwise performs a
    /// GET.
    pub async fn load(&self, stale_before: Option<SystemTime>) -> Result<Resource> {
        let fresh = match (self.sync_time(), stale_before) {
            (Some(synced), Some(stale_before)) => synced >= stale_before,
            (Some(_), None) => true,
            (None, _) => false,
        };

        if fresh {
            Ok(self.clone())
        } else {
            self.context()?.http_get(self).await
        }
    }

    /// Load this resource and the resources reachable along `paths`.
    ///
    /// `paths` is a nested object whose keys are property names or link
    /// relations, e.g. `{"customer": {"address": {}}, "item": {}}`. Keys that
    /// resolve to nothing are logged and skipped. All branches settle before
    /// this returns; the first branch error is returned.
    pub async fn load_paths(&self, paths: &Value, stale_before: Option<SystemTime>) -> Result<Resource> {
        self.load_paths_from(paths.clone(), stale_before, self.uri().to_string(), String::new())
            .await
    }

    fn load_paths_from(
        &self,
        paths: Value,
        stale_before: Option<SystemTime>,
        root: String,
        prefix: String,
    ) -> BoxFuture<'static, Result<Resource>> {
        let this = self.clone();
        async move {
            this.load(stale_before).await?;

            let Value::Object(paths) = paths else {
                return Ok(this);
            };

            let context = this.context()?;
            let factory = context
                .default_factory()
                .unwrap_or_else(|| this.resource_type().clone());

            let mut branches = Vec::new();
            for (key, sub_paths) in paths {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };

                let hrefs = match this.resolve_property_href(&key, None)? {
                    Some(hrefs) => Some(hrefs),
                    None => this.resolve_link_href(&key, None)?,
                };
                let Some(hrefs) = hrefs else {
                    tracing::warn!("Could not resolve path '{}' from {}", path, root);
                    continue;
                };

                for href in hrefs {
                    let related = context.get(&href, Some(&factory))?;
                    branches.push(related.load_paths_from(
                        sub_paths.clone(),
                        stale_before,
                        root.clone(),
                        path.clone(),
                    ));
                }
            }

            join_all(branches)
                .await
                .into_iter()
                .collect::<Result<Vec<_>>>()?;
            Ok(this)
        }
        .boxed()
    }

    // ========== HTTP Verbs ==========

    /// GET the resource and update it from the response.
    pub async fn get(&self) -> Result<Resource> {
        self.context()?.http_get(self).await
    }

    /// PUT the state of the resource.
    pub async fn put(&self) -> Result<Resource> {
        self.context()?.http_put(self).await
    }

    /// PATCH the resource with a JSON merge patch and apply it locally.
    pub async fn patch(&self, patch: Value) -> Result<Resource> {
        self.context()?.http_patch(self, patch).await
    }

    /// DELETE the resource.
    pub async fn delete(&self) -> Result<Resource> {
        self.context()?.http_delete(self).await
    }

    /// POST to the resource.
    pub async fn post(
        &self,
        body: Option<Bytes>,
        headers: BTreeMap<String, String>,
    ) -> Result<HttpResponse> {
        self.context()?.http_post(self, body, headers).await
    }

    /// POST to the resource, letting `configure` adjust the request.
    pub async fn post_with<F>(
        &self,
        body: Option<Bytes>,
        headers: BTreeMap<String, String>,
        configure: F,
    ) -> Result<HttpResponse>
    where
        F: FnOnce(HttpRequest) -> HttpRequest + Send,
    {
        self.context()?
            .http_post_with(self, body, headers, configure)
            .await
    }

    // ========== Request Builders ==========

    /// The GET request for this resource.
    pub fn get_request(&self) -> HttpRequest {
        self.inner.resource_type.get_request(self)
    }

    /// The PUT request for this resource.
    pub fn put_request(&self) -> Result<HttpRequest> {
        self.inner.resource_type.put_request(self)
    }

    /// The PATCH request for this resource.
    pub fn patch_request(&self, patch: &Value) -> Result<HttpRequest> {
        self.inner.resource_type.patch_request(self, patch)
    }

    /// The DELETE request for this resource.
    pub fn delete_request(&self) -> HttpRequest {
        self.inner.resource_type.delete_request(self)
    }

    /// The POST request for this resource.
    pub fn post_request(&self, body: Option<Bytes>, headers: BTreeMap<String, String>) -> HttpRequest {
        self.inner.resource_type.post_request(self, body, headers)
    }

    // ========== Updates ==========

    /// Update the resource from response data and links.
    ///
    /// Returns every resource that was updated, this one first.
    pub fn update(&self, data: Value, links: Links) -> Result<Vec<Resource>> {
        let resource_type = Arc::clone(&self.inner.resource_type);
        resource_type.update(self, data, links)
    }

    /// Replace state and links.
    ///
    /// The `self` link, when present, must match the URI; a mismatch is an
    /// error unless the context enables aliases, in which case the `self` href
    /// becomes an alias of this resource. The link table always contains a
    /// `self` link. A `profile` link sets the profile.
    pub fn replace_state(&self, data: Map<String, Value>, links: Links) -> Result<Resource> {
        let self_href = links
            .get(rels::SELF)
            .and_then(OneOrMany::first)
            .map(|link| link.href.clone());

        if let Some(href) = self_href.filter(|href| href != self.uri()) {
            self.check_self_href(&href)?;
            if let Some(context) = self.inner.context.upgrade().map(ResourceContext::from_inner) {
                context.add_alias(&href, self.uri())?;
            }
        }

        let mut table = Links::new();
        table.insert(rels::SELF.to_string(), OneOrMany::One(Link::new(self.uri())));
        table.extend(links);

        let profile = table
            .get(rels::PROFILE)
            .map(|links| links.map_ref(|link| link.href.clone()));

        {
            let mut state = self.inner.state.write();
            state.data = data;
            state.links = table;
        }

        if profile.is_some() {
            self.set_profile(profile);
        }

        Ok(self.clone())
    }

    /// Fail with `SelfLinkMismatch` when `href` is not this resource's URI
    /// and the context does not accept it as an alias.
    pub(crate) fn check_self_href(&self, href: &str) -> Result<()> {
        if href == self.uri() {
            return Ok(());
        }
        let context = self.inner.context.upgrade().map(ResourceContext::from_inner);
        match context {
            Some(context) if context.aliases_enabled() => Ok(()),
            _ => Err(HypermediaError::SelfLinkMismatch {
                expected: self.uri().to_string(),
                actual: href.to_string(),
            }),
        }
    }

    /// Apply a JSON merge patch to the state.
    pub fn merge(&self, patch: &Value) -> Result<Resource> {
        let Value::Object(patch) = patch else {
            return Err(HypermediaError::InvalidPayload(format!(
                "merge patch for {} must be an object",
                self.uri()
            )));
        };

        merge_patch_map(&mut self.inner.state.write().data, patch);
        Ok(self.clone())
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Resource {}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("Resource")
            .field("uri", &self.inner.uri)
            .field("type", &self.inner.resource_type.name())
            .field("sync_time", &state.sync_time)
            .field("profile", &state.profile)
            .field("data", &state.data)
            .finish()
    }
}

fn find_capability(capabilities: &[Arc<Capabilities>], name: &str) -> Option<Capability> {
    capabilities
        .iter()
        .rev()
        .find_map(|caps| caps.get(name).cloned())
}

/// Diagnostics for following the links of `rel`.
///
/// Warns about templated links followed without variables, non-templated
/// links followed with variables, and deprecated links (each deprecation URI
/// listed once).
pub fn link_warnings(rel: &str, links: &OneOrMany<Link>, with_vars: bool) -> Vec<String> {
    let mut warnings = Vec::new();

    if !with_vars && links.iter().any(Link::is_templated) {
        warnings.push(format!(
            "Following templated link relation '{}' without variables",
            rel
        ));
    }
    if with_vars && links.iter().any(|link| !link.is_templated()) {
        warnings.push(format!(
            "Following non-templated link relation '{}' with variables",
            rel
        ));
    }

    let mut deprecations: Vec<&str> = Vec::new();
    for uri in links.iter().filter_map(|link| link.deprecation.as_deref()) {
        if !deprecations.contains(&uri) {
            deprecations.push(uri);
        }
    }
    if !deprecations.is_empty() {
        warnings.push(format!(
            "Following deprecated link relation '{}': {}",
            rel,
            deprecations.join(", ")
        ));
    }

    warnings
}

/// Turn response data into a state map. `null` is an empty state.
pub(crate) fn state_from_value(uri: &str, data: Value) -> Result<Map<String, Value>> {
    match data {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(HypermediaError::InvalidPayload(format!(
            "expected an object for {}, got {}",
            uri, other
        ))),
    }
}

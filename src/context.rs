//! Resource contexts.
//!
//! A [`ResourceContext`] is an identity map of resources: asking it twice for
//! the same URI yields the same [`Resource`]. It also performs the HTTP
//! interactions of its resources, turning failed responses into structured
//! errors and successful ones into resource updates.
//!
//! # Identity and Aliases
//!
//! Within one context at most one resource exists per URI. A context created
//! with [`ContextConfig::enable_aliases`] additionally accepts responses whose
//! `self` link differs from the requested URI: the `self` href becomes an alias
//! of the requested resource and later lookups of either URI return the same
//! instance.
//!
//! # Lifecycle
//!
//! ```text
//! Unsynced ──GET/PUT ok──▶ Synced ──GET/PUT/PATCH ok──▶ Synced
//!                            │
//!                            └──DELETE ok──▶ Unsynced (evicted)
//! ```
//!
//! Failed requests leave the resource unchanged.
//!
//! # Examples
//!
//! ```ignore
//! use hypermedia_http::{ClientRuntime, ResourceContext, ReqwestTransport};
//!
//! let context = ResourceContext::hal(ClientRuntime::new(ReqwestTransport::new()));
//! let order = context.get("http://example.com/orders/1", None)?;
//! assert!(order.ptr_eq(&context.get("http://example.com/orders/1", None)?));
//!
//! order.load(None).await?;
//! order.patch(json!({"state": "shipped"})).await?;
//! ```

use crate::error::{HypermediaError, Result};
use crate::profile::Capabilities;
use crate::protocol::{parse_link_header, parse_media_type, rels, PROFILE_PARAM};
use crate::resource::{BlobResource, HalResource, PlainResource, Resource, ResourceFactory};
use crate::runtime::ClientRuntime;
use crate::types::{HttpRequest, HttpResponse, Link, Links, ResponseKind};
use crate::util::OneOrMany;
use bytes::Bytes;
use futures::future::join_all;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

/// Upper bound on alias chains followed by a lookup.
const MAX_ALIAS_HOPS: usize = 16;

/// Context configuration.
#[derive(Clone)]
pub struct ContextConfig {
    /// Type of resources created by [`ResourceContext::get`] without a factory
    pub default_factory: Option<ResourceFactory>,

    /// Accept `self` links that differ from the requested URI as aliases
    pub enable_aliases: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            default_factory: Some(PlainResource::factory()),
            enable_aliases: false,
        }
    }
}

impl fmt::Debug for ContextConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextConfig")
            .field(
                "default_factory",
                &self.default_factory.as_ref().map(|factory| factory.name()),
            )
            .field("enable_aliases", &self.enable_aliases)
            .finish()
    }
}

pub(crate) struct ContextInner {
    runtime: Arc<ClientRuntime>,
    config: ContextConfig,
    resources: RwLock<HashMap<String, Resource>>,
    aliases: RwLock<HashMap<String, String>>,
}

/// Identity map and HTTP orchestrator for resources.
///
/// Cloning yields a handle to the same context.
#[derive(Clone)]
pub struct ResourceContext {
    inner: Arc<ContextInner>,
}

impl ResourceContext {
    /// Create a context creating plain JSON resources by default.
    pub fn new(runtime: Arc<ClientRuntime>) -> Self {
        Self::with_config(runtime, ContextConfig::default())
    }

    /// Create a context creating HAL resources by default.
    pub fn hal(runtime: Arc<ClientRuntime>) -> Self {
        Self::with_config(
            runtime,
            ContextConfig {
                default_factory: Some(HalResource::factory()),
                ..Default::default()
            },
        )
    }

    /// Create a context with custom configuration.
    pub fn with_config(runtime: Arc<ClientRuntime>, config: ContextConfig) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                runtime,
                config,
                resources: RwLock::new(HashMap::new()),
                aliases: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<ContextInner>) -> Self {
        Self { inner }
    }

    /// The shared runtime.
    pub fn runtime(&self) -> &Arc<ClientRuntime> {
        &self.inner.runtime
    }

    /// The context configuration.
    pub fn config(&self) -> &ContextConfig {
        &self.inner.config
    }

    /// The factory used when [`get`](Self::get) is called without one.
    pub fn default_factory(&self) -> Option<ResourceFactory> {
        self.inner.config.default_factory.clone()
    }

    /// True if `self` links may register aliases.
    pub fn aliases_enabled(&self) -> bool {
        self.inner.config.enable_aliases
    }

    /// True if both handles refer to the same context.
    pub fn ptr_eq(&self, other: &ResourceContext) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ========== Identity Map ==========

    /// Get the resource for `uri`, creating it when absent.
    ///
    /// Alias URIs resolve to their canonical resource. A new resource is
    /// created by `factory`, or else by the default factory.
    ///
    /// # Errors
    ///
    /// [`HypermediaError::NoResourceFactory`] if the resource must be created
    /// and there is neither a factory nor a default factory.
    pub fn get(&self, uri: &str, factory: Option<&ResourceFactory>) -> Result<Resource> {
        let uri = self.resolve_alias(uri);

        if let Some(resource) = self.inner.resources.read().get(&uri) {
            return Ok(resource.clone());
        }

        let factory = factory
            .cloned()
            .or_else(|| self.default_factory())
            .ok_or_else(|| HypermediaError::NoResourceFactory(uri.clone()))?;

        let mut resources = self.inner.resources.write();
        let resource = resources
            .entry(uri.clone())
            .or_insert_with(|| {
                tracing::debug!("Creating {} for {}", factory.name(), uri);
                Resource::new(
                    uri.clone(),
                    factory,
                    Arc::downgrade(&self.inner),
                    Arc::clone(&self.inner.runtime),
                )
            })
            .clone();
        Ok(resource)
    }

    /// True if a resource is cached for `uri` (or the URI it aliases).
    pub fn contains(&self, uri: &str) -> bool {
        let uri = self.resolve_alias(uri);
        self.inner.resources.read().contains_key(&uri)
    }

    /// URIs of all cached resources, sorted.
    pub fn uris(&self) -> Vec<String> {
        let mut uris: Vec<String> = self.inner.resources.read().keys().cloned().collect();
        uris.sort();
        uris
    }

    /// Number of cached resources.
    pub fn len(&self) -> usize {
        self.inner.resources.read().len()
    }

    /// True if no resources are cached.
    pub fn is_empty(&self) -> bool {
        self.inner.resources.read().is_empty()
    }

    /// Copy a resource, typically from another context, into this one.
    ///
    /// The copy is this context's resource for the URI (created with the
    /// source's type when absent), updated with the source's state and links.
    pub fn copy(&self, resource: &Resource) -> Result<Resource> {
        let copy = self.get(resource.uri(), Some(resource.resource_type()))?;
        if copy.ptr_eq(resource) {
            return Ok(copy);
        }
        copy.replace_state(resource.data(), resource.links())
    }

    // ========== Aliases ==========

    /// Make `alias` resolve to the resource of `canonical`.
    ///
    /// A separate resource cached under `alias` is evicted.
    pub fn add_alias(&self, alias: &str, canonical: &str) -> Result<()> {
        if !self.aliases_enabled() {
            return Err(HypermediaError::AliasesDisabled {
                alias: alias.to_string(),
                canonical: canonical.to_string(),
            });
        }

        let canonical = self.resolve_alias(canonical);
        if alias == canonical {
            return Ok(());
        }

        tracing::debug!("Aliasing {} to {}", alias, canonical);
        self.inner
            .aliases
            .write()
            .insert(alias.to_string(), canonical);
        self.inner.resources.write().remove(alias);
        Ok(())
    }

    /// The canonical URI of `uri`.
    pub fn resolve_alias(&self, uri: &str) -> String {
        let aliases = self.inner.aliases.read();
        let mut current = uri;
        for _ in 0..MAX_ALIAS_HOPS {
            match aliases.get(current) {
                Some(next) => current = next,
                None => break,
            }
        }
        current.to_string()
    }

    /// Alias URIs of `canonical`, sorted.
    pub fn aliases_of(&self, canonical: &str) -> Vec<String> {
        let mut aliases: Vec<String> = self
            .inner
            .aliases
            .read()
            .iter()
            .filter(|(_, target)| target.as_str() == canonical)
            .map(|(alias, _)| alias.clone())
            .collect();
        aliases.sort();
        aliases
    }

    fn evict(&self, resource: &Resource) {
        let uri = resource.uri();
        {
            let mut resources = self.inner.resources.write();
            if resources.get(uri).is_some_and(|cached| cached.ptr_eq(resource)) {
                resources.remove(uri);
            }
        }
        self.inner
            .aliases
            .write()
            .retain(|alias, target| alias.as_str() != uri && target.as_str() != uri);
        tracing::debug!("Evicted {}", uri);
    }

    // ========== Runtime Shortcuts ==========

    /// Requests currently in flight, across every context of the runtime.
    pub fn busy_requests(&self) -> usize {
        self.inner.runtime.busy_requests()
    }

    /// Register the capabilities of a profile with the runtime.
    pub fn register_profile(&self, profile: impl Into<String>, capabilities: Capabilities) {
        self.inner.runtime.register_profile(profile, capabilities);
    }

    /// Register the error handler for a response content type with the runtime.
    pub fn register_error_handler<F>(&self, content_type: impl Into<String>, handler: F)
    where
        F: Fn(&HttpResponse) -> crate::error::ErrorPayload + Send + Sync + 'static,
    {
        self.inner
            .runtime
            .register_error_handler(content_type, handler);
    }

    /// Set the synchronization time of resources; `None` marks them unsynced.
    pub fn mark_synced(&self, resources: &[Resource], time: Option<SystemTime>) {
        for resource in resources {
            resource.set_sync_time(time);
        }
    }

    // ========== HTTP ==========

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = request.method.clone();
        let url = request.url.clone();
        tracing::debug!("{} {}", method, url);

        let response = self.inner.runtime.transport().execute(request).await?;
        tracing::debug!("{} {} -> {}", method, url, response.status);

        if !response.is_success() {
            return Err(self.inner.runtime.error_handlers().handle(&response).into());
        }
        Ok(response)
    }

    /// GET a resource and update it (and any resources it embeds).
    ///
    /// Links come from the `Link` header; a `profile` parameter of the
    /// `Content-Type` becomes a `profile` link when the header has none.
    pub async fn http_get(&self, resource: &Resource) -> Result<Resource> {
        let request = resource.get_request();
        let kind = request.response_kind;

        let _busy = self.inner.runtime.begin_request();
        let response = self.execute(request).await?;

        let mut links = match response.header("link") {
            Some(header) => parse_link_header(header)?,
            None => Links::new(),
        };
        if !links.contains_key(rels::PROFILE) {
            if let Some(profile) = content_type_profile(&response) {
                links.insert(rels::PROFILE.to_string(), OneOrMany::One(Link::new(profile)));
            }
        }

        let data = match kind {
            ResponseKind::Json => response.json()?,
            ResponseKind::Binary => BlobResource::payload(&response),
        };

        let updated = resource.update(data, links)?;
        self.mark_synced(&updated, Some(SystemTime::now()));
        Ok(resource.clone())
    }

    /// PUT the state of a resource.
    pub async fn http_put(&self, resource: &Resource) -> Result<Resource> {
        let request = resource.put_request()?;

        let _busy = self.inner.runtime.begin_request();
        self.execute(request).await?;

        self.mark_synced(std::slice::from_ref(resource), Some(SystemTime::now()));
        Ok(resource.clone())
    }

    /// PATCH a resource and merge the patch into its state.
    pub async fn http_patch(&self, resource: &Resource, patch: Value) -> Result<Resource> {
        let request = resource.patch_request(&patch)?;

        let _busy = self.inner.runtime.begin_request();
        self.execute(request).await?;

        resource.merge(&patch)?;
        self.mark_synced(std::slice::from_ref(resource), Some(SystemTime::now()));
        Ok(resource.clone())
    }

    /// DELETE a resource, marking it unsynced and evicting it.
    pub async fn http_delete(&self, resource: &Resource) -> Result<Resource> {
        let request = resource.delete_request();

        let _busy = self.inner.runtime.begin_request();
        self.execute(request).await?;

        self.mark_synced(std::slice::from_ref(resource), None);
        self.evict(resource);
        Ok(resource.clone())
    }

    /// POST to a resource and return the response.
    pub async fn http_post(
        &self,
        resource: &Resource,
        body: Option<Bytes>,
        headers: BTreeMap<String, String>,
    ) -> Result<HttpResponse> {
        self.http_post_with(resource, body, headers, |request| request)
            .await
    }

    /// POST to a resource, letting `configure` adjust the request.
    pub async fn http_post_with<F>(
        &self,
        resource: &Resource,
        body: Option<Bytes>,
        headers: BTreeMap<String, String>,
        configure: F,
    ) -> Result<HttpResponse>
    where
        F: FnOnce(HttpRequest) -> HttpRequest + Send,
    {
        let request = configure(resource.post_request(body, headers));

        let _busy = self.inner.runtime.begin_request();
        self.execute(request).await
    }

    /// GET every synchronized resource again.
    ///
    /// With `stale_before`, only resources synchronized before that time are
    /// refreshed. Every request settles; one result per refreshed resource is
    /// returned.
    pub async fn refresh(&self, stale_before: Option<SystemTime>) -> Vec<Result<Resource>> {
        let stale: Vec<Resource> = self
            .inner
            .resources
            .read()
            .values()
            .filter(|resource| match (resource.sync_time(), stale_before) {
                (Some(synced), Some(stale_before)) => synced < stale_before,
                (Some(_), None) => true,
                (None, _) => false,
            })
            .cloned()
            .collect();

        tracing::debug!("Refreshing {} resources", stale.len());
        join_all(stale.iter().map(|resource| self.http_get(resource))).await
    }
}

impl fmt::Debug for ResourceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceContext")
            .field("config", &self.inner.config)
            .field("resources", &self.uris())
            .finish()
    }
}

fn content_type_profile(response: &HttpResponse) -> Option<String> {
    let content_type = response.header("content-type")?;
    let media_type = parse_media_type(content_type).ok()?;
    media_type.param(PROFILE_PARAM).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockTransport;

    fn context(enable_aliases: bool) -> ResourceContext {
        ResourceContext::with_config(
            ClientRuntime::new(MockTransport::new()),
            ContextConfig {
                enable_aliases,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_get_returns_same_instance() {
        let context = context(false);
        let first = context.get("http://example.com", None).unwrap();
        let second = context.get("http://example.com", None).unwrap();
        assert!(first.ptr_eq(&second));
        assert_eq!(context.len(), 1);
    }

    #[test]
    fn test_get_without_factory() {
        let context = ResourceContext::with_config(
            ClientRuntime::new(MockTransport::new()),
            ContextConfig {
                default_factory: None,
                enable_aliases: false,
            },
        );
        assert!(matches!(
            context.get("http://example.com", None),
            Err(HypermediaError::NoResourceFactory(_))
        ));
        assert!(context
            .get("http://example.com", Some(&HalResource::factory()))
            .is_ok());
    }

    #[test]
    fn test_add_alias_disabled() {
        let context = context(false);
        assert!(matches!(
            context.add_alias("http://example.com/a", "http://example.com/b"),
            Err(HypermediaError::AliasesDisabled { .. })
        ));
    }

    #[test]
    fn test_add_alias_evicts_separate_instance() {
        let context = context(true);
        let alias = context.get("http://example.com/a", None).unwrap();
        let canonical = context.get("http://example.com/b", None).unwrap();

        context
            .add_alias("http://example.com/a", "http://example.com/b")
            .unwrap();

        let resolved = context.get("http://example.com/a", None).unwrap();
        assert!(resolved.ptr_eq(&canonical));
        assert!(!resolved.ptr_eq(&alias));
        assert_eq!(context.uris(), vec!["http://example.com/b".to_string()]);
        assert_eq!(context.aliases_of("http://example.com/b"), vec!["http://example.com/a".to_string()]);
    }

    #[test]
    fn test_alias_chain_resolves() {
        let context = context(true);
        context.add_alias("a", "b").unwrap();
        context.add_alias("b", "c").unwrap();
        assert_eq!(context.resolve_alias("a"), "c");
        context.add_alias("c", "c").unwrap();
        assert_eq!(context.resolve_alias("c"), "c");
    }

    #[test]
    fn test_content_type_profile() {
        let response = HttpResponse::empty(200)
            .with_header("Content-Type", "application/json; profile=\"http://example.com/p\"");
        assert_eq!(content_type_profile(&response).as_deref(), Some("http://example.com/p"));
        assert!(content_type_profile(&HttpResponse::empty(200)).is_none());
    }
}

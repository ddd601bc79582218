//! Profile-driven capabilities.
//!
//! A server declares the semantic shape of a resource with a profile URI (a
//! `profile` link or the `profile` media type parameter). Clients register a
//! set of [`Capabilities`] per profile URI; a resource whose profile is set to
//! that URI exposes those capabilities through
//! [`Resource::property`](crate::Resource::property) and
//! [`Resource::invoke`](crate::Resource::invoke).
//!
//! Capabilities are resolved when the profile is set: changing the profile
//! tears down the previous set and installs the new one. Profiles without a
//! registration install nothing.
//!
//! # Capability Kinds
//!
//! | Kind | Lookup | Example |
//! |------|--------|---------|
//! | [`Capability::Value`] | `property(name)` | a constant flag |
//! | [`Capability::Accessor`] | `property(name)` | `full_name` computed from state |
//! | [`Capability::Method`] | `invoke(name, args)` | `greet("Hi")` |
//!
//! # Examples
//!
//! ```
//! use hypermedia_http::profile::{Capabilities, ProfileRegistry};
//! use serde_json::json;
//!
//! let registry = ProfileRegistry::new();
//! registry.register(
//!     "http://example.com/profiles/person",
//!     Capabilities::new()
//!         .value("kind", json!("person"))
//!         .accessor("full_name", |r| {
//!             json!(format!("{} {}", r.get_str("first").unwrap_or_default(), r.get_str("last").unwrap_or_default()))
//!         }),
//! );
//! assert!(registry.lookup("http://example.com/profiles/person").is_some());
//! ```

use crate::error::Result;
use crate::resource::Resource;
use crate::util::OneOrMany;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Computes a property from the resource.
pub type AccessorFn = Arc<dyn Fn(&Resource) -> Value + Send + Sync>;

/// A callable capability.
pub type MethodFn = Arc<dyn Fn(&Resource, &[Value]) -> Result<Value> + Send + Sync>;

/// One named capability contributed by a profile.
#[derive(Clone)]
pub enum Capability {
    /// Constant value
    Value(Value),
    /// Property computed on access
    Accessor(AccessorFn),
    /// Method invoked with arguments
    Method(MethodFn),
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Capability::Accessor(_) => f.write_str("Accessor(..)"),
            Capability::Method(_) => f.write_str("Method(..)"),
        }
    }
}

/// The named capabilities of one profile.
#[derive(Clone, Debug, Default)]
pub struct Capabilities {
    entries: BTreeMap<String, Capability>,
}

impl Capabilities {
    /// Create an empty capability set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constant property.
    #[must_use]
    pub fn value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries
            .insert(name.into(), Capability::Value(value.into()));
        self
    }

    /// Add a computed property.
    #[must_use]
    pub fn accessor<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Resource) -> Value + Send + Sync + 'static,
    {
        self.entries
            .insert(name.into(), Capability::Accessor(Arc::new(f)));
        self
    }

    /// Add a method.
    #[must_use]
    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Resource, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.entries
            .insert(name.into(), Capability::Method(Arc::new(f)));
        self
    }

    /// Look up a capability by name.
    pub fn get(&self, name: &str) -> Option<&Capability> {
        self.entries.get(name)
    }

    /// Capability names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of capabilities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no capabilities.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Registry mapping profile URIs to capabilities.
///
/// Cloning yields a handle to the same registry.
#[derive(Clone, Default)]
pub struct ProfileRegistry {
    profiles: Arc<RwLock<HashMap<String, Arc<Capabilities>>>>,
}

impl ProfileRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the capabilities of a profile.
    ///
    /// Resources whose profile is already set keep the capabilities they
    /// resolved; the new registration applies the next time a profile is set.
    pub fn register(&self, profile: impl Into<String>, capabilities: Capabilities) {
        self.profiles
            .write()
            .insert(profile.into(), Arc::new(capabilities));
    }

    /// Register several profiles at once.
    pub fn register_profiles<I, K>(&self, profiles: I)
    where
        I: IntoIterator<Item = (K, Capabilities)>,
        K: Into<String>,
    {
        let mut registered = self.profiles.write();
        for (profile, capabilities) in profiles {
            registered.insert(profile.into(), Arc::new(capabilities));
        }
    }

    /// Remove a profile registration.
    pub fn unregister(&self, profile: &str) -> Option<Arc<Capabilities>> {
        self.profiles.write().remove(profile)
    }

    /// The capabilities registered for a profile.
    pub fn lookup(&self, profile: &str) -> Option<Arc<Capabilities>> {
        self.profiles.read().get(profile).cloned()
    }

    /// Resolve the capability sets of one or more profiles, in order.
    ///
    /// Unregistered profiles are skipped.
    pub fn resolve(&self, profiles: &OneOrMany<String>) -> Vec<Arc<Capabilities>> {
        let registered = self.profiles.read();
        profiles
            .iter()
            .filter_map(|profile| registered.get(profile).cloned())
            .collect()
    }
}

impl fmt::Debug for ProfileRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self.profiles.read().keys().cloned().collect();
        keys.sort();
        f.debug_struct("ProfileRegistry")
            .field("profiles", &keys)
            .finish()
    }
}

//! Shared client runtime.
//!
//! Everything that is shared between contexts lives in one explicitly
//! constructed [`ClientRuntime`]: the transport, the profile registry, the
//! error-handler registry and the count of in-flight requests. Contexts hold an
//! `Arc<ClientRuntime>`; tests build a fresh runtime per test.
//!
//! # Examples
//!
//! ```
//! use hypermedia_http::{ClientRuntime, MockTransport, ResourceContext};
//! use hypermedia_http::profile::Capabilities;
//!
//! let runtime = ClientRuntime::new(MockTransport::new());
//! runtime.register_profile("http://example.com/profiles/order", Capabilities::new().value("kind", "order"));
//!
//! let first = ResourceContext::new(runtime.clone());
//! let second = ResourceContext::new(runtime.clone());
//! assert_eq!(first.busy_requests(), 0);
//! assert_eq!(second.busy_requests(), 0);
//! ```

use crate::client::Transport;
use crate::error::{ErrorHandlerRegistry, ErrorPayload};
use crate::profile::{Capabilities, ProfileRegistry};
use crate::types::HttpResponse;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// State shared by every context created from it.
pub struct ClientRuntime {
    transport: Arc<dyn Transport>,
    profiles: ProfileRegistry,
    error_handlers: ErrorHandlerRegistry,
    busy_requests: AtomicUsize,
}

impl ClientRuntime {
    /// Create a runtime around a transport.
    ///
    /// The `application/vnd.error+json` error handler is installed.
    pub fn new<T: Transport + 'static>(transport: T) -> Arc<Self> {
        Self::with_transport(Arc::new(transport))
    }

    /// Create a runtime around a shared transport.
    pub fn with_transport(transport: Arc<dyn Transport>) -> Arc<Self> {
        Arc::new(Self {
            transport,
            profiles: ProfileRegistry::new(),
            error_handlers: ErrorHandlerRegistry::with_defaults(),
            busy_requests: AtomicUsize::new(0),
        })
    }

    /// The transport executing requests.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// The profile registry.
    pub fn profiles(&self) -> &ProfileRegistry {
        &self.profiles
    }

    /// The error-handler registry.
    pub fn error_handlers(&self) -> &ErrorHandlerRegistry {
        &self.error_handlers
    }

    /// Register the capabilities of a profile.
    pub fn register_profile(&self, profile: impl Into<String>, capabilities: Capabilities) {
        self.profiles.register(profile, capabilities);
    }

    /// Register several profiles.
    pub fn register_profiles<I, K>(&self, profiles: I)
    where
        I: IntoIterator<Item = (K, Capabilities)>,
        K: Into<String>,
    {
        self.profiles.register_profiles(profiles);
    }

    /// Register the error handler for a response content type.
    pub fn register_error_handler<F>(&self, content_type: impl Into<String>, handler: F)
    where
        F: Fn(&HttpResponse) -> ErrorPayload + Send + Sync + 'static,
    {
        self.error_handlers.register(content_type, handler);
    }

    /// Number of requests currently in flight across all contexts.
    pub fn busy_requests(&self) -> usize {
        self.busy_requests.load(Ordering::SeqCst)
    }

    /// Count a request as in flight until the guard is dropped.
    pub(crate) fn begin_request(self: &Arc<Self>) -> BusyGuard {
        self.busy_requests.fetch_add(1, Ordering::SeqCst);
        BusyGuard {
            runtime: Arc::clone(self),
        }
    }
}

impl fmt::Debug for ClientRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientRuntime")
            .field("profiles", &self.profiles)
            .field("error_handlers", &self.error_handlers)
            .field("busy_requests", &self.busy_requests())
            .finish_non_exhaustive()
    }
}

/// Decrements the in-flight counter on drop, whether the request succeeded,
/// failed or its future was dropped.
pub(crate) struct BusyGuard {
    runtime: Arc<ClientRuntime>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.runtime.busy_requests.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockTransport;

    #[test]
    fn test_busy_guard_balances() {
        let runtime = ClientRuntime::new(MockTransport::new());
        let first = runtime.begin_request();
        let second = runtime.begin_request();
        assert_eq!(runtime.busy_requests(), 2);
        drop(first);
        assert_eq!(runtime.busy_requests(), 1);
        drop(second);
        assert_eq!(runtime.busy_requests(), 0);
    }

    #[test]
    fn test_vnd_error_handler_installed() {
        let runtime = ClientRuntime::new(MockTransport::new());
        let response = HttpResponse::new(400, r#"{"message": "bad"}"#)
            .with_header("Content-Type", "application/vnd.error+json");
        assert_eq!(runtime.error_handlers().handle(&response).error.message, "bad");
    }
}

//! # Mock Transport
//!
//! Utilities for testing resources and contexts without a server.
//!
//! Register canned responses with [`MockTransport::on`] (answers every
//! matching request) or [`MockTransport::once`] (answers the next matching
//! request only, ahead of `on` routes). Every executed request is recorded and
//! available through [`MockTransport::requests`].
//!
//! [`MockTransport::pause`] holds every request at the transport boundary until
//! [`MockTransport::resume`] is called, which makes in-flight requests
//! observable.
//!
//! # Example
//! ```ignore
//! let transport = MockTransport::new();
//! transport.on(Method::GET, "http://example.com", HttpResponse::new(200, r#"{"name": "John"}"#));
//!
//! let context = ResourceContext::new(ClientRuntime::new(transport.clone()));
//! let resource = context.get("http://example.com", None)?.load(None).await?;
//! assert_eq!(transport.requests().len(), 1);
//! ```

use super::Transport;
use crate::error::{HypermediaError, Result};
use crate::types::{HttpRequest, HttpResponse};
use async_trait::async_trait;
use http::Method;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::watch;

type RouteKey = (Method, String);
type Reply = std::result::Result<HttpResponse, String>;

struct MockState {
    routes: HashMap<RouteKey, Reply>,
    queued: HashMap<RouteKey, VecDeque<Reply>>,
    requests: Vec<HttpRequest>,
}

/// A transport answering from canned responses.
///
/// Cloning yields a handle to the same routes and request log.
#[derive(Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    gate: Arc<watch::Sender<bool>>,
}

impl MockTransport {
    /// Creates a mock transport with no routes.
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            state: Arc::new(Mutex::new(MockState {
                routes: HashMap::new(),
                queued: HashMap::new(),
                requests: Vec::new(),
            })),
            gate: Arc::new(gate),
        }
    }

    /// Answer every `method url` request with `response`.
    pub fn on(&self, method: Method, url: impl Into<String>, response: HttpResponse) -> &Self {
        self.state
            .lock()
            .routes
            .insert((method, url.into()), Ok(response));
        self
    }

    /// Answer the next `method url` request with `response`.
    pub fn once(&self, method: Method, url: impl Into<String>, response: HttpResponse) -> &Self {
        self.state
            .lock()
            .queued
            .entry((method, url.into()))
            .or_default()
            .push_back(Ok(response));
        self
    }

    /// Fail every `method url` request with a transport error.
    pub fn fail(&self, method: Method, url: impl Into<String>, message: impl Into<String>) -> &Self {
        self.state
            .lock()
            .routes
            .insert((method, url.into()), Err(message.into()));
        self
    }

    /// All requests executed so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state.lock().requests.clone()
    }

    /// Requests executed so far for one method and URL.
    pub fn requests_to(&self, method: &Method, url: &str) -> Vec<HttpRequest> {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|r| &r.method == method && r.url == url)
            .cloned()
            .collect()
    }

    /// Hold requests until [`resume`](Self::resume) is called.
    pub fn pause(&self) {
        self.gate.send_replace(false);
    }

    /// Release held requests.
    pub fn resume(&self) {
        self.gate.send_replace(true);
    }

    fn reply(&self, request: &HttpRequest) -> Reply {
        let mut state = self.state.lock();
        state.requests.push(request.clone());

        let key = (request.method.clone(), request.url.clone());
        if let Some(reply) = state.queued.get_mut(&key).and_then(VecDeque::pop_front) {
            return reply;
        }
        state
            .routes
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Err(format!("no mock response for {} {}", request.method, request.url)))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let reply = self.reply(&request);

        let mut gate = self.gate.subscribe();
        gate.wait_for(|open| *open)
            .await
            .map_err(|e| HypermediaError::Transport(e.to_string()))?;

        reply.map_err(HypermediaError::Transport)
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

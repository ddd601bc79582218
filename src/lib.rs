#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! # Hypermedia HTTP: a client for linked JSON resources
//!
//! This crate models remote HTTP resources as local objects that know their
//! links. A [`ResourceContext`] hands out one [`Resource`] per URI, performs
//! the HTTP verbs of its resources and applies responses to them; HAL
//! representations are unpacked into their links and embedded resources.
//!
//! ## Overview
//!
//! 1. **Identity map** - one resource per URI and context, with optional aliases
//! 2. **Link following** - link relations and href properties, URI Templates, link diagnostics
//! 3. **HAL** - `_links` and `_embedded` extraction, embedded resources cached in the same context
//! 4. **Profiles** - capabilities attached to resources by profile URI
//! 5. **Merge Patch** - RFC 7386 for `PATCH` and local state
//!
//! ## Key Features
//!
//! - **Pluggable transport**: [`ReqwestTransport`] for real traffic, [`MockTransport`] for tests
//! - **Structured errors**: failed responses dispatched to handlers keyed by content type
//!   (`application/vnd.error+json` built in)
//! - **Link header and Content-Type profile** support for non-HAL APIs
//! - **Binary resources** with [`BlobResource`]
//! - **Path loading**: [`Resource::load_paths`] loads a graph of related resources concurrently
//! - **In-flight counter** shared by every context of a [`ClientRuntime`]
//!
//! ## Usage
//!
//! ```ignore
//! use hypermedia_http::{ClientRuntime, ResourceContext, ReqwestTransport};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> hypermedia_http::Result<()> {
//!     let context = ResourceContext::hal(ClientRuntime::new(ReqwestTransport::new()));
//!
//!     let order = context.get("http://example.com/orders/1", None)?;
//!     order.load_paths(&json!({"customer": {}, "item": {}}), None).await?;
//!
//!     if let Some(customer) = order.resolve_link_relation("customer", None, None)? {
//!         println!("{:?}", customer);
//!     }
//!
//!     order.patch(json!({"state": "shipped"})).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Structure
//!
//! - **[resource]** - Resources and resource types (plain JSON, HAL, binary)
//! - **[context]** - Identity map and HTTP orchestration
//! - **[runtime]** - State shared between contexts
//! - **[profile]** - Profile registry and capabilities
//! - **[client]** - Transports and client configuration
//! - **[types]** - Links, request and response descriptors
//! - **[error]** - Error types and error handlers
//! - **[merge]** - JSON Merge Patch
//! - **[protocol]** - Media types, Link header, URI Templates
//! - **[util]** - One-or-many values

pub mod client;
pub mod context;
pub mod error;
pub mod merge;
pub mod profile;
pub mod protocol;
pub mod resource;
pub mod runtime;
pub mod types;
pub mod util;

pub use client::{ClientConfig, MockTransport, ReqwestTransport, Transport};
pub use context::{ContextConfig, ResourceContext};
pub use error::{ErrorPayload, HypermediaError, ResponseError, Result};
pub use merge::merge_patch;
pub use profile::{Capabilities, ProfileRegistry};
pub use resource::{BlobResource, HalResource, PlainResource, Resource, ResourceFactory, ResourceType};
pub use runtime::ClientRuntime;
pub use types::{HttpRequest, HttpResponse, Link, Links};
pub use util::OneOrMany;

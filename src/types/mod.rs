//! Core data types for hypermedia resources.
//!
//! # Type Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        HttpRequest                          │
//! │  (built by a resource type: method, url, headers, body)     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │  Transport::execute
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        HttpResponse                         │
//! │  (status, headers, body; Link/Content-Type feed the links)  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │  ResourceType::update
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                           Links                             │
//! │  (relation -> one Link or an ordered sequence of Links)     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Core Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Link`] | Link descriptor: `href`, `templated`, `deprecation`, extra members |
//! | [`Links`] | Link table keyed by relation |
//! | [`HttpRequest`] | Transport-agnostic request descriptor |
//! | [`HttpResponse`] | Transport-agnostic response |
//! | [`ResponseKind`] | How the body of a response should be read |

mod link;
mod request;
mod response;

pub use link::{add_link, Link, Links};
pub use request::{HttpRequest, ResponseKind};
pub use response::HttpResponse;

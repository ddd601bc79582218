//! Merge algorithms for partial resource updates.
//!
//! A PATCH request sends only the changed members of a resource. Once the server
//! acknowledges it, the same patch is applied to the local state so the cached
//! resource matches what the server now holds.
//!
//! # Merge Patch (RFC 7386)
//!
//! | Patch member | Effect on target |
//! |--------------|------------------|
//! | `null` | member is removed |
//! | object | merged recursively (non-object target becomes `{}`) |
//! | anything else (arrays included) | replaces the member |
//!
//! # Examples
//!
//! ```
//! use hypermedia_http::merge::merge_patch;
//! use serde_json::json;
//!
//! let mut target = json!({"a": 1, "b": 2});
//! merge_patch(&mut target, &json!({"a": null}));
//! assert_eq!(target, json!({"b": 2}));
//!
//! let mut target = json!({"nested": {"x": 1, "y": 1, "z": 1}});
//! merge_patch(&mut target, &json!({"nested": {"x": null, "y": "v"}}));
//! assert_eq!(target, json!({"nested": {"y": "v", "z": 1}}));
//! ```
//!
//! # Specification
//!
//! - [RFC 7386](https://tools.ietf.org/html/rfc7386) JSON Merge Patch

pub mod patch;

pub use patch::{merge_patch, merge_patch_map};

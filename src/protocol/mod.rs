//! Protocol constants and pure parsing helpers.
//!
//! # Module Organization
//!
//! ```text
//! protocol/
//! ├── headers      - Link header and media type parsing
//! └── uri_template - RFC 6570 URI Template expansion
//! ```
//!
//! # Media Types
//!
//! | Constant | Value | Used for |
//! |----------|-------|----------|
//! | [`media_types::JSON`] | `application/json` | plain resources |
//! | [`media_types::HAL_JSON`] | `application/hal+json` | HAL resources |
//! | [`media_types::MERGE_PATCH_JSON`] | `application/merge-patch+json` | PATCH bodies |
//! | [`media_types::VND_ERROR`] | `application/vnd.error+json` | error payloads |
//! | [`media_types::ANY`] | `*/*` | blob resources |
//! | [`media_types::OCTET_STREAM`] | `binary/octet-stream` | blob fallback |

pub mod headers;
pub mod uri_template;

pub use headers::{parse_link_header, parse_media_type, MediaType};
pub use uri_template::expand_uri_template;

/// Media type constants.
pub mod media_types {
    /// Plain JSON
    pub const JSON: &str = "application/json";
    /// HAL JSON
    pub const HAL_JSON: &str = "application/hal+json";
    /// JSON Merge Patch (RFC 7386)
    pub const MERGE_PATCH_JSON: &str = "application/merge-patch+json";
    /// vnd.error JSON
    pub const VND_ERROR: &str = "application/vnd.error+json";
    /// Any media type
    pub const ANY: &str = "*/*";
    /// Fallback for binary data without a known type
    pub const OCTET_STREAM: &str = "binary/octet-stream";
}

/// Well-known link relations.
pub mod rels {
    /// The canonical URI of a resource
    pub const SELF: &str = "self";
    /// The profile of a resource
    pub const PROFILE: &str = "profile";
}

/// Media type parameter carrying a profile URI.
pub const PROFILE_PARAM: &str = "profile";

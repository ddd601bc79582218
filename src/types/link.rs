//! Link descriptors and link tables.
//!
//! ```
//! use hypermedia_http::types::{add_link, Link, Links};
//!
//! let mut links = Links::new();
//! add_link(&mut links, "item", Link::new("http://example.com/1"));
//! add_link(&mut links, "item", Link::new("http://example.com/2"));
//! assert_eq!(links["item"].len(), 2);
//! ```

use crate::util::OneOrMany;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A link table: relation name to one link or an ordered sequence of links.
pub type Links = BTreeMap<String, OneOrMany<Link>>;

/// A hypermedia link.
///
/// Members other than `href`, `templated` and `deprecation` (`title`, `type`,
/// `name`, ...) are kept in `extra` and survive serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Target URI or URI Template
    pub href: String,

    /// Whether `href` is a URI Template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templated: Option<bool>,

    /// URI describing the deprecation of this link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation: Option<String>,

    /// Any other link members
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Link {
    /// Create a link to `href`.
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            templated: None,
            deprecation: None,
            extra: Map::new(),
        }
    }

    /// Mark the link as a URI Template.
    #[must_use]
    pub fn templated(mut self) -> Self {
        self.templated = Some(true);
        self
    }

    /// Mark the link as deprecated.
    #[must_use]
    pub fn with_deprecation(mut self, uri: impl Into<String>) -> Self {
        self.deprecation = Some(uri.into());
        self
    }

    /// Add an extra member such as `title`.
    #[must_use]
    pub fn with_member(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// True if `href` should be expanded as a URI Template.
    pub fn is_templated(&self) -> bool {
        self.templated == Some(true)
    }
}

impl From<Link> for OneOrMany<Link> {
    fn from(link: Link) -> Self {
        OneOrMany::One(link)
    }
}

/// Add a link under `rel`, turning a single link into a sequence when needed.
pub fn add_link(links: &mut Links, rel: impl Into<String>, link: Link) {
    let rel = rel.into();
    let entry = match links.remove(&rel) {
        None => OneOrMany::One(link),
        Some(OneOrMany::One(existing)) => OneOrMany::Many(vec![existing, link]),
        Some(OneOrMany::Many(mut existing)) => {
            existing.push(link);
            OneOrMany::Many(existing)
        }
    };
    links.insert(rel, entry);
}

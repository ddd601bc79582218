//! Scalar-vs-array normalization.
//!
//! Hypermedia payloads use the same slot for one value or an ordered list of
//! values: a link relation may hold one link or several, a property may hold
//! one href or several. [`OneOrMany`] keeps that shape while letting callers
//! apply one function to every element.
//!
//! # Examples
//!
//! ```
//! use hypermedia_http::util::OneOrMany;
//!
//! let one = OneOrMany::One("http://example.com/1");
//! assert_eq!(one.map(str::len), OneOrMany::One(20));
//!
//! let many = OneOrMany::Many(vec![1, 2, 3]);
//! assert_eq!(many.map(|n| n * 2), OneOrMany::Many(vec![2, 4, 6]));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Either a single value or an ordered sequence of values.
///
/// Order of a `Many` sequence is always preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// An ordered sequence
    Many(Vec<T>),
    /// A single value
    One(T),
}

impl<T> OneOrMany<T> {
    /// Apply `f` to the value or to every element, keeping the shape.
    pub fn map<U, F>(self, f: F) -> OneOrMany<U>
    where
        F: FnMut(T) -> U,
    {
        let mut f = f;
        match self {
            OneOrMany::One(value) => OneOrMany::One(f(value)),
            OneOrMany::Many(values) => OneOrMany::Many(values.into_iter().map(f).collect()),
        }
    }

    /// Like [`map`](Self::map) but stops at the first error.
    pub fn try_map<U, E, F>(self, f: F) -> Result<OneOrMany<U>, E>
    where
        F: FnMut(T) -> Result<U, E>,
    {
        let mut f = f;
        match self {
            OneOrMany::One(value) => f(value).map(OneOrMany::One),
            OneOrMany::Many(values) => values
                .into_iter()
                .map(f)
                .collect::<Result<Vec<_>, E>>()
                .map(OneOrMany::Many),
        }
    }

    /// Apply `f` to borrowed elements, keeping the shape.
    pub fn map_ref<U, F>(&self, f: F) -> OneOrMany<U>
    where
        F: FnMut(&T) -> U,
    {
        let mut f = f;
        match self {
            OneOrMany::One(value) => OneOrMany::One(f(value)),
            OneOrMany::Many(values) => OneOrMany::Many(values.iter().map(f).collect()),
        }
    }

    /// All elements as a slice.
    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::One(value) => std::slice::from_ref(value),
            OneOrMany::Many(values) => values,
        }
    }

    /// Iterate over the elements in order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// The single value, if this is `One`.
    pub fn as_one(&self) -> Option<&T> {
        match self {
            OneOrMany::One(value) => Some(value),
            OneOrMany::Many(_) => None,
        }
    }

    /// The first element.
    pub fn first(&self) -> Option<&T> {
        self.as_slice().first()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// True for an empty `Many`.
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// True if this is `Many`.
    pub fn is_many(&self) -> bool {
        matches!(self, OneOrMany::Many(_))
    }

    /// Consume into a vector.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

impl OneOrMany<Value> {
    /// Split a JSON value: arrays become `Many`, anything else `One`.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Array(values) => OneOrMany::Many(values),
            other => OneOrMany::One(other),
        }
    }
}

impl OneOrMany<String> {
    /// Read hrefs from a JSON value: a string or an array of strings.
    ///
    /// Non-string array members are skipped. Returns `None` for any other value.
    pub fn hrefs_from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(href) => Some(OneOrMany::One(href.clone())),
            Value::Array(values) => Some(OneOrMany::Many(
                values
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
            )),
            _ => None,
        }
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(values: Vec<T>) -> Self {
        OneOrMany::Many(values)
    }
}

impl From<&str> for OneOrMany<String> {
    fn from(value: &str) -> Self {
        OneOrMany::One(value.to_string())
    }
}

impl From<String> for OneOrMany<String> {
    fn from(value: String) -> Self {
        OneOrMany::One(value)
    }
}

impl From<Vec<&str>> for OneOrMany<String> {
    fn from(values: Vec<&str>) -> Self {
        OneOrMany::Many(values.into_iter().map(str::to_string).collect())
    }
}

impl<T> IntoIterator for OneOrMany<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_vec().into_iter()
    }
}

impl<'a, T> IntoIterator for &'a OneOrMany<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

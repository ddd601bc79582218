//! Header parsing for hypermedia responses.
//!
//! # Header Formats
//!
//! | Header | Format | Example |
//! |--------|--------|---------|
//! | Link | `<uri>; rel="a b"; param=value, ...` | `<http://example.com/2>; rel="next"` |
//! | Content-Type | `type/subtype; param=value` | `application/json; profile="http://example.com/p"` |
//!
//! # Examples
//!
//! ```
//! use hypermedia_http::protocol::{parse_link_header, parse_media_type};
//!
//! let links = parse_link_header(r#"<http://example.com/2>; rel="next""#).unwrap();
//! assert_eq!(links["next"].first().unwrap().href, "http://example.com/2");
//!
//! let media_type = parse_media_type(r#"application/json; profile="http://example.com/p""#).unwrap();
//! assert_eq!(media_type.essence(), "application/json");
//! assert_eq!(media_type.param("profile"), Some("http://example.com/p"));
//! ```
//!
//! [RFC 8288]: https://datatracker.ietf.org/doc/html/rfc8288

use crate::error::{HypermediaError, Result};
use crate::types::{add_link, Link, Links};
use serde_json::Value;
use std::collections::BTreeMap;
use std::iter::Peekable;
use std::str::Chars;

/// Parse a `Link` header ([RFC 8288]) into a link table.
///
/// A link with several space-separated relation types is added under each of
/// them. Several links with the same relation become an ordered sequence.
/// The `templated` and `deprecation` parameters map onto the matching [`Link`]
/// fields; other parameters are kept as string members.
///
/// # Errors
///
/// Returns [`HypermediaError::HeaderParse`] if a link target is not enclosed
/// in `<` `>`.
///
/// [RFC 8288]: https://datatracker.ietf.org/doc/html/rfc8288
pub fn parse_link_header(value: &str) -> Result<Links> {
    let mut links = Links::new();
    let mut chars = value.chars().peekable();

    loop {
        skip_while(&mut chars, |c| c.is_whitespace() || c == ',');
        let Some(c) = chars.next() else {
            break;
        };
        if c != '<' {
            return Err(HypermediaError::HeaderParse(format!(
                "Invalid Link: expected '<', got '{}' in '{}'",
                c, value
            )));
        }

        let mut href = String::new();
        loop {
            match chars.next() {
                Some('>') => break,
                Some(c) => href.push(c),
                None => {
                    return Err(HypermediaError::HeaderParse(format!(
                        "Invalid Link: unterminated target in '{}'",
                        value
                    )))
                }
            }
        }

        let params = parse_params(&mut chars, ',');
        let mut link = Link::new(href);
        let mut rels = Vec::new();
        for (name, param) in params {
            match name.as_str() {
                "rel" => rels.extend(param.split_whitespace().map(str::to_string)),
                "templated" => link.templated = Some(param.eq_ignore_ascii_case("true")),
                "deprecation" => link.deprecation = Some(param),
                _ => {
                    link.extra.insert(name, Value::String(param));
                }
            }
        }

        for rel in rels {
            add_link(&mut links, rel, link.clone());
        }
    }

    Ok(links)
}

/// A parsed media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    /// Top-level type, lowercase (`application`)
    pub type_: String,
    /// Subtype, lowercase (`hal+json`)
    pub subtype: String,
    /// Parameters with lowercase names
    pub params: BTreeMap<String, String>,
}

impl MediaType {
    /// `type/subtype` without parameters.
    pub fn essence(&self) -> String {
        format!("{}/{}", self.type_, self.subtype)
    }

    /// Look up a parameter by (lowercase) name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Parse a `Content-Type` value.
///
/// # Errors
///
/// Returns [`HypermediaError::HeaderParse`] if there is no `type/subtype`.
pub fn parse_media_type(value: &str) -> Result<MediaType> {
    let (essence, rest) = match value.find(';') {
        Some(pos) => (&value[..pos], &value[pos..]),
        None => (value, ""),
    };

    let (type_, subtype) = essence
        .trim()
        .split_once('/')
        .filter(|(t, s)| !t.is_empty() && !s.is_empty())
        .ok_or_else(|| HypermediaError::HeaderParse(format!("Invalid media type: '{}'", value)))?;

    let mut chars = rest.chars().peekable();
    let params = parse_params(&mut chars, '\0').into_iter().collect();

    Ok(MediaType {
        type_: type_.trim().to_ascii_lowercase(),
        subtype: subtype.trim().to_ascii_lowercase(),
        params,
    })
}

// ========== Tokenizer ==========

fn skip_while(chars: &mut Peekable<Chars<'_>>, pred: impl Fn(char) -> bool) {
    while chars.peek().is_some_and(|&c| pred(c)) {
        chars.next();
    }
}

/// Parse `; name=value` pairs until `end` (consumed) or the input ends.
fn parse_params(chars: &mut Peekable<Chars<'_>>, end: char) -> Vec<(String, String)> {
    let mut params = Vec::new();

    loop {
        skip_while(chars, char::is_whitespace);
        if chars.next() != Some(';') {
            break;
        }

        skip_while(chars, char::is_whitespace);
        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if c == '=' || c == ';' || c == end || c.is_whitespace() {
                break;
            }
            name.push(c);
            chars.next();
        }
        skip_while(chars, char::is_whitespace);

        let mut value = String::new();
        if chars.peek() == Some(&'=') {
            chars.next();
            skip_while(chars, char::is_whitespace);
            if chars.peek() == Some(&'"') {
                chars.next();
                while let Some(c) = chars.next() {
                    match c {
                        '"' => break,
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                value.push(escaped);
                            }
                        }
                        c => value.push(c),
                    }
                }
            } else {
                while let Some(&c) = chars.peek() {
                    if c == ';' || c == end {
                        break;
                    }
                    value.push(c);
                    chars.next();
                }
                value = value.trim().to_string();
            }
        }

        if !name.is_empty() {
            params.push((name.to_ascii_lowercase(), value));
        }
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::OneOrMany;

    #[test]
    fn test_parse_single_link() {
        let links = parse_link_header(r#"<http://example.com/2>; rel="next""#).unwrap();
        assert_eq!(
            links.get("next"),
            Some(&OneOrMany::One(Link::new("http://example.com/2")))
        );
    }

    #[test]
    fn test_parse_multiple_links_same_rel() {
        let links = parse_link_header(
            r#"<http://example.com/a>; rel="item", <http://example.com/b>; rel="item""#,
        )
        .unwrap();
        let hrefs: Vec<&str> = links["item"].iter().map(|l| l.href.as_str()).collect();
        assert_eq!(hrefs, vec!["http://example.com/a", "http://example.com/b"]);
    }

    #[test]
    fn test_parse_multiple_rel_types() {
        let links = parse_link_header(r#"<http://example.com/p>; rel="profile describedby""#).unwrap();
        assert_eq!(links["profile"].first().unwrap().href, "http://example.com/p");
        assert_eq!(links["describedby"].first().unwrap().href, "http://example.com/p");
    }

    #[test]
    fn test_parse_quoted_comma_and_params() {
        let links = parse_link_header(
            r#"<http://example.com/{id}>; rel=search; title="Find, fast"; templated=true, <http://example.com/old>; rel="prev"; deprecation="http://example.com/dep""#,
        )
        .unwrap();
        let search = links["search"].first().unwrap();
        assert_eq!(search.templated, Some(true));
        assert_eq!(search.extra["title"], "Find, fast");
        let prev = links["prev"].first().unwrap();
        assert_eq!(prev.deprecation.as_deref(), Some("http://example.com/dep"));
    }

    #[test]
    fn test_parse_empty_link_header() {
        assert!(parse_link_header("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_invalid_link_header() {
        assert!(parse_link_header("http://example.com; rel=next").is_err());
        assert!(parse_link_header("<http://example.com; rel=next").is_err());
    }

    #[test]
    fn test_parse_media_type_with_profile() {
        let media_type =
            parse_media_type(r#"Application/JSON; profile="http://example.com/profile""#).unwrap();
        assert_eq!(media_type.type_, "application");
        assert_eq!(media_type.subtype, "json");
        assert_eq!(media_type.param("profile"), Some("http://example.com/profile"));
    }

    #[test]
    fn test_parse_media_type_unquoted_params() {
        let media_type = parse_media_type("text/plain; charset=utf-8; format=flowed").unwrap();
        assert_eq!(media_type.essence(), "text/plain");
        assert_eq!(media_type.param("charset"), Some("utf-8"));
        assert_eq!(media_type.param("format"), Some("flowed"));
    }

    #[test]
    fn test_parse_media_type_invalid() {
        assert!(parse_media_type("json").is_err());
        assert!(parse_media_type("").is_err());
    }
}

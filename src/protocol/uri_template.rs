//! URI Template expansion ([RFC 6570], levels 1 to 4).
//!
//! # Operators
//!
//! | Operator | Example | Expansion (`id = "a b"`, `list = ["x", "y"]`) |
//! |----------|---------|------------------------------------------------|
//! | none | `{id}` | `a%20b` |
//! | `+` | `{+id}` | `a%20b` (reserved characters kept) |
//! | `#` | `{#id}` | `#a%20b` |
//! | `.` | `{.list}` | `.x,y` |
//! | `/` | `{/list*}` | `/x/y` |
//! | `;` | `{;id}` | `;id=a%20b` |
//! | `?` | `{?id}` | `?id=a%20b` |
//! | `&` | `{&list*}` | `&list=x&list=y` |
//!
//! # Examples
//!
//! ```
//! use hypermedia_http::protocol::expand_uri_template;
//! use serde_json::json;
//!
//! let uri = expand_uri_template("http://example.com/orders/{id}{?page}", &json!({"id": 7, "page": 2})).unwrap();
//! assert_eq!(uri, "http://example.com/orders/7?page=2");
//! ```
//!
//! [RFC 6570]: https://datatracker.ietf.org/doc/html/rfc6570

use crate::error::{HypermediaError, Result};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static EXPRESSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]*)\}").expect("expression pattern is valid"));

const RESERVED: &str = ":/?#[]@!$&'()*+,;=";

struct Operator {
    first: &'static str,
    sep: &'static str,
    named: bool,
    if_empty: &'static str,
    allow_reserved: bool,
}

impl Operator {
    /// The operator for a leading character, and whether it was an operator.
    fn from_char(c: Option<char>) -> (Operator, bool) {
        let (first, sep, named, if_empty, allow_reserved) = match c {
            Some('+') => ("", ",", false, "", true),
            Some('#') => ("#", ",", false, "", true),
            Some('.') => (".", ".", false, "", false),
            Some('/') => ("/", "/", false, "", false),
            Some(';') => (";", ";", true, "", false),
            Some('?') => ("?", "&", true, "=", false),
            Some('&') => ("&", "&", true, "=", false),
            _ => return (Operator::simple(), false),
        };
        (
            Operator {
                first,
                sep,
                named,
                if_empty,
                allow_reserved,
            },
            true,
        )
    }

    fn simple() -> Operator {
        Operator {
            first: "",
            sep: ",",
            named: false,
            if_empty: "",
            allow_reserved: false,
        }
    }
}

struct VarSpec<'a> {
    name: &'a str,
    prefix: Option<usize>,
    explode: bool,
}

fn parse_varspec(spec: &str) -> Result<VarSpec<'_>> {
    let spec = spec.trim();
    let invalid = || HypermediaError::UriTemplate(format!("Invalid variable: '{}'", spec));

    if let Some(name) = spec.strip_suffix('*') {
        if name.is_empty() {
            return Err(invalid());
        }
        return Ok(VarSpec {
            name,
            prefix: None,
            explode: true,
        });
    }

    match spec.split_once(':') {
        Some((name, len)) => {
            let prefix = len.parse::<usize>().map_err(|_| invalid())?;
            if name.is_empty() {
                return Err(invalid());
            }
            Ok(VarSpec {
                name,
                prefix: Some(prefix),
                explode: false,
            })
        }
        None if spec.is_empty() => Err(invalid()),
        None => Ok(VarSpec {
            name: spec,
            prefix: None,
            explode: false,
        }),
    }
}

/// Expand every `{...}` expression of `template` with the members of `vars`.
///
/// Undefined and `null` variables expand to nothing.
///
/// # Errors
///
/// Returns [`HypermediaError::UriTemplate`] if `vars` is not an object or an
/// expression is malformed.
pub fn expand_uri_template(template: &str, vars: &Value) -> Result<String> {
    let Value::Object(vars) = vars else {
        return Err(HypermediaError::UriTemplate(
            "template variables must be an object".to_string(),
        ));
    };

    let mut result = String::with_capacity(template.len());
    let mut last = 0;
    for captures in EXPRESSION.captures_iter(template) {
        let (Some(whole), Some(body)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        result.push_str(&template[last..whole.start()]);
        result.push_str(&expand_expression(body.as_str(), vars)?);
        last = whole.end();
    }
    result.push_str(&template[last..]);

    Ok(result)
}

fn expand_expression(body: &str, vars: &serde_json::Map<String, Value>) -> Result<String> {
    let (op, has_operator) = Operator::from_char(body.chars().next());
    let list = if has_operator { &body[1..] } else { body };

    let mut out = String::new();
    let mut first = true;
    for spec in list.split(',') {
        let spec = parse_varspec(spec)?;
        let Some(expanded) = expand_var(&op, &spec, vars.get(spec.name)) else {
            continue;
        };
        out.push_str(if first { op.first } else { op.sep });
        out.push_str(&expanded);
        first = false;
    }

    Ok(out)
}

fn expand_var(op: &Operator, spec: &VarSpec<'_>, value: Option<&Value>) -> Option<String> {
    let enc = |s: &str| encode(s, op.allow_reserved);
    let named_pair = |name: &str, s: &str| {
        if s.is_empty() {
            format!("{}{}", name, op.if_empty)
        } else {
            format!("{}={}", name, s)
        }
    };

    match value? {
        Value::Null => None,
        Value::Array(items) if items.is_empty() => None,
        Value::Object(members) if members.is_empty() => None,
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(|v| enc(&scalar(v))).collect();
            if spec.explode {
                let parts: Vec<String> = if op.named {
                    items.iter().map(|item| named_pair(spec.name, item)).collect()
                } else {
                    items
                };
                Some(parts.join(op.sep))
            } else if op.named {
                Some(format!("{}={}", spec.name, items.join(",")))
            } else {
                Some(items.join(","))
            }
        }
        Value::Object(members) => {
            if spec.explode {
                let parts: Vec<String> = members
                    .iter()
                    .map(|(k, v)| format!("{}={}", enc(k), enc(&scalar(v))))
                    .collect();
                Some(parts.join(op.sep))
            } else {
                let parts: Vec<String> = members
                    .iter()
                    .flat_map(|(k, v)| [enc(k), enc(&scalar(v))])
                    .collect();
                if op.named {
                    Some(format!("{}={}", spec.name, parts.join(",")))
                } else {
                    Some(parts.join(","))
                }
            }
        }
        other => {
            let raw = scalar(other);
            let raw: String = match spec.prefix {
                Some(len) => raw.chars().take(len).collect(),
                None => raw,
            };
            let encoded = enc(&raw);
            if op.named {
                Some(named_pair(spec.name, &encoded))
            } else {
                Some(encoded)
            }
        }
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn encode(raw: &str, allow_reserved: bool) -> String {
    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        let c = b as char;
        let unreserved = b.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~');
        if unreserved || (allow_reserved && b.is_ascii() && RESERVED.contains(c)) {
            out.push(c);
        } else if allow_reserved
            && c == '%'
            && i + 2 < bytes.len()
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit()
        {
            out.push_str(&raw[i..i + 3]);
            i += 2;
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars() -> Value {
        json!({
            "var": "value",
            "hello": "Hello World!",
            "path": "/foo/bar",
            "empty": "",
            "list": ["red", "green", "blue"],
            "keys": {"comma": ",", "dot": ".", "semi": ";"},
            "x": 1024,
            "y": 768
        })
    }

    fn expand(template: &str) -> String {
        expand_uri_template(template, &vars()).unwrap()
    }

    #[test]
    fn test_simple_expansion() {
        assert_eq!(expand("{var}"), "value");
        assert_eq!(expand("{hello}"), "Hello%20World%21");
        assert_eq!(expand("http://example.com/{undef}"), "http://example.com/");
    }

    #[test]
    fn test_reserved_expansion() {
        assert_eq!(expand("{+path}/here"), "/foo/bar/here");
        assert_eq!(expand("{+hello}"), "Hello%20World!");
        assert_eq!(expand("{#path}"), "#/foo/bar");
    }

    #[test]
    fn test_multiple_variables() {
        assert_eq!(expand("map?{x,y}"), "map?1024,768");
        assert_eq!(expand("{?x,y,empty}"), "?x=1024&y=768&empty=");
        assert_eq!(expand("{;x,y,empty}"), ";x=1024;y=768;empty");
    }

    #[test]
    fn test_prefix_modifier() {
        assert_eq!(expand("{var:3}"), "val");
        assert_eq!(expand("{?var:3}"), "?var=val");
    }

    #[test]
    fn test_list_expansion() {
        assert_eq!(expand("{list}"), "red,green,blue");
        assert_eq!(expand("{list*}"), "red,green,blue");
        assert_eq!(expand("{/list*}"), "/red/green/blue");
        assert_eq!(expand("{.list}"), ".red,green,blue");
        assert_eq!(expand("{?list*}"), "?list=red&list=green&list=blue");
        assert_eq!(expand("{?list}"), "?list=red,green,blue");
    }

    #[test]
    fn test_object_expansion() {
        assert_eq!(expand("{keys}"), "comma,%2C,dot,.,semi,%3B");
        assert_eq!(expand("{?keys*}"), "?comma=%2C&dot=.&semi=%3B");
    }

    #[test]
    fn test_no_expressions() {
        assert_eq!(expand("http://example.com/plain"), "http://example.com/plain");
    }

    #[test]
    fn test_vars_must_be_object() {
        assert!(expand_uri_template("{id}", &json!(["id"])).is_err());
    }

    #[test]
    fn test_invalid_varspec() {
        assert!(expand_uri_template("{}", &json!({})).is_err());
        assert!(expand_uri_template("{id:x}", &json!({"id": "a"})).is_err());
    }
}

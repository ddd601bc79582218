//! JSON Merge Patch over `serde_json` values.

use serde_json::{Map, Value};

/// Apply `patch` to `target` following RFC 7386.
///
/// Returns the mutated target for chaining.
pub fn merge_patch<'a>(target: &'a mut Value, patch: &Value) -> &'a mut Value {
    let Value::Object(members) = patch else {
        *target = patch.clone();
        return target;
    };

    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(map) = target {
        merge_patch_map(map, members);
    }
    target
}

/// Apply the members of a patch object to a target object.
pub fn merge_patch_map<'a>(
    target: &'a mut Map<String, Value>,
    patch: &Map<String, Value>,
) -> &'a mut Map<String, Value> {
    for (key, value) in patch {
        if value.is_null() {
            target.shift_remove(key);
        } else {
            let slot = target.entry(key.clone()).or_insert(Value::Null);
            merge_patch(slot, value);
        }
    }
    target
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patched(target: Value, patch: Value) -> Value {
        let mut target = target;
        merge_patch(&mut target, &patch);
        target
    }

    #[test]
    fn test_null_removes_member() {
        assert_eq!(patched(json!({"a": 1, "b": 2}), json!({"a": null})), json!({"b": 2}));
    }

    #[test]
    fn test_nested_merge() {
        assert_eq!(
            patched(
                json!({"nested": {"x": 1, "y": 1, "z": 1}}),
                json!({"nested": {"x": null, "y": "v"}})
            ),
            json!({"nested": {"y": "v", "z": 1}})
        );
    }

    #[test]
    fn test_arrays_replace() {
        assert_eq!(
            patched(json!({"tags": ["a", "b"]}), json!({"tags": ["c"]})),
            json!({"tags": ["c"]})
        );
    }

    #[test]
    fn test_new_nested_structure_on_absent_member() {
        assert_eq!(
            patched(json!({}), json!({"address": {"city": "Utrecht", "zip": null}})),
            json!({"address": {"city": "Utrecht"}})
        );
    }

    #[test]
    fn test_object_patch_over_scalar() {
        assert_eq!(
            patched(json!({"a": "text"}), json!({"a": {"b": 1}})),
            json!({"a": {"b": 1}})
        );
    }

    #[test]
    fn test_non_object_patch_replaces_whole_target() {
        assert_eq!(patched(json!({"a": 1}), json!(["x"])), json!(["x"]));
    }

    #[test]
    fn test_rfc7386_appendix_example() {
        let target = json!({
            "title": "Goodbye!",
            "author": {"givenName": "John", "familyName": "Doe"},
            "tags": ["example", "sample"],
            "content": "This will be unchanged"
        });
        let patch = json!({
            "title": "Hello!",
            "phoneNumber": "+01-123-456-7890",
            "author": {"familyName": null},
            "tags": ["example"]
        });
        assert_eq!(
            patched(target, patch),
            json!({
                "title": "Hello!",
                "author": {"givenName": "John"},
                "tags": ["example"],
                "content": "This will be unchanged",
                "phoneNumber": "+01-123-456-7890"
            })
        );
    }
}

//! Deep merge of a persisted snapshot onto the default snapshot.
//!
//! Loading starts from a fresh clone of the default state and lays the
//! persisted document over it: wherever both sides hold an object the merge
//! recurses, anything else is overwritten by the persisted value. Fields
//! added to the schema after the user's last save therefore keep their
//! defaults, while all user data survives.

use serde_json::Value;

/// Merges `incoming` onto `base` in place.
///
/// Object-onto-object recurses; every other combination overwrites, arrays
/// included.
pub fn deep_merge(base: &mut Value, incoming: Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(incoming_map)) => {
            for (key, incoming_value) in incoming_map {
                match base_map.get_mut(&key) {
                    Some(base_value) => deep_merge(base_value, incoming_value),
                    None => {
                        base_map.insert(key, incoming_value);
                    }
                }
            }
        }
        (base_slot, incoming_value) => *base_slot = incoming_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn incoming_scalar_overwrites_default() {
        let mut base = json!({"a": 1, "b": 2});
        deep_merge(&mut base, json!({"a": 9}));
        assert_eq!(base, json!({"a": 9, "b": 2}));
    }

    #[test]
    fn default_only_fields_survive() {
        let mut base = json!({"session": {"user_name": "", "current_tab": "overview"}});
        deep_merge(&mut base, json!({"session": {"user_name": "dana"}}));
        assert_eq!(
            base,
            json!({"session": {"user_name": "dana", "current_tab": "overview"}})
        );
    }

    #[test]
    fn nested_objects_merge_recursively() {
        let mut base = json!({"outer": {"inner": {"kept": true, "replaced": 1}}});
        deep_merge(&mut base, json!({"outer": {"inner": {"replaced": 2}}}));
        assert_eq!(
            base,
            json!({"outer": {"inner": {"kept": true, "replaced": 2}}})
        );
    }

    #[test]
    fn arrays_overwrite_wholesale() {
        let mut base = json!({"teams": [{"id": 1}, {"id": 2}]});
        deep_merge(&mut base, json!({"teams": [{"id": 7}]}));
        assert_eq!(base, json!({"teams": [{"id": 7}]}));
    }

    #[test]
    fn unknown_incoming_keys_are_kept() {
        let mut base = json!({"a": 1});
        deep_merge(&mut base, json!({"legacy_field": "x"}));
        assert_eq!(base, json!({"a": 1, "legacy_field": "x"}));
    }

    #[test]
    fn object_over_scalar_overwrites() {
        let mut base = json!({"a": 1});
        deep_merge(&mut base, json!({"a": {"b": 2}}));
        assert_eq!(base, json!({"a": {"b": 2}}));
    }
}

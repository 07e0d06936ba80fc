//! The write pipeline: flatten, cast, merge.
//!
//! Pure value preparation for accessor writes. Given an accessor's default
//! payload and an assigned value, `prepare` produces the final value to
//! store: assigned leaves are cast against the type inferred from the
//! matching default leaf, then deep-merged over the defaults so a partial
//! update never drops sibling keys. Snapshot bookkeeping lives with the
//! record, not here.

use crate::flatten::leaves;
use crate::{CastKind, Path, Value};
use serde_json::Map;

/// Resolve the default value at `path`, degrading gracefully.
///
/// Walks `path` through `default`; if a segment is missing or the current
/// value is not a mapping, stops and returns the value found so far. Missing
/// defaults never raise.
pub(crate) fn default_at<'a>(default: &'a Value, path: &Path) -> &'a Value {
    let mut current = default;
    for key in path.iter() {
        match current.get(key) {
            Some(child) => current = child,
            None => break,
        }
    }
    current
}

/// Deep-merge `assigned` over `default`.
///
/// Sub-mappings merge recursively; assigned leaves win; default keys absent
/// from `assigned` survive.
pub(crate) fn deep_merge(default: &Value, assigned: &Value) -> Value {
    match (default, assigned) {
        (Value::Object(base), Value::Object(over)) => {
            let mut merged = base.clone();
            for (key, value) in over {
                let entry = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), entry);
            }
            Value::Object(merged)
        }
        (_, over) => over.clone(),
    }
}

/// Prepare the final value for a write scoped to an accessor whose default
/// is `default`.
///
/// Mapping input (or `null` against a container default, treated as the
/// empty mapping) goes through flatten → per-leaf cast → merge over
/// defaults. Scalar input is cast directly against the default's kind.
/// No input raises; cast failures degrade to the kind's fallback.
pub(crate) fn prepare(default: &Value, assigned: Value) -> Value {
    let mapping = match assigned {
        Value::Object(m) => m,
        Value::Null if default.is_object() => Map::new(),
        scalar => return CastKind::infer(default).cast(scalar),
    };

    let mut cast_leaves = Map::new();
    for (leaf_path, raw) in leaves(&mapping, None) {
        let default_leaf = default_at(default, &leaf_path);
        let kind = CastKind::infer(default_leaf);
        insert_at(&mut cast_leaves, &leaf_path, kind.cast(raw));
    }

    deep_merge(default, &Value::Object(cast_leaves))
}

/// Write `value` at `path` inside `mapping`, creating intermediate
/// sub-mappings as needed.
pub(crate) fn insert_at(mapping: &mut Map<String, Value>, path: &Path, value: Value) {
    let keys = path.keys();
    let Some((last, parents)) = keys.split_last() else {
        return;
    };
    let mut current = mapping;
    for key in parents {
        let entry = current
            .entry(key.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Value::Object(next) = entry else {
            return;
        };
        current = next;
    }
    current.insert(last.clone(), value);
}

/// Read the value at `path` inside `root`, if present.
pub(crate) fn value_at<'a>(root: &'a Value, path: &Path) -> Option<&'a Value> {
    let mut current = root;
    for key in path.iter() {
        current = current.get(key)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;
    use serde_json::json;

    #[test]
    fn test_default_at_walks() {
        let default = json!({"a": {"b": {"c": 1}}});
        assert_eq!(default_at(&default, &path!("a", "b", "c")), &json!(1));
        assert_eq!(default_at(&default, &path!("a", "b")), &json!({"c": 1}));
    }

    #[test]
    fn test_default_at_degrades_to_nearest_ancestor() {
        let default = json!({"a": {"b": 1}});
        // Missing segment stops the walk at the deepest value found.
        assert_eq!(default_at(&default, &path!("a", "missing")), &json!({"b": 1}));
        assert_eq!(default_at(&default, &path!("a", "b", "deeper")), &json!(1));
        assert_eq!(default_at(&default, &path!("nope")), &default);
    }

    #[test]
    fn test_deep_merge_recursive() {
        let default = json!({"a": {"x": 0, "y": 2}, "b": 3});
        let assigned = json!({"a": {"x": 1}});
        assert_eq!(deep_merge(&default, &assigned), json!({"a": {"x": 1, "y": 2}, "b": 3}));
    }

    #[test]
    fn test_deep_merge_assigned_wins_on_type_clash() {
        let default = json!({"a": {"x": 0}});
        let assigned = json!({"a": 5});
        assert_eq!(deep_merge(&default, &assigned), json!({"a": 5}));
    }

    #[test]
    fn test_prepare_partial_mapping() {
        let default = json!({"a": {"x": 0, "y": 2}, "b": 3});
        let result = prepare(&default, json!({"a": {"x": "1"}}));
        // "1" cast against integer default, siblings intact.
        assert_eq!(result, json!({"a": {"x": 1, "y": 2}, "b": 3}));
    }

    #[test]
    fn test_prepare_empty_mapping_yields_defaults() {
        let default = json!({"a": 1});
        assert_eq!(prepare(&default, json!({})), default);
        assert_eq!(prepare(&default, Value::Null), default);
    }

    #[test]
    fn test_prepare_scalar_against_scalar_default() {
        assert_eq!(prepare(&json!(true), json!("0")), json!(false));
        assert_eq!(prepare(&json!(0), json!("10")), json!(10));
        assert_eq!(prepare(&json!(0), Value::Null), Value::Null);
    }

    #[test]
    fn test_prepare_leaf_beyond_defaults_kept() {
        let default = json!({"known": 1});
        let result = prepare(&default, json!({"extra": {"deep": "v"}}));
        // No default leaf to infer from: nearest ancestor is the whole
        // mapping, an opaque text kind, so the value passes through.
        assert_eq!(result, json!({"known": 1, "extra": {"deep": "v"}}));
    }

    #[test]
    fn test_insert_at_creates_intermediates() {
        let mut m = Map::new();
        insert_at(&mut m, &path!("a", "b", "c"), json!(1));
        assert_eq!(Value::Object(m), json!({"a": {"b": {"c": 1}}}));
    }

    #[test]
    fn test_value_at() {
        let root = json!({"a": {"b": 2}});
        assert_eq!(value_at(&root, &path!("a", "b")), Some(&json!(2)));
        assert_eq!(value_at(&root, &path!("a", "x")), None);
        assert_eq!(value_at(&root, &path!()), Some(&root));
    }
}

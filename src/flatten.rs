//! Flattening nested mappings into leaf paths.
//!
//! `leaves` turns a nested mapping into `{path → leaf value}`; `expand`
//! rebuilds the nested form. Paths are unique by construction, so flattening
//! never collides.

use crate::Path;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Flatten a nested mapping into `{path → leaf value}`.
///
/// Every non-mapping value is a leaf. When `max_depth` is set, recursion
/// stops at that depth and deeper sub-mappings are recorded whole as leaf
/// values. An empty mapping produces an empty result at any depth.
///
/// # Examples
///
/// ```
/// use deepstore::{leaves, path};
/// use serde_json::json;
///
/// let m = json!({"a": {"x": 1, "y": 2}, "b": 3});
/// let flat = leaves(m.as_object().unwrap(), None);
///
/// assert_eq!(flat[&path!("a", "x")], json!(1));
/// assert_eq!(flat[&path!("b")], json!(3));
/// assert_eq!(flat.len(), 3);
/// ```
pub fn leaves(mapping: &Map<String, Value>, max_depth: Option<usize>) -> BTreeMap<Path, Value> {
    let mut out = BTreeMap::new();
    collect(mapping, Path::root(), 0, max_depth, &mut out);
    out
}

fn collect(
    mapping: &Map<String, Value>,
    prefix: Path,
    depth: usize,
    max_depth: Option<usize>,
    out: &mut BTreeMap<Path, Value>,
) {
    for (key, value) in mapping {
        let path = prefix.clone().key(key);
        match value {
            Value::Object(child) if max_depth.is_none_or(|max| depth < max) => {
                collect(child, path, depth + 1, max_depth, out);
            }
            other => {
                out.insert(path, other.clone());
            }
        }
    }
}

/// Rebuild a nested mapping from `{path → leaf value}`.
///
/// Inverse of [`leaves`]: intermediate mappings are created for every path
/// prefix. Root-level paths are not valid input and are skipped.
pub fn expand<'a>(flat: impl IntoIterator<Item = (&'a Path, &'a Value)>) -> Map<String, Value> {
    let mut root = Map::new();
    for (path, value) in flat {
        let keys = path.keys();
        let Some((last, parents)) = keys.split_last() else {
            continue;
        };
        let mut current = &mut root;
        for key in parents {
            let entry = current
                .entry(key.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            current = entry.as_object_mut().unwrap();
        }
        current.insert(last.clone(), value.clone());
    }
    root
}

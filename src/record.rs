//! Per-instance accessor runtime.
//!
//! A [`Record`] binds a [`Schema`] to one storage row: it owns the live
//! value of every declared root, answers reads at any declared path, runs
//! the write pipeline for sets, and tracks previous-vs-current values per
//! path in a single snapshot map that reload clears wholesale.

use crate::pipeline::{prepare, value_at};
use crate::schema::{NodeId, SchemaNode};
use crate::{Path, Schema, Storage, StoreError, StoreResult, Value};
use serde_json::Map;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// A record instance: live root values plus per-path change tracking.
///
/// State is instance-scoped and single-threaded; one record is mutated by
/// one logical caller at a time. Persistence goes through the [`Storage`]
/// collaborator: writes are in-memory until [`save`](Record::save) (or a
/// persisted reset), and [`reload`](Record::reload) is the only operation
/// that clears dirty state unconditionally.
///
/// # Examples
///
/// ```
/// use deepstore::{DeclareOptions, MemoryStore, Record, Schema};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// let mut host = MemoryStore::with_columns(["settings"]);
/// let mut schema = Schema::new();
/// schema
///     .declare(&mut host, "settings", json!({"flag": true}), DeclareOptions::default())
///     .unwrap();
///
/// let mut record = Record::load(Arc::new(schema), host).unwrap();
/// assert_eq!(record.get("flag_settings").unwrap(), json!(true));
///
/// record.set("flag_settings", json!("0")).unwrap();
/// assert_eq!(record.get("flag_settings").unwrap(), json!(false));
/// assert!(record.changed("flag_settings").unwrap());
/// ```
pub struct Record<S: Storage> {
    schema: Arc<Schema>,
    storage: S,
    /// Live value per root column; authoritative between saves.
    current: Map<String, Value>,
    /// Pre-write snapshot per node, populated by writes, cleared on reload.
    old: HashMap<NodeId, Value>,
}

impl<S: Storage> Record<S> {
    /// Load a record: read column values from storage, falling back to each
    /// root's default where the column holds nothing.
    pub fn load(schema: Arc<Schema>, storage: S) -> StoreResult<Self> {
        let columns = storage.read()?;
        let current = current_from_columns(&schema, columns);
        Ok(Self {
            schema,
            storage,
            current,
            old: HashMap::new(),
        })
    }

    /// The schema this record is bound to.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The storage collaborator.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Get the live current value at an accessor's path.
    ///
    /// The root accessor returns the whole stored mapping; container
    /// accessors return the sub-mapping; scalar accessors the leaf. A path
    /// absent from the current value falls back to its declared default —
    /// reads never fail for a declared accessor.
    pub fn get(&self, accessor: &str) -> StoreResult<Value> {
        let node = self.node(accessor)?;
        Ok(self.resolve(node, self.root_value(node)))
    }

    /// The default value fixed at declaration time for an accessor.
    pub fn default_of(&self, accessor: &str) -> StoreResult<&Value> {
        Ok(&self.node(accessor)?.default)
    }

    /// Assign a value through an accessor (the write pipeline).
    ///
    /// Mapping input is flattened, cast leaf-by-leaf against the inferred
    /// default types, and deep-merged over the accessor's defaults; scalar
    /// input is cast directly. Before the write lands, pre-write snapshots
    /// are recorded for the accessor itself and every ancestor and
    /// descendant path, so change tracking at any level of nesting compares
    /// against the value immediately before this write. In-memory only; no
    /// persistence call.
    pub fn set(&mut self, accessor: &str, value: Value) -> StoreResult<()> {
        let node = self.node(accessor)?.clone();
        let final_value = prepare(&node.default, value);

        let pre_root = self.root_value(&node).clone();
        self.snapshot_lineage(&node, &pre_root);

        let new_root = if node.path.is_empty() {
            final_value
        } else {
            let mut root = pre_root;
            write_at(&mut root, &node.path, final_value);
            root
        };
        trace!(accessor = %node.accessor, column = %node.column, "nested store write");
        self.current.insert(node.column.clone(), new_root);
        Ok(())
    }

    /// Reset an accessor to its default, in memory only.
    pub fn reset(&mut self, accessor: &str) -> StoreResult<()> {
        let default = self.node(accessor)?.default.clone();
        self.set(accessor, default)
    }

    /// Reset an accessor to its default and persist the owning column
    /// immediately through the storage collaborator.
    pub fn reset_persisted(&mut self, accessor: &str) -> StoreResult<()> {
        self.reset(accessor)?;
        let column = self.node(accessor)?.column.clone();
        let mut attrs = Map::new();
        attrs.insert(column.clone(), self.current[&column].clone());
        self.storage.update(attrs)
    }

    /// Persist the current value of every declared root column.
    pub fn save(&mut self) -> StoreResult<()> {
        let mut attrs = Map::new();
        for root in self.schema.root_nodes() {
            attrs.insert(root.column.clone(), self.current[&root.column].clone());
        }
        self.storage.update(attrs)
    }

    /// The snapshot value for an accessor: what it held immediately before
    /// the most recent unsaved write touching its path, or the current
    /// value if no such write happened.
    pub fn was(&self, accessor: &str) -> StoreResult<Value> {
        let node = self.node(accessor)?;
        Ok(match self.old.get(&node.id) {
            Some(snapshot) => snapshot.clone(),
            None => self.resolve(node, self.root_value(node)),
        })
    }

    /// The `(old, current)` pair for an accessor, or `None` when unchanged.
    pub fn changes(&self, accessor: &str) -> StoreResult<Option<(Value, Value)>> {
        let old = self.was(accessor)?;
        let current = self.get(accessor)?;
        Ok((old != current).then_some((old, current)))
    }

    /// Whether an accessor's value differs from its snapshot.
    pub fn changed(&self, accessor: &str) -> StoreResult<bool> {
        Ok(self.changes(accessor)?.is_some())
    }

    /// Whether any declared accessor currently differs from its snapshot.
    pub fn changed_any(&self) -> bool {
        self.old.iter().any(|(&id, old)| {
            let node = self.schema.node_by_id(id);
            self.resolve(node, self.root_value(node)) != *old
        })
    }

    /// Reload column values from storage and resynchronize all snapshots.
    ///
    /// The only operation that discards pending change history: afterwards
    /// every accessor reads as unchanged.
    pub fn reload(&mut self) -> StoreResult<()> {
        let columns = self.storage.read()?;
        self.current = current_from_columns(&self.schema, columns);
        self.old.clear();
        debug!(roots = self.schema.root_nodes().count(), "record reloaded");
        Ok(())
    }

    fn node(&self, accessor: &str) -> StoreResult<&SchemaNode> {
        self.schema
            .node(accessor)
            .ok_or_else(|| StoreError::unknown_accessor(accessor))
    }

    fn root_value(&self, node: &SchemaNode) -> &Value {
        self.current.get(&node.column).unwrap_or(&Value::Null)
    }

    /// Resolve a node's value within a root tree, falling back to the
    /// node's default when the path is absent or cut off by a non-mapping.
    fn resolve(&self, node: &SchemaNode, root: &Value) -> Value {
        value_at(root, &node.path)
            .cloned()
            .unwrap_or_else(|| node.default.clone())
    }

    /// Record pre-write snapshots for `node` plus every ancestor and
    /// descendant path in the same root. Siblings keep their snapshots (or
    /// lack thereof) untouched. Later writes overwrite: "old" is always the
    /// value before the most recent write.
    fn snapshot_lineage(&mut self, node: &SchemaNode, pre_root: &Value) {
        let snapshots: Vec<(NodeId, Value)> = self
            .schema
            .nodes()
            .filter(|m| m.column == node.column)
            .filter(|m| m.path.is_prefix_of(&node.path) || node.path.is_prefix_of(&m.path))
            .map(|m| (m.id, self.resolve(m, pre_root)))
            .collect();
        self.old.extend(snapshots);
    }
}

impl<S: Storage + std::fmt::Debug> std::fmt::Debug for Record<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record")
            .field("storage", &self.storage)
            .field("current", &self.current)
            .field("dirty_paths", &self.old.len())
            .finish()
    }
}

fn current_from_columns(schema: &Schema, mut columns: Map<String, Value>) -> Map<String, Value> {
    let mut current = Map::new();
    for root in schema.root_nodes() {
        let value = match columns.remove(&root.column) {
            Some(Value::Null) | None => root.default.clone(),
            Some(value) => value,
        };
        current.insert(root.column.clone(), value);
    }
    current
}

/// Write `value` at `path` inside `root`, replacing non-mapping
/// intermediates with mappings as needed.
fn write_at(root: &mut Value, path: &Path, value: Value) {
    if !root.is_object() {
        *root = Value::Object(Map::new());
    }
    if let Value::Object(mapping) = root {
        crate::pipeline::insert_at(mapping, path, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DeclareOptions, MemoryStore};
    use serde_json::json;

    fn make_record(default: Value) -> Record<MemoryStore> {
        let mut host = MemoryStore::with_columns(["settings"]);
        let mut schema = Schema::new();
        schema
            .declare(&mut host, "settings", default, DeclareOptions::default())
            .unwrap();
        Record::load(Arc::new(schema), host).unwrap()
    }

    #[test]
    fn test_fresh_record_reads_defaults() {
        let record = make_record(json!({"a": {"x": 1}, "b": "s"}));
        assert_eq!(record.get("settings").unwrap(), json!({"a": {"x": 1}, "b": "s"}));
        assert_eq!(record.get("a_settings").unwrap(), json!({"x": 1}));
        assert_eq!(record.get("x_a_settings").unwrap(), json!(1));
        assert!(!record.changed_any());
    }

    #[test]
    fn test_unknown_accessor() {
        let record = make_record(json!({"a": 1}));
        let err = record.get("missing").unwrap_err();
        assert!(matches!(err, StoreError::UnknownAccessor { .. }));
    }

    #[test]
    fn test_set_leaf_updates_all_levels() {
        let mut record = make_record(json!({"a": {"x": 1}}));
        record.set("x_a_settings", json!(5)).unwrap();

        assert_eq!(record.get("x_a_settings").unwrap(), json!(5));
        assert_eq!(record.get("a_settings").unwrap(), json!({"x": 5}));
        assert_eq!(record.get("settings").unwrap(), json!({"a": {"x": 5}}));
    }

    #[test]
    fn test_default_of_is_stable_across_writes() {
        let mut record = make_record(json!({"a": 1}));
        record.set("a_settings", json!(9)).unwrap();
        assert_eq!(record.default_of("a_settings").unwrap(), &json!(1));
        assert_eq!(record.default_of("settings").unwrap(), &json!({"a": 1}));
    }

    #[test]
    fn test_was_without_writes_equals_current() {
        let record = make_record(json!({"a": 1}));
        assert_eq!(record.was("a_settings").unwrap(), json!(1));
        assert_eq!(record.changes("a_settings").unwrap(), None);
    }

    #[test]
    fn test_sibling_not_marked_changed() {
        let mut record = make_record(json!({"a": {"x": 1, "y": 2}, "b": 3}));
        record.set("x_a_settings", json!(9)).unwrap();

        assert!(record.changed("x_a_settings").unwrap());
        assert!(record.changed("a_settings").unwrap());
        assert!(record.changed("settings").unwrap());
        assert!(!record.changed("y_a_settings").unwrap());
        assert!(!record.changed("b_settings").unwrap());
    }

    #[test]
    fn test_overwrite_snapshot_on_repeated_writes() {
        let mut record = make_record(json!({"a": 1}));
        record.set("a_settings", json!(2)).unwrap();
        assert_eq!(record.was("a_settings").unwrap(), json!(1));

        record.set("a_settings", json!(3)).unwrap();
        // Old is the value before the most recent write, not the original.
        assert_eq!(record.was("a_settings").unwrap(), json!(2));
        assert_eq!(record.changes("a_settings").unwrap(), Some((json!(2), json!(3))));
    }

    #[test]
    fn test_container_write_snapshots_descendants() {
        let mut record = make_record(json!({"a": {"x": 1, "y": 2}}));
        record.set("a_settings", json!({"x": 7})).unwrap();

        assert_eq!(record.get("a_settings").unwrap(), json!({"x": 7, "y": 2}));
        assert_eq!(record.was("x_a_settings").unwrap(), json!(1));
        assert_eq!(record.changes("x_a_settings").unwrap(), Some((json!(1), json!(7))));
        // y's value is unchanged even though its snapshot was recorded.
        assert!(!record.changed("y_a_settings").unwrap());
    }

    #[test]
    fn test_set_then_set_back_reads_unchanged() {
        let mut record = make_record(json!({"a": 1}));
        record.set("a_settings", json!(2)).unwrap();
        record.set("a_settings", json!(2)).unwrap();
        // Snapshot now holds the pre-second-write value, which equals current.
        assert!(!record.changed("a_settings").unwrap());
    }

    #[test]
    fn test_save_persists_current() {
        let mut record = make_record(json!({"a": 1}));
        record.set("a_settings", json!(5)).unwrap();
        assert_eq!(record.storage().column("settings"), Some(&Value::Null));

        record.save().unwrap();
        assert_eq!(record.storage().column("settings"), Some(&json!({"a": 5})));
    }

    #[test]
    fn test_reload_restores_and_clears_dirty() {
        let mut record = make_record(json!({"a": 1}));
        record.set("a_settings", json!(5)).unwrap();
        assert!(record.changed_any());

        record.reload().unwrap();
        assert_eq!(record.get("a_settings").unwrap(), json!(1));
        assert!(!record.changed("a_settings").unwrap());
        assert!(!record.changed_any());
    }

    #[test]
    fn test_scalar_root() {
        let mut host = MemoryStore::with_columns(["count"]);
        let mut schema = Schema::new();
        schema
            .declare(&mut host, "count", json!(0), DeclareOptions::default())
            .unwrap();
        let mut record = Record::load(Arc::new(schema), host).unwrap();

        record.set("count", json!("12")).unwrap();
        assert_eq!(record.get("count").unwrap(), json!(12));
        assert_eq!(record.changes("count").unwrap(), Some((json!(0), json!(12))));
    }

    #[test]
    fn test_loads_persisted_value_over_default() {
        let mut host = MemoryStore::with_columns(["settings"]);
        host.insert_column("settings", json!({"a": 99}));
        let mut schema = Schema::new();
        schema
            .declare(&mut host, "settings", json!({"a": 1}), DeclareOptions::default())
            .unwrap();

        let record = Record::load(Arc::new(schema), host).unwrap();
        assert_eq!(record.get("a_settings").unwrap(), json!(99));
    }
}

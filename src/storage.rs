//! Persistence collaborator traits and the in-memory reference store.
//!
//! The core never talks to a database directly. Declaration-time checks go
//! through [`Host`]; per-instance persistence goes through [`Storage`]. The
//! stored representation of a root is a single serialized mapping under its
//! column name; the wire format is the collaborator's concern.

use crate::{CastKind, StoreResult};
use serde_json::{Map, Value};

/// Declaration-time view of the host type.
///
/// The schema builder consults this once per declared root: to verify the
/// backing column exists, and to hand over `(accessor, kind)` pairs so scalar
/// accessors also get host-level coercion.
pub trait Host {
    /// Whether a backing storage column with this name exists.
    fn has_column(&self, name: &str) -> bool;

    /// Register a typed attribute for a scalar accessor.
    fn register_attribute(&mut self, name: &str, kind: CastKind);
}

/// Instance-time persistence operations.
///
/// `update` is the atomic unit the core calls for persisted resets and
/// saves; `read` backs initial load and reload.
pub trait Storage {
    /// Read all column values for this instance.
    fn read(&self) -> StoreResult<Map<String, Value>>;

    /// Persist one or more column values atomically.
    fn update(&mut self, attrs: Map<String, Value>) -> StoreResult<()>;
}

/// An in-memory [`Host`] + [`Storage`] implementation.
///
/// Backs the test suite and serves as the reference collaborator; real
/// backends implement the same two traits over an actual row.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    columns: Map<String, Value>,
    attributes: Vec<(String, CastKind)>,
}

impl MemoryStore {
    /// Create a store with no columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with the given columns, each initially `null`.
    pub fn with_columns<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = names.into_iter().map(|n| (n.into(), Value::Null)).collect();
        Self {
            columns,
            attributes: Vec::new(),
        }
    }

    /// Add a column with an initial value.
    pub fn insert_column(&mut self, name: impl Into<String>, value: Value) {
        self.columns.insert(name.into(), value);
    }

    /// The current persisted value of a column, if the column exists.
    pub fn column(&self, name: &str) -> Option<&Value> {
        self.columns.get(name)
    }

    /// Typed attributes registered during declaration.
    pub fn attributes(&self) -> &[(String, CastKind)] {
        &self.attributes
    }
}

impl Host for MemoryStore {
    fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    fn register_attribute(&mut self, name: &str, kind: CastKind) {
        self.attributes.push((name.to_owned(), kind));
    }
}

impl Storage for MemoryStore {
    fn read(&self) -> StoreResult<Map<String, Value>> {
        Ok(self.columns.clone())
    }

    fn update(&mut self, attrs: Map<String, Value>) -> StoreResult<()> {
        for (name, value) in attrs {
            self.columns.insert(name, value);
        }
        Ok(())
    }
}

//! Schema derivation from default payloads.
//!
//! `Schema::declare` walks a default nested mapping depth-first and registers
//! one node per path: the root, every intermediate sub-mapping, and every
//! leaf. Nodes live in an arena and are looked up by accessor identifier;
//! they are created once and never mutated afterwards.

use crate::naming::{deep_accessor_name, normalize_name};
use crate::{CastKind, Host, Path, StoreError, StoreResult};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Identifier of a node within a [`Schema`] arena.
pub type NodeId = usize;

/// Whether a node's default value is a sub-mapping or a leaf.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// The default value at this path is a mapping.
    Container,
    /// The default value at this path is a leaf of the given cast kind.
    Scalar(CastKind),
}

impl NodeKind {
    /// True for container nodes.
    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(self, NodeKind::Container)
    }

    /// The cast kind, for scalar nodes.
    #[inline]
    pub fn cast_kind(&self) -> Option<CastKind> {
        match self {
            NodeKind::Container => None,
            NodeKind::Scalar(kind) => Some(*kind),
        }
    }
}

/// Declaration-time descriptor for one path in a declared root.
#[derive(Clone, Debug)]
pub struct SchemaNode {
    /// Arena id of this node.
    pub id: NodeId,
    /// Backing column of the root this node belongs to.
    pub column: String,
    /// Path from the root's value to this node; empty for the root itself.
    pub path: Path,
    /// Derived accessor identifier, unique per schema.
    pub accessor: String,
    /// Container or scalar, fixed by the default payload.
    pub kind: NodeKind,
    /// Default value for this path, fixed at declaration time.
    pub default: Value,
    /// Arena ids of direct children (empty for scalars).
    pub children: Vec<NodeId>,
}

/// Options for [`Schema::declare`].
#[derive(Clone, Copy, Debug)]
pub struct DeclareOptions {
    /// Suffix derived accessors with the parent identifier
    /// (`push_notifications_settings`). On by default.
    pub suffix: bool,
    /// Require a backing column named after the root. On by default;
    /// nested roots never require their own column.
    pub column_required: bool,
}

impl Default for DeclareOptions {
    fn default() -> Self {
        Self {
            suffix: true,
            column_required: true,
        }
    }
}

/// The accessor schema for one host type.
///
/// Built once per declared root and stable for the lifetime of the host
/// type; records hold it behind an `Arc`.
///
/// # Examples
///
/// ```
/// use deepstore::{DeclareOptions, MemoryStore, Schema};
/// use serde_json::json;
///
/// let mut host = MemoryStore::with_columns(["settings"]);
/// let mut schema = Schema::new();
/// schema
///     .declare(&mut host, "settings", json!({"notifications": {"push": true}}), DeclareOptions::default())
///     .unwrap();
///
/// let node = schema.node("push_notifications_settings").unwrap();
/// assert_eq!(node.path.to_string(), "$.notifications.push");
/// ```
#[derive(Clone, Debug, Default)]
pub struct Schema {
    nodes: Vec<SchemaNode>,
    by_accessor: HashMap<String, NodeId>,
    roots: Vec<NodeId>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a root accessor backed by `default_payload`.
    ///
    /// Fails with [`StoreError::DuplicateDeclaration`] if the root (or any
    /// derived accessor identifier) is already registered, and with
    /// [`StoreError::MissingColumn`] if `column_required` is set and the
    /// host has no column named after the root. On failure the schema is
    /// left untouched and nothing is registered with the host.
    pub fn declare(
        &mut self,
        host: &mut dyn Host,
        root_name: &str,
        default_payload: Value,
        options: DeclareOptions,
    ) -> StoreResult<()> {
        let root = normalize_name(root_name);

        if self.by_accessor.contains_key(&root) {
            return Err(StoreError::duplicate_declaration(root));
        }
        if options.column_required && !host.has_column(&root) {
            return Err(StoreError::missing_column(root));
        }

        // Stage into a scratch arena so a mid-recursion collision leaves
        // the schema as it was.
        let mut staged = Staged {
            nodes: Vec::new(),
            accessors: Vec::new(),
            next_id: self.nodes.len(),
        };
        let root_id = staged.build(
            self,
            &root,
            root.clone(),
            Path::root(),
            default_payload,
            options.suffix,
        )?;

        for node in &staged.nodes {
            if let NodeKind::Scalar(kind) = node.kind {
                host.register_attribute(&node.accessor, kind);
            }
        }

        debug!(
            root = %root,
            nodes = staged.nodes.len(),
            "declared nested store root"
        );

        for node in &staged.nodes {
            self.by_accessor.insert(node.accessor.clone(), node.id);
        }
        self.nodes.extend(staged.nodes);
        self.roots.push(root_id);
        Ok(())
    }

    /// Look up a node by accessor identifier.
    pub fn node(&self, accessor: &str) -> Option<&SchemaNode> {
        self.by_accessor.get(accessor).map(|&id| &self.nodes[id])
    }

    /// Look up a node by arena id.
    pub fn node_by_id(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id]
    }

    /// Iterate over all nodes, roots first within each declaration.
    pub fn nodes(&self) -> impl Iterator<Item = &SchemaNode> {
        self.nodes.iter()
    }

    /// Iterate over the declared root nodes.
    pub fn root_nodes(&self) -> impl Iterator<Item = &SchemaNode> {
        self.roots.iter().map(|&id| &self.nodes[id])
    }

    /// All registered accessor identifiers.
    pub fn accessors(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.accessor.as_str())
    }

    /// Total number of nodes across all declared roots.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no root has been declared yet.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

struct Staged {
    nodes: Vec<SchemaNode>,
    accessors: Vec<String>,
    next_id: NodeId,
}

impl Staged {
    /// Depth-first node construction. Each distinct path yields exactly one
    /// node and one accessor identifier; recursion depth is unbounded.
    fn build(
        &mut self,
        schema: &Schema,
        column: &str,
        accessor: String,
        path: Path,
        default: Value,
        suffix: bool,
    ) -> StoreResult<NodeId> {
        if schema.by_accessor.contains_key(&accessor) || self.accessors.contains(&accessor) {
            return Err(StoreError::duplicate_declaration(accessor));
        }

        let id = self.next_id;
        self.next_id += 1;
        self.accessors.push(accessor.clone());

        let kind = match &default {
            Value::Object(_) => NodeKind::Container,
            leaf => NodeKind::Scalar(CastKind::infer(leaf)),
        };

        // Reserve the slot before recursing so children land after parents.
        self.nodes.push(SchemaNode {
            id,
            column: column.to_owned(),
            path: path.clone(),
            accessor: accessor.clone(),
            kind,
            default: default.clone(),
            children: Vec::new(),
        });
        let slot = self.nodes.len() - 1;

        if let Value::Object(mapping) = default {
            let mut children = Vec::with_capacity(mapping.len());
            for (key, value) in mapping {
                let child_accessor = deep_accessor_name(&accessor, &key, suffix);
                let child_path = path.clone().key(&key);
                let child_id =
                    self.build(schema, column, child_accessor, child_path, value, suffix)?;
                children.push(child_id);
            }
            self.nodes[slot].children = children;
        }

        Ok(id)
    }
}

//! Nested store accessors with typed coercion and per-path change tracking.
//!
//! `deepstore` lets a persisted record expose a deeply nested mapping (a
//! settings tree, say) through one accessor per path, while the whole tree
//! is stored as a single serialized column. A default payload declared once
//! per root fixes both the shape of the accessor schema and the scalar type
//! of every leaf; writes through any accessor are coerced against those
//! types, merged over the defaults, and tracked previous-vs-current at
//! every level of nesting.
//!
//! # Core concepts
//!
//! - **[`Schema`]**: one node per path, derived from a default payload at
//!   declaration time
//! - **[`Record`]**: per-instance live values plus the snapshot map behind
//!   `was`/`changes`/`changed`
//! - **[`CastKind`]**: the scalar kind inferred per leaf and its coercion
//! - **[`Host`] / [`Storage`]**: the narrow seam to the persistence layer
//! - **[`leaves`] / [`expand`]**: flattening between nested mappings and
//!   `{path → leaf}` form
//!
//! # Quick start
//!
//! ```
//! use deepstore::{DeclareOptions, MemoryStore, Record, Schema};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let mut host = MemoryStore::with_columns(["settings"]);
//! let mut schema = Schema::new();
//! schema.declare(
//!     &mut host,
//!     "settings",
//!     json!({
//!         "notifications": {"email": false, "push": true},
//!         "usage_count": 42
//!     }),
//!     DeclareOptions::default(),
//! ).unwrap();
//!
//! let mut record = Record::load(Arc::new(schema), host).unwrap();
//!
//! // One accessor per path, values coerced against the default's type.
//! record.set("push_notifications_settings", json!("0")).unwrap();
//! assert_eq!(record.get("push_notifications_settings").unwrap(), json!(false));
//!
//! // Change tracking at every level of nesting.
//! assert!(record.changed("settings").unwrap());
//! assert!(record.changed("notifications_settings").unwrap());
//! assert!(!record.changed("usage_count_settings").unwrap());
//!
//! // Reload resynchronizes snapshots; nothing is dirty afterwards.
//! record.reload().unwrap();
//! assert!(!record.changed("settings").unwrap());
//! ```

mod cast;
mod error;
mod flatten;
mod naming;
mod path;
mod pipeline;
mod record;
mod schema;
mod storage;

pub use cast::CastKind;
pub use error::{StoreError, StoreResult};
pub use flatten::{expand, leaves};
pub use naming::{deep_accessor_name, normalize_name};
pub use path::Path;
pub use record::Record;
pub use schema::{DeclareOptions, NodeId, NodeKind, Schema, SchemaNode};
pub use storage::{Host, MemoryStore, Storage};

// Re-export serde_json::Value for convenience
pub use serde_json::Value;

//! Error types for deepstore operations.

use thiserror::Error;

/// Result type alias for deepstore operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during schema declaration or record access.
///
/// Declaration-time errors abort schema setup entirely; no partial schema is
/// left registered. Cast failures are not errors — they degrade to the kind's
/// documented fallback inside the write pipeline.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A root or derived accessor identifier was declared twice on one schema.
    #[error("duplicate declaration: accessor `{accessor}` is already registered")]
    DuplicateDeclaration {
        /// The colliding accessor identifier.
        accessor: String,
    },

    /// A root required a backing column that the host does not have.
    #[error("missing column: no backing column `{column}` on host")]
    MissingColumn {
        /// The expected column name.
        column: String,
    },

    /// An accessor name that the schema never declared.
    #[error("unknown accessor: `{accessor}`")]
    UnknownAccessor {
        /// The unrecognized accessor identifier.
        accessor: String,
    },

    /// The storage collaborator failed to persist or load.
    #[error("storage error: {message}")]
    Storage {
        /// Description of what went wrong.
        message: String,
    },

    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Create a duplicate declaration error.
    #[inline]
    pub fn duplicate_declaration(accessor: impl Into<String>) -> Self {
        StoreError::DuplicateDeclaration {
            accessor: accessor.into(),
        }
    }

    /// Create a missing column error.
    #[inline]
    pub fn missing_column(column: impl Into<String>) -> Self {
        StoreError::MissingColumn {
            column: column.into(),
        }
    }

    /// Create an unknown accessor error.
    #[inline]
    pub fn unknown_accessor(accessor: impl Into<String>) -> Self {
        StoreError::UnknownAccessor {
            accessor: accessor.into(),
        }
    }

    /// Create a storage error.
    #[inline]
    pub fn storage(message: impl Into<String>) -> Self {
        StoreError::Storage {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::duplicate_declaration("settings");
        assert!(err.to_string().contains("duplicate declaration"));
        assert!(err.to_string().contains("settings"));

        let err = StoreError::missing_column("prefs");
        assert!(err.to_string().contains("missing column"));

        let err = StoreError::unknown_accessor("nope");
        assert!(err.to_string().contains("unknown accessor"));
    }
}

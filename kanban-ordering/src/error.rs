//! Error types for the ordering engine

use thiserror::Error;

/// Result type for ordering operations
pub type Result<T> = std::result::Result<T, OrderingError>;

/// Errors that can occur while reordering items
#[derive(Debug, Error)]
pub enum OrderingError {
    /// Item not found
    #[error("item not found: {id}")]
    ItemNotFound { id: String },

    /// Container not found
    #[error("container not found: {id}")]
    ContainerNotFound { id: String },

    /// Requested position is outside the valid range for the target container
    #[error("position {position} out of range (valid: 0..={max})")]
    OutOfRange { position: i64, max: usize },

    /// Stored positions of a container are not a dense `0..n` sequence
    #[error("container '{container}' has torn ordering: {detail}")]
    Torn { container: String, detail: String },

    /// Stored state no longer matches what the caller (or the plan) expected
    #[error("conflict on item '{item}': expected position {expected}, found {actual}")]
    Conflict {
        item: String,
        expected: usize,
        actual: usize,
    },

    /// Item kind is not accepted by the target container
    #[error("{container_kind} '{container}' cannot hold a {item_kind}")]
    KindMismatch {
        container: String,
        container_kind: String,
        item_kind: String,
    },

    /// Duplicate ID
    #[error("duplicate {item_type} ID: {id}")]
    DuplicateId { item_type: String, id: String },

    /// Invalid field value
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// Item kept changing container while its locks were being taken
    #[error("item '{item}' changed container {attempts} times while locking")]
    Unsettled { item: String, attempts: usize },

    /// Container lock was not acquired in time
    #[error("lock timeout after {elapsed_ms}ms")]
    LockTimeout { elapsed_ms: u64 },

    /// SQLite error
    #[error("storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OrderingError {
    /// Create an item not found error
    pub fn item_not_found(id: impl ToString) -> Self {
        Self::ItemNotFound { id: id.to_string() }
    }

    /// Create a container not found error
    pub fn container_not_found(id: impl ToString) -> Self {
        Self::ContainerNotFound { id: id.to_string() }
    }

    /// Create a torn ordering error
    pub fn torn(container: impl ToString, detail: impl Into<String>) -> Self {
        Self::Torn {
            container: container.to_string(),
            detail: detail.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a duplicate ID error
    pub fn duplicate_id(item_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::DuplicateId {
            item_type: item_type.into(),
            id: id.into(),
        }
    }

    /// Check if this is a retryable error
    ///
    /// A retry re-reads the container, so a stale view or a busy lock may succeed next time.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::LockTimeout { .. } | Self::Conflict { .. } | Self::Unsettled { .. }
        )
    }

    /// Whether the error names something that does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ItemNotFound { .. } | Self::ContainerNotFound { .. }
        )
    }
}

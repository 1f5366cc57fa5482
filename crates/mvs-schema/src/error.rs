//! Error types for schema resolution.

use thiserror::Error;

/// Errors that can occur while resolving a schema document.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The identifier cannot name a schema file.
    #[error("invalid schema id: {id:?}")]
    InvalidId { id: String },

    /// The schema document exists but is not valid JSON.
    #[error("malformed schema {id}: {reason}")]
    Malformed { id: String, reason: String },

    /// A resolver lock was poisoned.
    #[error("lock poisoned: {0}")]
    Lock(String),

    /// I/O error while reading a schema file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for schema operations.
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

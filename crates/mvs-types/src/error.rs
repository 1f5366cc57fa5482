use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid store name {name:?}: {reason}")]
    InvalidStoreName { name: String, reason: String },

    #[error("invalid mapping for {target}: {reason}")]
    InvalidMapping { target: String, reason: String },

    #[error("unknown storage mode: {0}")]
    UnknownStorageMode(String),

    #[error("configuration error: {0}")]
    Config(String),
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("invalid storage key: {key:?}")]
    InvalidKey { key: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("remote returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("runtime error: {0}")]
    Runtime(String),

    #[error("lock poisoned: {0}")]
    Lock(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PersistResult<T> = Result<T, PersistError>;

use mvs_expr::ExprError;
use mvs_types::TypeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid declaration: {0}")]
    Types(#[from] TypeError),

    #[error("expression error: {0}")]
    Expression(#[from] ExprError),

    #[error("store {name} is detached from its tree")]
    Detached { name: String },

    #[error("state at {path:?} is not an object")]
    NotAnObject { path: String },

    #[error("state at {key:?} is not a collection")]
    NotACollection { key: String },

    #[error("invalid state path: {0:?}")]
    InvalidPath(String),

    #[error("{0} is already borrowed")]
    Busy(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

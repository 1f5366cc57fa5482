use thiserror::Error;

/// Errors from compiling or evaluating an expression.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExprError {
    #[error("unexpected character {ch:?} at {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unterminated {what} starting at {pos}")]
    Unterminated { what: &'static str, pos: usize },

    #[error("invalid number literal {text:?} at {pos}")]
    InvalidNumber { text: String, pos: usize },

    #[error("parse error at {pos}: {reason}")]
    Parse { pos: usize, reason: String },

    #[error("unknown function: ${0}")]
    UnknownFunction(String),

    #[error("function ${function} expects {expected} argument(s), got {got}")]
    Arity {
        function: String,
        expected: String,
        got: usize,
    },

    #[error("type error: {0}")]
    Type(String),
}

/// Result alias for expression operations.
pub type ExprResult<T> = Result<T, ExprError>;

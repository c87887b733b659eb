use thiserror::Error;

/// Errors raised when model values are constructed from untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("configuration key cannot be empty")]
    EmptyKey,

    #[error("invalid configuration key: {0:?}")]
    InvalidKey(String),

    #[error("unknown category: {0:?}")]
    UnknownCategory(String),

    #[error("unknown audit action: {0:?}")]
    UnknownAction(String),

    #[error("invalid audit record: {0}")]
    InvalidAudit(&'static str),
}

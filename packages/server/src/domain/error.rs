//! Domain error types.

use thiserror::Error;

/// Value object validation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{kind} must be at most {max} characters")]
    TooLong { kind: &'static str, max: usize },
}

/// Persistence failure reported by a store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("message not found: {0}")]
    MessageNotFound(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Push to a single connection failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("push failed: {0}")]
    PushFailed(String),
}

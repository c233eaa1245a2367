//! Crate-level error types.

use crate::types::BackendError;

/// Crate-level error type.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// No hardware backend instance is available.
    #[error("device backend unavailable")]
    BackendUnavailable,

    /// The backend reported an error while starting an operation.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// A simple error message.
    #[error("{0}")]
    Message(String),
}

impl Error {
    /// Create a simple message error.
    pub fn msg(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }
}

/// Crate-level result type.
pub type Result<T> = std::result::Result<T, Error>;

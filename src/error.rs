//! Error types for containers and storage backends.

use thiserror::Error;

/// Result type alias for container operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur during container operations.
#[derive(Debug, Error)]
pub enum StateError {
    /// The container was completed; no further values may be published.
    #[error("state container already completed")]
    Completed,

    /// The active codec failed to encode a state value.
    #[error("encode error: {0}")]
    Encode(String),

    /// The active codec failed to decode a stored value.
    ///
    /// During the initial load this is absorbed by falling back to the
    /// default state; it only surfaces from custom codec invocations.
    #[error("decode error: {0}")]
    Decode(String),

    /// A storage backend operation failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors that can occur inside a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to open storage: {0}")]
    Open(String),

    #[error("storage read error: {0}")]
    Read(String),

    #[error("storage write error: {0}")]
    Write(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),
}

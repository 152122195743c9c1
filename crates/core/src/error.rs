//! Store-level error types
//!
//! [`StoreError`] is what a [`StateStore`](crate::traits::StateStore) returns
//! when it cannot say whether a read or transaction happened. Callers treat
//! every variant as transient: the outcome is unknown and the request may be
//! retried.

use thiserror::Error;

/// Failure of the store itself (not of a condition)
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error (WAL write, fsync, file open)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding of a persisted entry failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Persisted data failed validation
    #[error("corruption: {0}")]
    Corruption(String),

    /// The store rejected an operation it could not apply
    #[error("storage error: {0}")]
    Storage(String),

    /// The store is temporarily unable to serve requests
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store has been shut down
    #[error("store is closed")]
    Closed,
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Check if this error came from the filesystem
    pub fn is_io(&self) -> bool {
        matches!(self, StoreError::Io(_))
    }
}

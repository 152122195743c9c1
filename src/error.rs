//! Unified error types for Tally.
//!
//! Every failure of a counter request resolves to exactly one of these
//! variants: a validation error, a bound rejection, or a store failure.
//! A replayed request is not an error.

use tally_core::{InvalidAction, StoreError};
use tally_primitives::{ConfigError, CounterSnapshot, MutationError, Rejection};
use thiserror::Error;

/// All Tally errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Action string was neither `increment` nor `decrement`
    ///
    /// Raised before the store is touched.
    #[error(transparent)]
    InvalidAction(#[from] InvalidAction),

    /// Increment refused, the counter is at its upper bound
    #[error("MAX_REACHED: counter is at {}", .current.value)]
    MaxReached {
        /// Counter state when the request was refused
        current: CounterSnapshot,
    },

    /// Decrement refused, the counter is at its lower bound
    #[error("MIN_REACHED: counter is at {}", .current.value)]
    MinReached {
        /// Counter state when the request was refused
        current: CounterSnapshot,
    },

    /// The store failed; the outcome of the request is unknown
    #[error("transient store failure: {0}")]
    Transient(#[from] StoreError),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for Tally operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is retryable.
    ///
    /// Store failures may succeed on retry; resubmitting with the same
    /// idempotency key never applies a mutation twice. A closed database
    /// stays closed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transient(e) if !matches!(e, StoreError::Closed))
    }

    /// Check if this is a bound rejection.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::MaxReached { .. } | Error::MinReached { .. })
    }

    /// Check if the request itself was malformed.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::InvalidAction(_))
    }

    /// Serializable `{kind, current}` body of a bound rejection.
    pub fn rejection(&self) -> Option<Rejection> {
        let (kind, current) = match self {
            Error::MaxReached { current } => (tally_primitives::counter::MAX_REACHED, current),
            Error::MinReached { current } => (tally_primitives::counter::MIN_REACHED, current),
            _ => return None,
        };
        Some(Rejection {
            kind: kind.to_string(),
            current: current.clone(),
        })
    }
}

impl From<MutationError> for Error {
    fn from(e: MutationError) -> Self {
        match e {
            MutationError::MaxReached { current } => Error::MaxReached { current },
            MutationError::MinReached { current } => Error::MinReached { current },
            MutationError::Transient(cause) => Error::Transient(cause),
        }
    }
}

//! Mutation failures

use super::snapshot::CounterSnapshot;
use serde::{Deserialize, Serialize};
use tally_core::StoreError;
use thiserror::Error;

/// Kind string of [`MutationError::MaxReached`]
pub const MAX_REACHED: &str = "MAX_REACHED";
/// Kind string of [`MutationError::MinReached`]
pub const MIN_REACHED: &str = "MIN_REACHED";

/// Why a mutation was not applied
///
/// A duplicate key is not an error: it is answered with
/// `MutationResult { idempotent: true, .. }`.
#[derive(Debug, Error)]
pub enum MutationError {
    /// Increment refused, the counter is at its upper bound
    #[error("counter is at its maximum ({})", .current.value)]
    MaxReached {
        /// Counter state when the request was refused
        current: CounterSnapshot,
    },

    /// Decrement refused, the counter is at its lower bound
    #[error("counter is at its minimum ({})", .current.value)]
    MinReached {
        /// Counter state when the request was refused
        current: CounterSnapshot,
    },

    /// The store failed; the mutation may or may not have been applied
    #[error("transient store failure: {0}")]
    Transient(#[from] StoreError),
}

impl MutationError {
    /// `MAX_REACHED` / `MIN_REACHED` for rejections, `None` for transient failures
    pub fn kind(&self) -> Option<&'static str> {
        match self {
            MutationError::MaxReached { .. } => Some(MAX_REACHED),
            MutationError::MinReached { .. } => Some(MIN_REACHED),
            MutationError::Transient(_) => None,
        }
    }

    /// Whether resubmitting with the same key may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, MutationError::Transient(_))
    }

    /// Whether this is a terminal bound rejection
    pub fn is_rejection(&self) -> bool {
        !self.is_retryable()
    }

    /// Counter state carried by a bound rejection
    pub fn current(&self) -> Option<&CounterSnapshot> {
        match self {
            MutationError::MaxReached { current } | MutationError::MinReached { current } => {
                Some(current)
            }
            MutationError::Transient(_) => None,
        }
    }

    /// Serializable body of a bound rejection
    pub fn rejection(&self) -> Option<Rejection> {
        Some(Rejection {
            kind: self.kind()?.to_string(),
            current: self.current()?.clone(),
        })
    }
}

/// Bound rejection as reported to a caller
///
/// Serializes as `{"kind": "MAX_REACHED", "current": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    /// `MAX_REACHED` or `MIN_REACHED`
    pub kind: String,
    /// Counter state when the request was refused
    pub current: CounterSnapshot,
}

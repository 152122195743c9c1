//! Shared bounded counter.
//!
//! # Example
//!
//! ```ignore
//! use tally::prelude::*;
//!
//! let db = Tally::ephemeral()?;
//!
//! let snap = db.counter.get()?;
//! assert_eq!(snap.value, 0);
//!
//! // Same key twice: applied once
//! db.counter.increment(Some("a"))?;
//! let again = db.counter.increment(Some("a"))?;
//! assert!(again.idempotent);
//! assert_eq!(again.value, 1);
//! ```

use crate::error::Result;
use crate::types::{Action, CounterConfig, CounterSnapshot, MutationResult};
use std::sync::Arc;
use tally_engine::Database;
use tally_primitives::BoundedCounter;

/// Counter operations.
///
/// Access via `db.counter`.
pub struct Counter {
    inner: BoundedCounter<Arc<Database>>,
}

impl Counter {
    pub(crate) fn new(db: Arc<Database>, config: CounterConfig) -> Self {
        Self {
            inner: BoundedCounter::new(db, config),
        }
    }

    /// Current value, version and last update time.
    ///
    /// A counter that was never mutated reads as value 0, version 0.
    pub fn get(&self) -> Result<CounterSnapshot> {
        Ok(self.inner.get_current()?)
    }

    /// Add one, at most once per `idem_key`.
    ///
    /// Without a key the request is never treated as a duplicate.
    pub fn increment(&self, idem_key: Option<&str>) -> Result<MutationResult> {
        self.mutate(Action::Increment, idem_key)
    }

    /// Subtract one, at most once per `idem_key`.
    pub fn decrement(&self, idem_key: Option<&str>) -> Result<MutationResult> {
        self.mutate(Action::Decrement, idem_key)
    }

    /// Apply an action given by name (`"increment"` or `"decrement"`).
    ///
    /// An unknown name fails with [`Error::InvalidAction`](crate::Error::InvalidAction)
    /// before the store is touched.
    pub fn apply(&self, action: &str, idem_key: Option<&str>) -> Result<MutationResult> {
        let action: Action = action.parse()?;
        self.mutate(action, idem_key)
    }

    /// Bounds and ledger TTL in effect.
    pub fn config(&self) -> &CounterConfig {
        self.inner.config()
    }

    fn mutate(&self, action: Action, idem_key: Option<&str>) -> Result<MutationResult> {
        Ok(self.inner.apply_action(action, idem_key)?)
    }
}

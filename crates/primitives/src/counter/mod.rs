//! BoundedCounter: shared counter with idempotent mutations
//!
//! ## Design: STATELESS FACADE
//!
//! BoundedCounter holds only a store handle and an immutable
//! [`CounterConfig`]. No caches, no locks: every request is arbitrated by
//! the store's conditional transaction, so any number of threads can share
//! one counter, and several counters over the same store agree.
//!
//! ## API
//!
//! - **Query path**: [`BoundedCounter::get_current`], one consistent read
//! - **Mutation engine**: [`BoundedCounter::apply_action`], one transaction
//!   per request, classified into applied / replayed / rejected / transient
//!
//! ```ignore
//! use tally_primitives::{BoundedCounter, CounterConfig};
//! use tally_core::Action;
//!
//! let counter = BoundedCounter::new(Arc::new(Database::ephemeral()?), CounterConfig::default());
//! let first = counter.apply_action(Action::Increment, Some("req-1"))?;
//! let again = counter.apply_action(Action::Increment, Some("req-1"))?;
//! assert!(again.idempotent);
//! assert_eq!(first.value, again.value);
//! ```

pub mod config;
pub mod error;
pub mod ledger;
mod mutation;
mod query;
pub mod snapshot;

pub use config::{ConfigError, CounterConfig};
pub use error::{MutationError, Rejection, MAX_REACHED, MIN_REACHED};
pub use snapshot::{CounterSnapshot, MutationResult};

use tally_core::StateStore;

/// Bounded counter over a [`StateStore`]
#[derive(Debug, Clone)]
pub struct BoundedCounter<S> {
    store: S,
    config: CounterConfig,
}

impl<S: StateStore> BoundedCounter<S> {
    /// Create a counter over `store`
    ///
    /// The config is used as given; call [`CounterConfig::validate`] first
    /// when it comes from outside.
    pub fn new(store: S, config: CounterConfig) -> Self {
        Self { store, config }
    }

    /// Bounds and ledger policy in effect
    pub fn config(&self) -> &CounterConfig {
        &self.config
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }
}

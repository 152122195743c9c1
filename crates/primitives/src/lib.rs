//! Primitives for tally
//!
//! - [`counter`]: the bounded, idempotent shared counter
//!
//! Primitives are stateless facades over a [`StateStore`](tally_core::StateStore):
//! all state lives in the store, all coordination happens in its
//! transactions.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod counter;

pub use counter::{
    BoundedCounter, ConfigError, CounterConfig, CounterSnapshot, MutationError, MutationResult,
    Rejection,
};

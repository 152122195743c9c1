//! Public types for the Tally API.
//!
//! This module re-exports types from internal crates with a clean public interface.

// Counter vocabulary
pub use tally_core::Action;
pub use tally_primitives::{CounterConfig, CounterSnapshot, MutationResult, Rejection};

// Durability
pub use tally_engine::{DurabilityMode, RecoveryResult};

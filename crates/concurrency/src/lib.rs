//! Concurrency layer for tally
//!
//! This crate serializes conditional transactions over the sharded store:
//! - TransactionContext: ops, status, condition evaluation
//! - TransactionManager: commit lock, WAL-before-storage, version allocation
//! - Per-op cancellation reasons on failed conditions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod manager;
pub mod transaction;

pub use manager::{TransactionManager, TransactionMetrics};
pub use transaction::{CommitError, PreparedWrites, TransactionContext, TransactionStatus};

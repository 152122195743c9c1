//! Storage layer for tally
//!
//! This crate implements the in-memory record storage with:
//! - ShardedStore: DashMap-by-table storage with FxHashMap shards
//! - Expiry-aware reads for write-once-then-expire records
//! - TTLCleaner: background reclamation of expired records

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cleaner;
pub mod sharded;

pub use cleaner::TTLCleaner;
pub use sharded::{Shard, ShardedStore};

//! Storage engine for tally
//!
//! This crate assembles the transactional store:
//! - Database: storage + transaction manager + WAL behind [`StateStore`]
//! - DatabaseBuilder: path, durability mode, TTL sweep interval
//! - Recovery on open
//!
//! [`StateStore`]: tally_core::StateStore

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod database;

pub use database::{Database, DatabaseBuilder, WAL_FILENAME};
pub use tally_concurrency::TransactionMetrics;
pub use tally_durability::{DurabilityMode, RecoveryResult};

//! # Tally
//!
//! A single shared, bounded integer counter with exactly-once mutations.
//!
//! Clients increment or decrement the counter under an idempotency key. A
//! request is applied at most once per key, however often it is retried or
//! raced; the counter never leaves its configured bounds.
//!
//! ## Quick Start
//!
//! ```ignore
//! use tally::prelude::*;
//!
//! let db = Tally::open("./tally-data")?;
//!
//! let first = db.counter.increment(Some("req-1"))?;
//! let again = db.counter.increment(Some("req-1"))?;   // replay, not applied
//! assert!(again.idempotent);
//!
//! // Transport layers pass the action through as text
//! match db.counter.apply("decrement", Some("req-2")) {
//!     Ok(result) => println!("{}", result.value),
//!     Err(e) if e.is_rejection() => println!("{:?}", e.rejection()),
//!     Err(e) => return Err(e),
//! }
//!
//! db.close()?;
//! ```
//!
//! ## Layers
//!
//! - `tally-core`: records, conditional transactions, the store contract
//! - `tally-storage`: sharded in-memory tables with record expiry
//! - `tally-durability`: write-ahead log and recovery
//! - `tally-concurrency`: serialized conditional commits
//! - `tally-engine`: the database assembling the above
//! - `tally-primitives`: the bounded counter

#![warn(missing_docs)]

mod database;
mod error;
mod primitives;
mod types;

pub mod prelude;

// Re-export main entry points
pub use database::{DatabaseMetrics, Tally, TallyBuilder};
pub use error::{Error, Result};

// Re-export primitives
pub use primitives::Counter;

// Re-export types
pub use types::*;

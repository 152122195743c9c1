//! Convenient imports for Tally.
//!
//! ```ignore
//! use tally::prelude::*;
//!
//! let db = Tally::open("./tally-data")?;
//! db.counter.increment(Some("req-1"))?;
//! ```

// Main entry point
pub use crate::database::{Tally, TallyBuilder};

// Error handling
pub use crate::error::{Error, Result};

// Primitives
pub use crate::primitives::Counter;

// Core types
pub use crate::types::{Action, CounterConfig, CounterSnapshot, DurabilityMode, MutationResult};

//! Core types and traits for tally
//!
//! This crate defines the vocabulary shared by every layer:
//! - [`types`]: Keys and tables
//! - [`record`]: Counter and idempotency records, actions
//! - [`transact`]: Conditional transaction ops and outcomes
//! - [`traits`]: The [`StateStore`] capability contract
//! - [`error`]: Store-level errors

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod record;
pub mod traits;
pub mod transact;
pub mod types;

pub use error::{Result, StoreError};
pub use record::{Action, CounterRecord, IdempotencyRecord, InvalidAction, Record, VersionedRecord};
pub use traits::StateStore;
pub use transact::{
    CancellationReason, Condition, TransactOp, TransactOutcome, TransactReceipt, Update,
    UpdateError,
};
pub use types::{Key, Table, COUNTER_ID};

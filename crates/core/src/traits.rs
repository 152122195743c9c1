//! The store capability contract
//!
//! Everything above the storage layer talks to the store through
//! [`StateStore`], so the counter logic never depends on how the store is
//! built and tests can substitute their own implementation.

use crate::error::Result;
use crate::record::Record;
use crate::transact::{TransactOp, TransactOutcome};
use crate::types::Key;

/// Transactional key-value store with conditional writes
///
/// # Contract
///
/// - `read` is strongly consistent: it reflects every transaction that
///   committed before the call started. Expired records read as absent.
/// - `transact` is all-or-nothing across its ops. Conditions are evaluated
///   against pre-transaction state, atomically with the writes.
/// - `Err(_)` from either method means the outcome is unknown.
pub trait StateStore: Send + Sync {
    /// Read the live record under `key`
    fn read(&self, key: &Key) -> Result<Option<Record>>;

    /// Submit a conditional transaction
    fn transact(&self, ops: Vec<TransactOp>) -> Result<TransactOutcome>;
}

impl<S: StateStore + ?Sized> StateStore for std::sync::Arc<S> {
    fn read(&self, key: &Key) -> Result<Option<Record>> {
        (**self).read(key)
    }

    fn transact(&self, ops: Vec<TransactOp>) -> Result<TransactOutcome> {
        (**self).transact(ops)
    }
}

//! Query path

use super::snapshot::CounterSnapshot;
use super::BoundedCounter;
use chrono::Utc;
use tally_core::{Key, Record, StateStore, StoreError};

impl<S: StateStore> BoundedCounter<S> {
    /// Current counter state
    ///
    /// Never writes. A counter that was never mutated reads as
    /// `{value: 0, version: 0, updated_at: now}`.
    pub fn get_current(&self) -> Result<CounterSnapshot, StoreError> {
        let record = match self.store.read(&Key::counter())? {
            None => None,
            Some(Record::Counter(record)) => Some(record),
            Some(other) => {
                return Err(StoreError::Corruption(format!(
                    "counter key holds a {} record",
                    other.kind()
                )))
            }
        };
        Ok(CounterSnapshot::from_record(record.as_ref(), Utc::now()))
    }
}

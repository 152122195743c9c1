//! Core key types for the store
//!
//! This module defines the addressing scheme used throughout the system:
//! - [`Table`]: Logical table a record lives in
//! - [`Key`]: Table plus record identifier

use serde::{Deserialize, Serialize};

/// Identifier of the singleton counter record
pub const COUNTER_ID: &str = "COUNTER";

/// Logical table of a record
///
/// The counter and the idempotency ledger have different lifecycles
/// (mutable singleton vs. write-once-then-expire), so they are kept in
/// separate tables and separate storage shards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Table {
    /// Counter records (one row, keyed by [`COUNTER_ID`])
    Counter,
    /// Idempotency records (one row per idempotency key)
    Idempotency,
}

impl Table {
    /// Table name for display and logging
    pub fn name(&self) -> &'static str {
        match self {
            Table::Counter => "counter",
            Table::Idempotency => "idempotency",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Address of a record: table plus identifier
///
/// Keys are ordered by table first, then by identifier.
///
/// # Examples
///
/// ```
/// use tally_core::types::{Key, Table};
///
/// let key = Key::idempotency("req-42");
/// assert_eq!(key.table, Table::Idempotency);
/// assert_eq!(key.id, "req-42");
/// assert_eq!(key.to_string(), "idempotency/req-42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key {
    /// Table the record lives in
    pub table: Table,
    /// Record identifier within the table
    pub id: String,
}

impl Key {
    /// Create a key in an explicit table
    pub fn new(table: Table, id: impl Into<String>) -> Self {
        Self {
            table,
            id: id.into(),
        }
    }

    /// Key of the singleton counter record
    ///
    /// # Examples
    ///
    /// ```
    /// use tally_core::types::{Key, COUNTER_ID};
    ///
    /// assert_eq!(Key::counter().id, COUNTER_ID);
    /// ```
    pub fn counter() -> Self {
        Self::new(Table::Counter, COUNTER_ID)
    }

    /// Key of an idempotency record
    pub fn idempotency(id: impl Into<String>) -> Self {
        Self::new(Table::Idempotency, id)
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.table, self.id)
    }
}

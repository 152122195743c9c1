//! Conditional transaction vocabulary
//!
//! A transaction is a list of [`TransactOp`]s. Each op may carry a
//! [`Condition`] evaluated against the record's pre-transaction state; the
//! transaction commits only if every condition holds, and then applies every
//! op. The store answers with a [`TransactOutcome`].
//!
//! ## Absent records
//!
//! Counter conditions and [`Update::AddToCounter`] read an absent (or
//! expired) counter as `value = 0, version = 0`.

use crate::record::{CounterRecord, Record};
use crate::types::Key;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Precondition on a single key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    /// No live record exists under the key
    NotExists,
    /// A live record exists under the key
    Exists,
    /// Counter value (absent = 0) is strictly below the bound
    CounterBelow(i64),
    /// Counter value (absent = 0) is strictly above the bound
    CounterAbove(i64),
}

impl Condition {
    /// Evaluate against the current live record, `None` if absent
    ///
    /// Counter conditions never hold for a non-counter record.
    pub fn holds(&self, current: Option<&Record>) -> bool {
        match self {
            Condition::NotExists => current.is_none(),
            Condition::Exists => current.is_some(),
            Condition::CounterBelow(bound) => {
                counter_value(current).map_or(false, |v| v < *bound)
            }
            Condition::CounterAbove(bound) => {
                counter_value(current).map_or(false, |v| v > *bound)
            }
        }
    }
}

fn counter_value(current: Option<&Record>) -> Option<i64> {
    match current {
        None => Some(0),
        Some(Record::Counter(c)) => Some(c.value),
        Some(_) => None,
    }
}

/// In-place modification of an existing (or implicitly zero) record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Update {
    /// `value += delta`, `version += 1`, `updated_at = at`
    AddToCounter {
        /// Signed amount to add
        delta: i64,
        /// Timestamp to stamp on the record
        at: DateTime<Utc>,
    },
}

/// Why an [`Update`] could not be applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateError {
    /// The key holds a record of another kind
    WrongKind(&'static str),
    /// The arithmetic left the `i64` range
    Overflow,
}

impl std::fmt::Display for UpdateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateError::WrongKind(kind) => write!(f, "expected Counter record, found {}", kind),
            UpdateError::Overflow => f.write_str("counter arithmetic overflow"),
        }
    }
}

impl Update {
    /// Compute the post-image of the record
    pub fn apply(&self, current: Option<&Record>) -> Result<Record, UpdateError> {
        match self {
            Update::AddToCounter { delta, at } => {
                let (value, version) = match current {
                    None => (0, 0),
                    Some(Record::Counter(c)) => (c.value, c.version),
                    Some(other) => return Err(UpdateError::WrongKind(other.kind())),
                };
                let value = value.checked_add(*delta).ok_or(UpdateError::Overflow)?;
                let version = version.checked_add(1).ok_or(UpdateError::Overflow)?;
                Ok(Record::Counter(CounterRecord {
                    value,
                    version,
                    updated_at: *at,
                }))
            }
        }
    }
}

/// One operation of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactOp {
    /// Write a whole record
    Put {
        /// Target key
        key: Key,
        /// Record to write
        record: Record,
        /// Optional precondition
        condition: Option<Condition>,
    },
    /// Modify the record in place
    Update {
        /// Target key
        key: Key,
        /// Modification to apply
        update: Update,
        /// Optional precondition
        condition: Option<Condition>,
    },
}

impl TransactOp {
    /// Key this op targets
    pub fn key(&self) -> &Key {
        match self {
            TransactOp::Put { key, .. } | TransactOp::Update { key, .. } => key,
        }
    }

    /// Precondition of this op, if any
    pub fn condition(&self) -> Option<&Condition> {
        match self {
            TransactOp::Put { condition, .. } | TransactOp::Update { condition, .. } => {
                condition.as_ref()
            }
        }
    }
}

/// Per-operation reason reported when a transaction is cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancellationReason {
    /// This op's condition held; it was cancelled because another op failed
    Passed,
    /// This op's condition did not hold
    ConditionFailed,
    /// This op collided with a concurrent transaction
    Conflict,
}

/// Result of a committed transaction
#[derive(Debug, Clone, PartialEq)]
pub struct TransactReceipt {
    /// Commit version assigned to every write of the transaction
    pub commit_version: u64,
    /// Post-image of each op, index-aligned with the submitted ops
    pub records: Vec<Record>,
}

/// What the store did with a transaction
#[derive(Debug, Clone, PartialEq)]
pub enum TransactOutcome {
    /// All conditions held; every op was applied
    Committed(TransactReceipt),
    /// Nothing was applied
    ///
    /// `reasons` is index-aligned with the submitted ops when the store
    /// reports them, `None` when it does not.
    Cancelled {
        /// Per-op reasons, if reported
        reasons: Option<Vec<CancellationReason>>,
    },
}

impl TransactOutcome {
    /// Whether the transaction committed
    pub fn is_committed(&self) -> bool {
        matches!(self, TransactOutcome::Committed(_))
    }
}

//! Record types stored in the tables
//!
//! - [`CounterRecord`]: the singleton bounded value
//! - [`IdempotencyRecord`]: write-once ledger entry with an expiry
//! - [`Record`]: what the store holds under a [`Key`](crate::types::Key)
//! - [`VersionedRecord`]: a record plus store metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Mutation requested by a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Add one to the counter
    Increment,
    /// Subtract one from the counter
    Decrement,
}

impl Action {
    /// Signed delta this action applies
    pub fn delta(&self) -> i64 {
        match self {
            Action::Increment => 1,
            Action::Decrement => -1,
        }
    }

    /// Wire name of the action
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Increment => "increment",
            Action::Decrement => "decrement",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action string was neither `increment` nor `decrement`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid action '{0}': expected 'increment' or 'decrement'")]
pub struct InvalidAction(pub String);

impl FromStr for Action {
    type Err = InvalidAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "increment" => Ok(Action::Increment),
            "decrement" => Ok(Action::Decrement),
            other => Err(InvalidAction(other.to_string())),
        }
    }
}

/// The singleton counter
///
/// Each counter record has:
/// - A value, kept inside the configured bounds by the writer's condition
/// - A version number, +1 per accepted mutation
/// - A timestamp of the last accepted mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRecord {
    /// Current value
    pub value: i64,
    /// Number of accepted mutations so far
    pub version: u64,
    /// Time of the last accepted mutation
    pub updated_at: DateTime<Utc>,
}

/// Write-once ledger entry for an idempotency key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    /// The idempotency key
    pub id: String,
    /// Action first submitted under this key
    pub action: Action,
    /// Time of first submission
    pub created_at: DateTime<Utc>,
    /// Epoch seconds after which the store may reclaim the record
    pub expires_at: i64,
}

/// A record held by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Record {
    /// Row of the counter table
    Counter(CounterRecord),
    /// Row of the idempotency table
    Idempotency(IdempotencyRecord),
}

impl Record {
    /// Epoch seconds after which this record is reclaimable, if it expires at all
    pub fn expires_at(&self) -> Option<i64> {
        match self {
            Record::Counter(_) => None,
            Record::Idempotency(r) => Some(r.expires_at),
        }
    }

    /// Borrow as a counter record
    pub fn as_counter(&self) -> Option<&CounterRecord> {
        match self {
            Record::Counter(c) => Some(c),
            _ => None,
        }
    }

    /// Borrow as an idempotency record
    pub fn as_idempotency(&self) -> Option<&IdempotencyRecord> {
        match self {
            Record::Idempotency(r) => Some(r),
            _ => None,
        }
    }

    /// Record kind for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Record::Counter(_) => "Counter",
            Record::Idempotency(_) => "Idempotency",
        }
    }
}

/// A record plus the metadata the store keeps next to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedRecord {
    /// Stored record
    pub record: Record,
    /// Commit version of the transaction that wrote it
    pub version: u64,
    /// Write time (microseconds since epoch)
    pub timestamp: i64,
    /// Epoch seconds after which the record counts as absent
    pub expires_at: Option<i64>,
}

impl VersionedRecord {
    /// Wrap a record written at `version`
    pub fn new(record: Record, version: u64) -> Self {
        Self {
            expires_at: record.expires_at(),
            record,
            version,
            timestamp: Utc::now().timestamp_micros(),
        }
    }

    /// Whether the record has expired at `now` (epoch seconds)
    ///
    /// A record expiring at `t` is already gone at `t`.
    pub fn is_expired(&self, now: i64) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }
}

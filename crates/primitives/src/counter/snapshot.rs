//! Caller-facing views of the counter

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_core::CounterRecord;

/// Point-in-time view of the counter
///
/// Serializes as `{"value", "updatedAt", "version"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterSnapshot {
    /// Current value
    pub value: i64,
    /// Time of the last accepted mutation
    pub updated_at: DateTime<Utc>,
    /// Number of accepted mutations
    pub version: u64,
}

impl CounterSnapshot {
    /// Snapshot of a counter that has never been written
    pub fn zero(now: DateTime<Utc>) -> Self {
        Self {
            value: 0,
            updated_at: now,
            version: 0,
        }
    }

    /// Resolve a possibly absent record; absent reads as [`CounterSnapshot::zero`]
    pub fn from_record(record: Option<&CounterRecord>, now: DateTime<Utc>) -> Self {
        record.map_or_else(|| Self::zero(now), Self::from)
    }
}

impl From<&CounterRecord> for CounterSnapshot {
    fn from(record: &CounterRecord) -> Self {
        Self {
            value: record.value,
            updated_at: record.updated_at,
            version: record.version,
        }
    }
}

/// Answer to an accepted or replayed mutation
///
/// Serializes as `{"value", "updatedAt", "version", "idempotent"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResult {
    /// Counter value after the mutation
    pub value: i64,
    /// Time of the last accepted mutation
    pub updated_at: DateTime<Utc>,
    /// Counter version after the mutation
    pub version: u64,
    /// `true` when the key had already been used and nothing was applied
    pub idempotent: bool,
}

impl MutationResult {
    /// A mutation applied by this request
    pub fn applied(snapshot: CounterSnapshot) -> Self {
        Self::new(snapshot, false)
    }

    /// A replay of an earlier request with the same key
    pub fn replayed(snapshot: CounterSnapshot) -> Self {
        Self::new(snapshot, true)
    }

    fn new(snapshot: CounterSnapshot, idempotent: bool) -> Self {
        Self {
            value: snapshot.value,
            updated_at: snapshot.updated_at,
            version: snapshot.version,
            idempotent,
        }
    }

    /// The counter part of the result
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            value: self.value,
            updated_at: self.updated_at,
            version: self.version,
        }
    }
}

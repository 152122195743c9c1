//! Sharded in-memory record storage
//!
//! DashMap keyed by [`Table`], FxHashMap within each table.
//! Lock-free reads, writes only lock the target table's shard.
//!
//! # Design
//!
//! - DashMap: one shard per table, so ledger inserts and counter updates
//!   land in different shards
//! - FxHashMap: O(1) lookups, fast non-crypto hash
//! - Expiry: records past `expires_at` are invisible to [`ShardedStore::get`]
//!   and removed by [`ShardedStore::purge_expired`]
//!
//! This layer has no notion of conditions or atomicity across keys; the
//! transaction manager serializes commits on top of it.

use dashmap::DashMap;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tally_core::types::{Key, Table};
use tally_core::VersionedRecord;

/// Per-table shard containing the table's records
#[derive(Debug)]
pub struct Shard {
    /// HashMap with FxHash for O(1) lookups, keyed by record id
    pub(crate) data: FxHashMap<String, VersionedRecord>,
}

impl Shard {
    /// Create a new empty shard
    pub fn new() -> Self {
        Self {
            data: FxHashMap::default(),
        }
    }

    /// Get number of entries in this shard
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if shard is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for Shard {
    fn default() -> Self {
        Self::new()
    }
}

/// Sharded storage - DashMap by Table, HashMap within
///
/// # Thread Safety
///
/// All operations are thread-safe:
/// - get(): Lock-free read via DashMap
/// - put(): Only locks the target table's shard
///
/// # Example
///
/// ```ignore
/// use tally_storage::ShardedStore;
/// use std::sync::Arc;
///
/// let store = Arc::new(ShardedStore::new());
/// let live = store.get(&Key::counter(), now);
/// ```
pub struct ShardedStore {
    /// Per-table shards using DashMap
    shards: DashMap<Table, Shard>,
    /// Version of the last applied batch
    version: AtomicU64,
}

impl ShardedStore {
    /// Create new sharded store
    pub fn new() -> Self {
        Self {
            shards: DashMap::new(),
            version: AtomicU64::new(0),
        }
    }

    /// Get current version
    #[inline]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Set version (used during recovery)
    pub fn set_version(&self, version: u64) {
        self.version.store(version, Ordering::Release);
    }

    /// Get number of shards (tables with data)
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Get total number of entries across all shards, expired ones included
    pub fn total_entries(&self) -> usize {
        self.shards.iter().map(|entry| entry.value().len()).sum()
    }

    /// Get count of entries for a specific table, expired ones included
    pub fn table_entry_count(&self, table: Table) -> usize {
        self.shards
            .get(&table)
            .map(|shard| shard.len())
            .unwrap_or(0)
    }

    // ========================================================================
    // Get/Put/Delete Operations
    // ========================================================================

    /// Get the live record under a key
    ///
    /// Returns `None` if the key is absent or its record expired at or
    /// before `now` (epoch seconds).
    #[inline]
    pub fn get(&self, key: &Key, now: i64) -> Option<VersionedRecord> {
        self.get_raw(key).filter(|vr| !vr.is_expired(now))
    }

    /// Get a record regardless of expiry
    #[inline]
    pub fn get_raw(&self, key: &Key) -> Option<VersionedRecord> {
        self.shards
            .get(&key.table)
            .and_then(|shard| shard.data.get(&key.id).cloned())
    }

    /// Put a record for a key
    ///
    /// Only locks this table's shard.
    #[inline]
    pub fn put(&self, key: Key, value: VersionedRecord) {
        self.shards
            .entry(key.table)
            .or_insert_with(Shard::new)
            .data
            .insert(key.id, value);
    }

    /// Delete a key
    ///
    /// Returns the removed record if it existed.
    #[inline]
    pub fn delete(&self, key: &Key) -> Option<VersionedRecord> {
        self.shards
            .get_mut(&key.table)
            .and_then(|mut shard| shard.data.remove(&key.id))
    }

    /// Check if a live record exists under a key
    #[inline]
    pub fn contains(&self, key: &Key, now: i64) -> bool {
        self.get(key, now).is_some()
    }

    /// Apply a batch of writes
    ///
    /// Each record keeps its own commit version; the store version advances
    /// to `version`.
    pub fn apply_batch(&self, writes: Vec<(Key, VersionedRecord)>, version: u64) {
        for (key, record) in writes {
            self.put(key, record);
        }
        self.version.fetch_max(version, Ordering::AcqRel);
    }

    // ========================================================================
    // Expiry
    // ========================================================================

    /// Physically remove every record expired at `now` (epoch seconds)
    ///
    /// Returns the number of records removed.
    pub fn purge_expired(&self, now: i64) -> usize {
        let mut removed = 0;
        for mut shard in self.shards.iter_mut() {
            let before = shard.data.len();
            shard.data.retain(|_, vr| !vr.is_expired(now));
            removed += before - shard.data.len();
        }
        removed
    }

    /// List live records of a table, sorted by id
    ///
    /// NOTE: Requires collect + sort. Not for hot path operations.
    pub fn list_table(&self, table: Table, now: i64) -> Vec<(Key, VersionedRecord)> {
        self.shards
            .get(&table)
            .map(|shard| {
                let mut results: Vec<_> = shard
                    .data
                    .iter()
                    .filter(|(_, vr)| !vr.is_expired(now))
                    .map(|(id, vr)| (Key::new(table, id.clone()), vr.clone()))
                    .collect();

                results.sort_by(|(a, _), (b, _)| a.cmp(b));
                results
            })
            .unwrap_or_default()
    }
}

impl Default for ShardedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ShardedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedStore")
            .field("shard_count", &self.shard_count())
            .field("version", &self.version())
            .field("total_entries", &self.total_entries())
            .finish()
    }
}

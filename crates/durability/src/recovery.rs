//! Crash recovery by WAL replay
//!
//! After recovery the store must correspond to a **prefix of the committed
//! transaction history**: writes of a transaction become visible only if its
//! `CommitTxn` entry was read back. Transactions without a commit marker
//! (torn by a crash) are discarded.
//!
//! ## Recovery Sequence
//!
//! 1. Decode the WAL up to the first incomplete or corrupt frame
//! 2. Buffer writes per transaction, apply on `CommitTxn`
//! 3. Skip records that have already expired
//! 4. Report the valid length so the caller can truncate the tail

use crate::wal::{WALEntry, WAL};
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;
use tally_core::error::Result;
use tally_core::types::Key;
use tally_core::VersionedRecord;
use tally_storage::ShardedStore;
use tracing::{debug, info, warn};

/// Outcome of a WAL replay
#[derive(Debug, Default, Clone)]
pub struct RecoveryResult {
    /// WAL entries decoded
    pub wal_entries_replayed: u64,
    /// Transactions applied to the store
    pub transactions_recovered: u64,
    /// Transactions discarded for lack of a commit marker
    pub orphaned_transactions: u64,
    /// Records not restored because they had expired
    pub expired_records_skipped: u64,
    /// Whether decoding stopped before the end of the file
    pub corrupt_tail: bool,
    /// Length of the decodable WAL prefix in bytes
    pub valid_len: u64,
    /// Highest commit version seen
    pub final_version: u64,
    /// Highest transaction id seen
    pub max_txn_id: u64,
    /// Total recovery time (microseconds)
    pub recovery_time_micros: u64,
}

impl RecoveryResult {
    /// Get human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "Recovery complete: {} transactions, {} WAL entries, {} orphaned, {} expired skipped, corrupt tail: {}, {:.2}ms",
            self.transactions_recovered,
            self.wal_entries_replayed,
            self.orphaned_transactions,
            self.expired_records_skipped,
            self.corrupt_tail,
            self.recovery_time_micros as f64 / 1000.0,
        )
    }

    /// Check if recovery had any issues (corruption, orphaned txns)
    pub fn has_issues(&self) -> bool {
        self.corrupt_tail || self.orphaned_transactions > 0
    }
}

/// Replay the WAL at `path` into `store`
///
/// `now` (epoch seconds) decides which ledger records have expired.
pub fn recover(path: impl AsRef<Path>, store: &ShardedStore, now: i64) -> Result<RecoveryResult> {
    let started = Instant::now();
    let path = path.as_ref();
    info!("Starting recovery from {}", path.display());

    let contents = WAL::read_entries(path)?;
    let mut result = RecoveryResult {
        wal_entries_replayed: contents.entries.len() as u64,
        valid_len: contents.valid_len,
        corrupt_tail: contents.tail_error.is_some(),
        ..Default::default()
    };

    if let Some(err) = &contents.tail_error {
        warn!(
            offset = contents.valid_len,
            error = %err,
            "WAL tail unreadable, replaying valid prefix only"
        );
    }

    let mut pending: HashMap<u64, Vec<(Key, VersionedRecord)>> = HashMap::new();
    for entry in contents.entries {
        result.max_txn_id = result.max_txn_id.max(entry.txn_id());
        match entry {
            WALEntry::BeginTxn { txn_id, .. } => {
                pending.insert(txn_id, Vec::new());
            }
            WALEntry::Write { txn_id, key, record } => {
                pending.entry(txn_id).or_default().push((key, record));
            }
            WALEntry::CommitTxn { txn_id } => {
                let Some(writes) = pending.remove(&txn_id) else {
                    debug!(txn_id, "commit marker without writes");
                    continue;
                };
                let mut live = Vec::with_capacity(writes.len());
                let mut version = 0;
                for (key, record) in writes {
                    version = version.max(record.version);
                    if record.is_expired(now) {
                        result.expired_records_skipped += 1;
                    } else {
                        live.push((key, record));
                    }
                }
                store.apply_batch(live, version);
                result.final_version = result.final_version.max(version);
                result.transactions_recovered += 1;
            }
        }
    }

    result.orphaned_transactions = pending.len() as u64;
    result.recovery_time_micros = started.elapsed().as_micros() as u64;
    info!("{}", result.summary());
    Ok(result)
}

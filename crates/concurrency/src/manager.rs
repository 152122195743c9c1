//! Transaction manager for coordinating commit operations
//!
//! Provides atomic commit by orchestrating:
//! 1. Condition evaluation (against live storage state)
//! 2. WAL writing (durability)
//! 3. Storage application (visibility)
//!
//! Core invariants:
//! - All-or-nothing commit: transaction writes either ALL apply or NONE do
//! - WAL before storage: durability requires WAL to be written first
//! - CommitTxn = durable: transaction is only durable when CommitTxn is in WAL
//!
//! ## Commit Sequence
//!
//! ```text
//! 1. Acquire commit lock
//! 2. prepare() - evaluate conditions, compute post-images
//! 3. IF a condition failed: mark cancelled, return reasons
//! 4. Allocate commit_version
//! 5. BeginTxn, Write*, CommitTxn to WAL, commit_point (DURABILITY POINT)
//! 6. apply_batch() to storage
//! 7. Release commit lock, return receipt
//! ```
//!
//! If a crash occurs before step 5 completes the transaction is not durable
//! and is discarded on recovery. If step 5 fails the WAL cuts its frames
//! back out, so a failed transaction cannot resurface behind a later commit.

use crate::transaction::{CommitError, TransactionContext};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tally_core::{Record, TransactReceipt, VersionedRecord};
use tally_durability::{WALEntry, WAL};
use tally_storage::ShardedStore;

/// Counters of transaction outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionMetrics {
    /// Transactions applied
    pub total_committed: u64,
    /// Transactions rejected by a failed condition
    pub total_cancelled: u64,
    /// Transactions that failed for any other reason
    pub total_aborted: u64,
}

impl TransactionMetrics {
    /// Fraction of finished transactions that committed (0.0 - 1.0)
    pub fn commit_rate(&self) -> f64 {
        let total = self.total_committed + self.total_cancelled + self.total_aborted;
        if total == 0 {
            0.0
        } else {
            self.total_committed as f64 / total as f64
        }
    }
}

/// Manages transaction lifecycle and atomic commits
///
/// # Thread Safety
///
/// The commit operation is serialized via an internal lock to prevent TOCTOU
/// races between condition evaluation and storage application: no other
/// transaction can modify storage between the time conditions are checked
/// and the time the writes land.
pub struct TransactionManager {
    /// Global version counter
    ///
    /// Monotonically increasing. Each committed transaction increments by 1.
    version: AtomicU64,

    /// Next transaction ID
    next_txn_id: AtomicU64,

    /// Commit serialization lock
    commit_lock: Mutex<()>,

    committed: AtomicU64,
    cancelled: AtomicU64,
    aborted: AtomicU64,
}

impl TransactionManager {
    /// Create a new transaction manager
    ///
    /// # Arguments
    /// * `initial_version` - Starting version (typically from recovery's final_version)
    pub fn new(initial_version: u64) -> Self {
        Self::with_txn_id(initial_version, 0)
    }

    /// Create a new transaction manager with specific starting txn_id
    ///
    /// Used during recovery so new transactions get IDs that don't collide
    /// with transactions already in the WAL.
    pub fn with_txn_id(initial_version: u64, max_txn_id: u64) -> Self {
        TransactionManager {
            version: AtomicU64::new(initial_version),
            next_txn_id: AtomicU64::new(max_txn_id + 1),
            commit_lock: Mutex::new(()),
            committed: AtomicU64::new(0),
            cancelled: AtomicU64::new(0),
            aborted: AtomicU64::new(0),
        }
    }

    /// Get current global version
    pub fn current_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Allocate next transaction ID
    pub fn next_txn_id(&self) -> u64 {
        self.next_txn_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Allocate next commit version (increment global version)
    ///
    /// Version gaps may occur if a transaction fails after version
    /// allocation but before its writes are applied (e.g. WAL write failure).
    pub fn allocate_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Snapshot of the outcome counters
    pub fn metrics(&self) -> TransactionMetrics {
        TransactionMetrics {
            total_committed: self.committed.load(Ordering::Relaxed),
            total_cancelled: self.cancelled.load(Ordering::Relaxed),
            total_aborted: self.aborted.load(Ordering::Relaxed),
        }
    }

    /// Commit a transaction atomically
    ///
    /// # Returns
    /// - `Ok(receipt)` with the post-image of every op on success
    /// - `Err(CommitError::ConditionFailed)` with per-op reasons if a
    ///   condition did not hold; nothing is written
    /// - `Err(_)` for any other failure; nothing is applied to storage
    pub fn commit(
        &self,
        txn: &mut TransactionContext,
        store: &ShardedStore,
        wal: Option<&mut WAL>,
    ) -> Result<TransactReceipt, CommitError> {
        let _commit_guard = self.commit_lock.lock();
        let now = Utc::now();

        let prepared = match txn.prepare(store, now.timestamp()) {
            Ok(prepared) => prepared,
            Err(CommitError::ConditionFailed(reasons)) => {
                txn.mark_cancelled();
                self.cancelled.fetch_add(1, Ordering::Relaxed);
                return Err(CommitError::ConditionFailed(reasons));
            }
            Err(e) => {
                txn.mark_aborted(e.to_string());
                self.aborted.fetch_add(1, Ordering::Relaxed);
                return Err(e);
            }
        };

        let commit_version = self.allocate_version();
        let writes: Vec<_> = prepared
            .writes
            .into_iter()
            .map(|(key, record)| (key, VersionedRecord::new(record, commit_version)))
            .collect();

        if let Some(wal) = wal {
            if let Err(e) = Self::write_to_wal(wal, txn.txn_id, now.timestamp_micros(), &writes) {
                txn.mark_aborted(format!("WAL write failed: {}", e));
                self.aborted.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    txn_id = txn.txn_id,
                    commit_version,
                    error = %e,
                    "WAL write failed, transaction not applied"
                );
                return Err(CommitError::WALError(e.to_string()));
            }
        }

        let records: Vec<Record> = writes.iter().map(|(_, vr)| vr.record.clone()).collect();
        store.apply_batch(writes, commit_version);

        txn.mark_committed(commit_version);
        self.committed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(txn_id = txn.txn_id, commit_version, "transaction committed");

        Ok(TransactReceipt {
            commit_version,
            records,
        })
    }

    fn write_to_wal(
        wal: &mut WAL,
        txn_id: u64,
        timestamp: i64,
        writes: &[(tally_core::Key, VersionedRecord)],
    ) -> tally_core::Result<()> {
        let mut entries = Vec::with_capacity(writes.len() + 2);
        entries.push(WALEntry::BeginTxn { txn_id, timestamp });
        entries.extend(writes.iter().map(|(key, record)| WALEntry::Write {
            txn_id,
            key: key.clone(),
            record: record.clone(),
        }));
        entries.push(WALEntry::CommitTxn { txn_id });
        wal.append_txn(&entries)
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::TransactionStatus;
    use std::sync::Arc;
    use tally_core::{
        Action, CancellationReason, Condition, IdempotencyRecord, Key, TransactOp, Update,
    };
    use tally_durability::DurabilityMode;

    fn ops(id: &str, max: i64) -> Vec<TransactOp> {
        vec![
            TransactOp::Put {
                key: Key::idempotency(id),
                record: Record::Idempotency(IdempotencyRecord {
                    id: id.to_string(),
                    action: Action::Increment,
                    created_at: Utc::now(),
                    expires_at: i64::MAX,
                }),
                condition: Some(Condition::NotExists),
            },
            TransactOp::Update {
                key: Key::counter(),
                update: Update::AddToCounter {
                    delta: 1,
                    at: Utc::now(),
                },
                condition: Some(Condition::CounterBelow(max)),
            },
        ]
    }

    fn counter_value(store: &ShardedStore) -> Option<i64> {
        store
            .get(&Key::counter(), 0)
            .and_then(|vr| vr.record.as_counter().map(|c| c.value))
    }

    #[test]
    fn test_commit_applies_all_ops() {
        let manager = TransactionManager::new(0);
        let store = ShardedStore::new();
        let mut txn = TransactionContext::new(manager.next_txn_id(), ops("a", 10));

        let receipt = manager.commit(&mut txn, &store, None).unwrap();

        assert_eq!(receipt.commit_version, 1);
        assert_eq!(receipt.records.len(), 2);
        assert_eq!(txn.status, TransactionStatus::Committed { version: 1 });
        assert_eq!(counter_value(&store), Some(1));
        assert!(store.contains(&Key::idempotency("a"), 0));
    }

    #[test]
    fn test_failed_condition_applies_nothing() {
        let manager = TransactionManager::new(0);
        let store = ShardedStore::new();
        let mut first = TransactionContext::new(manager.next_txn_id(), ops("a", 1));
        manager.commit(&mut first, &store, None).unwrap();

        // Counter is at the bound, ledger key is new
        let mut second = TransactionContext::new(manager.next_txn_id(), ops("b", 1));
        let err = manager.commit(&mut second, &store, None).unwrap_err();

        assert_eq!(
            err,
            CommitError::ConditionFailed(vec![
                CancellationReason::Passed,
                CancellationReason::ConditionFailed
            ])
        );
        assert_eq!(second.status, TransactionStatus::Cancelled);
        assert!(!store.contains(&Key::idempotency("b"), 0));
        assert_eq!(manager.current_version(), 1);
        assert_eq!(manager.metrics().total_cancelled, 1);
    }

    #[test]
    fn test_commit_writes_wal_before_storage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wal.dat");
        let mut wal = WAL::open(&path, DurabilityMode::Strict).unwrap();
        let manager = TransactionManager::new(0);
        let store = ShardedStore::new();

        let mut txn = TransactionContext::new(manager.next_txn_id(), ops("a", 10));
        manager.commit(&mut txn, &store, Some(&mut wal)).unwrap();

        let contents = WAL::read_entries(&path).unwrap();
        assert_eq!(contents.entries.len(), 4);
        assert!(matches!(contents.entries[0], WALEntry::BeginTxn { .. }));
        assert!(matches!(contents.entries[3], WALEntry::CommitTxn { .. }));
    }

    #[test]
    fn test_cancelled_transaction_leaves_no_wal_trace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wal.dat");
        let mut wal = WAL::open(&path, DurabilityMode::Strict).unwrap();
        let manager = TransactionManager::new(0);
        let store = ShardedStore::new();

        let mut txn = TransactionContext::new(manager.next_txn_id(), ops("a", 0));
        assert!(manager.commit(&mut txn, &store, Some(&mut wal)).is_err());

        assert!(WAL::read_entries(&path).unwrap().entries.is_empty());
    }

    #[test]
    fn test_concurrent_commits_respect_bound() {
        use std::thread;

        let manager = Arc::new(TransactionManager::new(0));
        let store = Arc::new(ShardedStore::new());
        const MAX: i64 = 25;

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let manager = Arc::clone(&manager);
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let mut wins = 0;
                    for i in 0..10 {
                        let mut txn = TransactionContext::new(
                            manager.next_txn_id(),
                            ops(&format!("t{}-{}", t, i), MAX),
                        );
                        if manager.commit(&mut txn, &store, None).is_ok() {
                            wins += 1;
                        }
                    }
                    wins
                })
            })
            .collect();

        let wins: i64 = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(wins, MAX);
        assert_eq!(counter_value(&store), Some(MAX));
        let metrics = manager.metrics();
        assert_eq!(metrics.total_committed, MAX as u64);
        assert_eq!(metrics.total_cancelled, 80 - MAX as u64);
    }

    #[test]
    fn test_txn_ids_continue_after_recovery() {
        let manager = TransactionManager::with_txn_id(10, 42);
        assert_eq!(manager.next_txn_id(), 43);
        assert_eq!(manager.allocate_version(), 11);
    }

    #[test]
    fn test_commit_rate() {
        assert_eq!(TransactionMetrics::default().commit_rate(), 0.0);
        let m = TransactionMetrics {
            total_committed: 3,
            total_cancelled: 1,
            total_aborted: 0,
        };
        assert!((m.commit_rate() - 0.75).abs() < f64::EPSILON);
    }
}

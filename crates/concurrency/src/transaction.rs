//! Conditional write transactions
//!
//! A [`TransactionContext`] holds the ops of one transaction and tracks its
//! status. [`TransactionContext::prepare`] evaluates every condition against
//! the live store state and computes the post-image of every op without
//! writing anything; the [`TransactionManager`](crate::TransactionManager)
//! calls it under its commit lock, so nothing can change between the check
//! and the write.

use std::collections::HashSet;
use std::time::{Duration, Instant};
use tally_core::types::Key;
use tally_core::{CancellationReason, Record, TransactOp};
use tally_storage::ShardedStore;
use thiserror::Error;

/// Why a transaction did not commit
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    /// At least one condition did not hold; reasons are index-aligned with the ops
    #[error("transaction cancelled: {}", describe_reasons(.0))]
    ConditionFailed(Vec<CancellationReason>),

    /// The transaction itself is malformed or cannot be applied
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    /// The WAL write failed; nothing was applied
    #[error("WAL error: {0}")]
    WALError(String),

    /// The transaction already finished
    #[error("transaction not active ({0})")]
    NotActive(String),
}

fn describe_reasons(reasons: &[CancellationReason]) -> String {
    reasons
        .iter()
        .map(|r| format!("{:?}", r))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Lifecycle of a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Built, not yet submitted
    Active,
    /// Applied at this commit version
    Committed {
        /// Commit version
        version: u64,
    },
    /// A condition failed; nothing applied
    Cancelled,
    /// Failed for a reason other than a condition; nothing applied
    Aborted {
        /// Human-readable reason
        reason: String,
    },
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Active => f.write_str("active"),
            TransactionStatus::Committed { version } => write!(f, "committed at {}", version),
            TransactionStatus::Cancelled => f.write_str("cancelled"),
            TransactionStatus::Aborted { reason } => write!(f, "aborted: {}", reason),
        }
    }
}

/// Post-images computed by [`TransactionContext::prepare`]
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedWrites {
    /// One `(key, record)` per op, in op order
    pub writes: Vec<(Key, Record)>,
}

/// One conditional transaction
#[derive(Debug)]
pub struct TransactionContext {
    /// Transaction identifier, unique per manager
    pub txn_id: u64,
    /// Current status
    pub status: TransactionStatus,
    ops: Vec<TransactOp>,
    started: Instant,
}

impl TransactionContext {
    /// Create an active transaction over `ops`
    pub fn new(txn_id: u64, ops: Vec<TransactOp>) -> Self {
        Self {
            txn_id,
            status: TransactionStatus::Active,
            ops,
            started: Instant::now(),
        }
    }

    /// Ops of this transaction
    pub fn ops(&self) -> &[TransactOp] {
        &self.ops
    }

    /// Check the transaction is still active
    pub fn ensure_active(&self) -> Result<(), CommitError> {
        match self.status {
            TransactionStatus::Active => Ok(()),
            ref other => Err(CommitError::NotActive(other.to_string())),
        }
    }

    /// Time since the transaction was created
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Reject empty transactions and transactions touching a key twice
    pub fn validate_shape(&self) -> Result<(), CommitError> {
        if self.ops.is_empty() {
            return Err(CommitError::InvalidTransaction(
                "transaction has no operations".to_string(),
            ));
        }
        let mut seen = HashSet::with_capacity(self.ops.len());
        for op in &self.ops {
            if !seen.insert(op.key()) {
                return Err(CommitError::InvalidTransaction(format!(
                    "key {} appears more than once",
                    op.key()
                )));
            }
        }
        Ok(())
    }

    /// Evaluate every condition and compute every post-image
    ///
    /// Reads the live state of `store` at `now` (epoch seconds). Does not
    /// write. On a failed condition every op gets a reason so the caller can
    /// tell which one failed.
    pub fn prepare(&self, store: &ShardedStore, now: i64) -> Result<PreparedWrites, CommitError> {
        self.ensure_active()?;
        self.validate_shape()?;

        let current: Vec<Option<Record>> = self
            .ops
            .iter()
            .map(|op| store.get(op.key(), now).map(|vr| vr.record))
            .collect();

        let reasons: Vec<CancellationReason> = self
            .ops
            .iter()
            .zip(&current)
            .map(|(op, cur)| match op.condition() {
                Some(cond) if !cond.holds(cur.as_ref()) => CancellationReason::ConditionFailed,
                _ => CancellationReason::Passed,
            })
            .collect();

        if reasons.contains(&CancellationReason::ConditionFailed) {
            return Err(CommitError::ConditionFailed(reasons));
        }

        let mut writes = Vec::with_capacity(self.ops.len());
        for (op, cur) in self.ops.iter().zip(current) {
            let record = match op {
                TransactOp::Put { record, .. } => record.clone(),
                TransactOp::Update { key, update, .. } => update
                    .apply(cur.as_ref())
                    .map_err(|e| CommitError::InvalidTransaction(format!("{}: {}", key, e)))?,
            };
            writes.push((op.key().clone(), record));
        }
        Ok(PreparedWrites { writes })
    }

    /// Mark as committed at `version`
    pub fn mark_committed(&mut self, version: u64) {
        self.status = TransactionStatus::Committed { version };
    }

    /// Mark as cancelled by a failed condition
    pub fn mark_cancelled(&mut self) {
        self.status = TransactionStatus::Cancelled;
    }

    /// Mark as aborted
    pub fn mark_aborted(&mut self, reason: impl Into<String>) {
        self.status = TransactionStatus::Aborted {
            reason: reason.into(),
        };
    }
}

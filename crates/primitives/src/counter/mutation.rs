//! Mutation engine
//!
//! One request, one transaction: the ledger insert and the bounded counter
//! update commit together or not at all. When the store cancels the
//! transaction, the per-op cancellation reasons say which condition failed:
//!
//! | Ledger op | Counter op | Outcome |
//! |-----------|------------|---------|
//! | ConditionFailed | any | replay (`idempotent: true`) |
//! | Passed | ConditionFailed | MaxReached / MinReached |
//! | Conflict anywhere, or nothing failed | | transient |
//!
//! A store that cancels without reasons is classified from state instead:
//! ledger record present, then counter at the bound, else transient.
//! Nothing is retried here; a caller retrying with the same key is safe.

use super::error::MutationError;
use super::ledger::{self, COUNTER_OP, LEDGER_OP};
use super::snapshot::{CounterSnapshot, MutationResult};
use super::BoundedCounter;
use chrono::Utc;
use tally_core::{
    Action, CancellationReason, Key, Record, StateStore, StoreError, TransactOutcome,
    TransactReceipt,
};
use tracing::{debug, error, warn};

/// What a cancelled transaction means for the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cancellation {
    /// The key was used before
    Duplicate,
    /// The counter is at the bound for the requested direction
    BoundReached,
    /// Neither condition explains the cancellation
    Unexplained(&'static str),
}

fn classify_reasons(reasons: &[CancellationReason]) -> Cancellation {
    if reasons.len() != 2 {
        return Cancellation::Unexplained("cancellation reasons do not match the submitted ops");
    }
    if reasons[LEDGER_OP] == CancellationReason::ConditionFailed {
        return Cancellation::Duplicate;
    }
    if reasons.contains(&CancellationReason::Conflict) {
        return Cancellation::Unexplained("transaction conflict");
    }
    if reasons[COUNTER_OP] == CancellationReason::ConditionFailed {
        return Cancellation::BoundReached;
    }
    Cancellation::Unexplained("transaction cancelled without a failed condition")
}

impl<S: StateStore> BoundedCounter<S> {
    /// Apply `action` under the idempotency key `idem_key`
    ///
    /// A missing key gets a generated one, so the request is never a
    /// duplicate. Returns the new counter state, or the current one with
    /// `idempotent: true` when the key was already used.
    ///
    /// # Errors
    ///
    /// - [`MutationError::MaxReached`] / [`MutationError::MinReached`]: the
    ///   counter is at the bound; terminal for this request
    /// - [`MutationError::Transient`]: the store failed or the outcome is
    ///   unknown; retry with the same key
    pub fn apply_action(
        &self,
        action: Action,
        idem_key: Option<&str>,
    ) -> Result<MutationResult, MutationError> {
        let id = ledger::resolve_key(idem_key);
        let now = Utc::now();
        let ops = ledger::mutation_ops(&id, action, now, &self.config);

        match self.store.transact(ops)? {
            TransactOutcome::Committed(receipt) => {
                let snapshot = self.committed_snapshot(&receipt)?;
                debug!(
                    key = %id,
                    %action,
                    value = snapshot.value,
                    version = snapshot.version,
                    commit_version = receipt.commit_version,
                    "mutation applied"
                );
                Ok(MutationResult::applied(snapshot))
            }
            TransactOutcome::Cancelled {
                reasons: Some(reasons),
            } => self.resolve(&id, action, classify_reasons(&reasons)),
            TransactOutcome::Cancelled { reasons: None } => {
                let cancellation = self.classify_from_state(&id, action)?;
                self.resolve(&id, action, cancellation)
            }
        }
    }

    /// Increment under `idem_key`
    pub fn increment(&self, idem_key: Option<&str>) -> Result<MutationResult, MutationError> {
        self.apply_action(Action::Increment, idem_key)
    }

    /// Decrement under `idem_key`
    pub fn decrement(&self, idem_key: Option<&str>) -> Result<MutationResult, MutationError> {
        self.apply_action(Action::Decrement, idem_key)
    }

    fn committed_snapshot(&self, receipt: &TransactReceipt) -> Result<CounterSnapshot, StoreError> {
        match receipt.records.get(COUNTER_OP).and_then(Record::as_counter) {
            Some(record) => Ok(CounterSnapshot::from(record)),
            // receipt without post-images
            None => self.get_current(),
        }
    }

    fn classify_from_state(&self, id: &str, action: Action) -> Result<Cancellation, StoreError> {
        if let Some(Record::Idempotency(_)) = self.store.read(&Key::idempotency(id))? {
            return Ok(Cancellation::Duplicate);
        }
        let current = self.get_current()?;
        if ledger::at_bound(action, current.value, &self.config) {
            Ok(Cancellation::BoundReached)
        } else {
            Ok(Cancellation::Unexplained("transaction cancelled without reasons"))
        }
    }

    fn resolve(
        &self,
        id: &str,
        action: Action,
        cancellation: Cancellation,
    ) -> Result<MutationResult, MutationError> {
        match cancellation {
            Cancellation::Duplicate => {
                let current = self.get_current()?;
                debug!(key = %id, %action, value = current.value, "duplicate key, replaying");
                Ok(MutationResult::replayed(current))
            }
            Cancellation::BoundReached => {
                let current = self.get_current()?;
                warn!(
                    key = %id,
                    %action,
                    value = current.value,
                    min = self.config.min_value,
                    max = self.config.max_value,
                    "mutation rejected at bound"
                );
                Err(match action {
                    Action::Increment => MutationError::MaxReached { current },
                    Action::Decrement => MutationError::MinReached { current },
                })
            }
            Cancellation::Unexplained(why) => {
                error!(key = %id, %action, reason = why, "unclassifiable transaction failure");
                Err(MutationError::Transient(StoreError::Unavailable(why.to_string())))
            }
        }
    }
}

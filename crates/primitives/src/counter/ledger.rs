//! Idempotency ledger policy and the mutation transaction
//!
//! Every mutation is one transaction of exactly two ops:
//!
//! | Index | Op | Condition |
//! |-------|----|-----------|
//! | [`LEDGER_OP`] | put the ledger record | key not present |
//! | [`COUNTER_OP`] | add the delta to the counter | strictly inside the bound for the direction |

use super::config::CounterConfig;
use chrono::{DateTime, Utc};
use tally_core::{Action, Condition, IdempotencyRecord, Key, Record, TransactOp, Update};
use uuid::Uuid;

/// Position of the ledger insert in the mutation transaction
pub const LEDGER_OP: usize = 0;
/// Position of the counter update in the mutation transaction
pub const COUNTER_OP: usize = 1;

/// Idempotency key to use for a request
///
/// A missing or empty caller key gets a fresh v4 UUID, so the request can
/// never be a duplicate.
pub fn resolve_key(idem_key: Option<&str>) -> String {
    match idem_key {
        Some(key) if !key.is_empty() => key.to_string(),
        _ => Uuid::new_v4().to_string(),
    }
}

/// Ledger record for a first submission at `now`
pub fn ledger_record(
    id: &str,
    action: Action,
    now: DateTime<Utc>,
    config: &CounterConfig,
) -> IdempotencyRecord {
    let ttl = i64::try_from(config.idempotency_ttl_secs).unwrap_or(i64::MAX);
    IdempotencyRecord {
        id: id.to_string(),
        action,
        created_at: now,
        expires_at: now.timestamp().saturating_add(ttl),
    }
}

/// Condition the counter must satisfy before `action` is applied
pub fn bound_condition(action: Action, config: &CounterConfig) -> Condition {
    match action {
        Action::Increment => Condition::CounterBelow(config.max_value),
        Action::Decrement => Condition::CounterAbove(config.min_value),
    }
}

/// Whether `value` already sits at the bound `action` moves towards
pub fn at_bound(action: Action, value: i64, config: &CounterConfig) -> bool {
    match action {
        Action::Increment => value >= config.max_value,
        Action::Decrement => value <= config.min_value,
    }
}

/// Build the two-op mutation transaction
pub fn mutation_ops(
    id: &str,
    action: Action,
    now: DateTime<Utc>,
    config: &CounterConfig,
) -> Vec<TransactOp> {
    vec![
        TransactOp::Put {
            key: Key::idempotency(id),
            record: Record::Idempotency(ledger_record(id, action, now, config)),
            condition: Some(Condition::NotExists),
        },
        TransactOp::Update {
            key: Key::counter(),
            update: Update::AddToCounter {
                delta: action.delta(),
                at: now,
            },
            condition: Some(bound_condition(action, config)),
        },
    ]
}

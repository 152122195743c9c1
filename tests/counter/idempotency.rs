//! Idempotency Tests
//!
//! One key, one applied delta, however the key is resubmitted.

use crate::*;

#[test]
fn test_replay_returns_first_state() {
    let db = create_db();

    let first = db.counter.increment(Some("k")).unwrap();
    for _ in 0..5 {
        let replay = db.counter.increment(Some("k")).unwrap();
        assert!(replay.idempotent);
        assert_eq!(replay.value, first.value);
        assert_eq!(replay.version, first.version);
    }
    assert_eq!(value(&db), 1);
}

#[test]
fn test_replay_reports_current_state_after_other_writes() {
    let db = create_db();

    db.counter.increment(Some("k")).unwrap();
    db.counter.increment(Some("other")).unwrap();

    let replay = db.counter.increment(Some("k")).unwrap();
    assert!(replay.idempotent);
    assert_eq!(replay.value, 2);
}

#[test]
fn test_key_is_shared_across_actions() {
    let db = create_db();

    db.counter.increment(Some("k")).unwrap();
    let replay = db.counter.decrement(Some("k")).unwrap();
    assert!(replay.idempotent);
    assert_eq!(value(&db), 1);
}

#[test]
fn test_missing_or_empty_key_never_deduplicates() {
    let db = create_db();

    for _ in 0..3 {
        assert!(!db.counter.increment(None).unwrap().idempotent);
        assert!(!db.counter.increment(Some("")).unwrap().idempotent);
    }
    assert_eq!(value(&db), 6);
    assert_eq!(db.metrics().ledger_entries, 6);
}

#[test]
fn test_replay_beats_bound_rejection() {
    let db = create_bounded_db(0, 1);

    db.counter.increment(Some("k")).unwrap();
    // counter is at max; reusing the key is still a replay
    let replay = db.counter.increment(Some("k")).unwrap();
    assert!(replay.idempotent);
    assert_eq!(replay.value, 1);
}

#[test]
fn test_one_ledger_record_per_accepted_key() {
    let db = create_db();

    for key in ["a", "b", "a", "c", "b", "a"] {
        db.counter.increment(Some(key)).unwrap();
    }
    assert_eq!(db.metrics().ledger_entries, 3);
    assert_eq!(value(&db), 3);
}

#[test]
fn test_expired_key_can_be_reused() {
    let db = Tally::builder()
        .in_memory()
        .counter_config(CounterConfig::default().ttl_secs(1))
        .open()
        .unwrap();

    db.counter.increment(Some("k")).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(2100));

    let again = db.counter.increment(Some("k")).unwrap();
    assert!(!again.idempotent);
    assert_eq!(again.value, 2);
}

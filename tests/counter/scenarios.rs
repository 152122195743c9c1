//! End-to-end Scenarios
//!
//! A fresh counter walked through increments, replays and a rejection.

use crate::*;

#[test]
fn test_fresh_counter_increment_and_replay() {
    let db = create_db();

    let snap = db.counter.get().unwrap();
    assert_eq!((snap.value, snap.version), (0, 0));

    let first = db.counter.increment(Some("a")).unwrap();
    assert_eq!((first.value, first.version, first.idempotent), (1, 1, false));

    let replay = db.counter.increment(Some("a")).unwrap();
    assert_eq!((replay.value, replay.version, replay.idempotent), (1, 1, true));

    let fresh = db.counter.increment(None).unwrap();
    assert_eq!((fresh.value, fresh.version, fresh.idempotent), (2, 2, false));
}

#[test]
fn test_decrement_at_minimum_is_rejected() {
    let db = create_db();

    let err = db.counter.decrement(Some("b")).unwrap_err();
    match &err {
        Error::MinReached { current } => {
            assert_eq!(current.value, 0);
            assert_eq!(current.version, 0);
        }
        other => panic!("expected MinReached, got {:?}", other),
    }
    assert!(!err.is_retryable());

    // nothing was written
    assert_eq!(db.counter.get().unwrap().version, 0);
    assert_eq!(db.metrics().ledger_entries, 0);
}

#[test]
fn test_apply_by_name() {
    let db = create_db();

    assert_eq!(db.counter.apply("increment", Some("x")).unwrap().value, 1);
    assert_eq!(db.counter.apply("decrement", Some("y")).unwrap().value, 0);
}

#[test]
fn test_invalid_action_touches_nothing() {
    let db = create_db();

    let err = db.counter.apply("reset", Some("z")).unwrap_err();
    assert!(err.is_validation());
    assert!(matches!(err, Error::InvalidAction(_)));

    let metrics = db.metrics();
    assert_eq!(metrics.transactions_committed, 0);
    assert_eq!(metrics.transactions_cancelled, 0);

    // key was not consumed
    assert!(!db.counter.apply("increment", Some("z")).unwrap().idempotent);
}

#[test]
fn test_results_serialize_for_transport() {
    let db = create_bounded_db(0, 1);

    let ok = serde_json::to_value(db.counter.increment(Some("a")).unwrap()).unwrap();
    assert_eq!(ok["value"], 1);
    assert_eq!(ok["version"], 1);
    assert_eq!(ok["idempotent"], false);
    assert!(ok["updatedAt"].is_string());

    let err = db.counter.increment(Some("b")).unwrap_err();
    let body = serde_json::to_value(err.rejection().unwrap()).unwrap();
    assert_eq!(body["kind"], "MAX_REACHED");
    assert_eq!(body["current"]["value"], 1);
}

#[test]
fn test_closed_database_refuses_requests() {
    let db = create_db();
    db.counter.increment(Some("a")).unwrap();
    db.close().unwrap();

    let err = db.counter.increment(Some("b")).unwrap_err();
    assert!(matches!(err, Error::Transient(_)));
    assert!(!err.is_retryable());
    assert!(db.counter.get().is_err());
}

//! Saturation Tests
//!
//! Requests past a bound are refused with the current state.

use crate::*;

#[test]
fn test_increment_saturates_at_max() {
    let db = create_bounded_db(0, 3);

    for i in 1..=3 {
        assert_eq!(db.counter.increment(None).unwrap().value, i);
    }
    for _ in 0..3 {
        match db.counter.increment(None) {
            Err(Error::MaxReached { current }) => {
                assert_eq!(current.value, 3);
                assert_eq!(current.version, 3);
            }
            other => panic!("expected MaxReached, got {:?}", other),
        }
    }
    assert_eq!(value(&db), 3);
}

#[test]
fn test_decrement_saturates_at_min() {
    let db = create_bounded_db(-2, 10);

    assert_eq!(db.counter.decrement(None).unwrap().value, -1);
    assert_eq!(db.counter.decrement(None).unwrap().value, -2);

    let err = db.counter.decrement(None).unwrap_err();
    assert_eq!(err.rejection().unwrap().kind, "MIN_REACHED");
    assert_eq!(err.rejection().unwrap().current.value, -2);
}

#[test]
fn test_rejection_leaves_key_unused() {
    let db = create_bounded_db(0, 1);

    db.counter.increment(Some("first")).unwrap();
    assert!(db.counter.increment(Some("k")).unwrap_err().is_rejection());

    db.counter.decrement(Some("down")).unwrap();
    let retried = db.counter.increment(Some("k")).unwrap();
    assert!(!retried.idempotent);
    assert_eq!(retried.value, 1);
}

#[test]
fn test_opposite_direction_still_allowed_at_bound() {
    let db = create_bounded_db(0, 1);

    db.counter.increment(None).unwrap();
    assert!(db.counter.increment(None).is_err());
    assert_eq!(db.counter.decrement(None).unwrap().value, 0);
    assert!(db.counter.decrement(None).is_err());
    assert_eq!(db.counter.increment(None).unwrap().value, 1);
}

#[test]
fn test_rejections_counted_as_cancelled() {
    let db = create_bounded_db(0, 1);

    db.counter.increment(None).unwrap();
    let _ = db.counter.increment(None);
    let _ = db.counter.increment(None);

    let metrics = db.metrics();
    assert_eq!(metrics.transactions_committed, 1);
    assert_eq!(metrics.transactions_cancelled, 2);
    assert_eq!(metrics.current_version, 1);
}

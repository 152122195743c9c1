//! Durability Tests
//!
//! Committed mutations and the ledger survive a reopen.

use crate::*;
use std::io::Write;

fn open_strict(dir: &std::path::Path) -> Tally {
    Tally::builder()
        .path(dir)
        .strict()
        .counter_config(CounterConfig::with_bounds(0, 100))
        .open()
        .unwrap()
}

#[test]
fn test_counter_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let db = open_strict(dir.path());
        for i in 0..5 {
            db.counter.increment(Some(&format!("k{}", i))).unwrap();
        }
        db.counter.decrement(Some("d")).unwrap();
        db.close().unwrap();
    }

    let db = open_strict(dir.path());
    let snap = db.counter.get().unwrap();
    assert_eq!((snap.value, snap.version), (4, 6));
    assert_eq!(db.recovery().unwrap().transactions_recovered, 6);
}

#[test]
fn test_ledger_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let db = open_strict(dir.path());
        db.counter.increment(Some("k")).unwrap();
    }

    let db = open_strict(dir.path());
    let replay = db.counter.increment(Some("k")).unwrap();
    assert!(replay.idempotent);
    assert_eq!(replay.value, 1);
}

#[test]
fn test_buffered_mode_survives_close() {
    let dir = tempfile::tempdir().unwrap();
    {
        let db = Tally::open(dir.path()).unwrap();
        assert_eq!(db.durability_mode(), DurabilityMode::Buffered);
        db.counter.increment(None).unwrap();
        db.flush().unwrap();
        db.close().unwrap();
    }

    let db = Tally::open(dir.path()).unwrap();
    assert_eq!(value(&db), 1);
}

#[test]
fn test_torn_tail_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    {
        let db = open_strict(dir.path());
        db.counter.increment(Some("a")).unwrap();
        db.counter.increment(Some("b")).unwrap();
    }

    // half-written frame from a crash mid-append
    let wal = dir.path().join(tally_engine::WAL_FILENAME);
    let mut file = std::fs::OpenOptions::new().append(true).open(&wal).unwrap();
    file.write_all(&[0x40, 0x00, 0x00, 0x00, 0xAB]).unwrap();
    drop(file);

    {
        let db = open_strict(dir.path());
        let recovery = db.recovery().unwrap();
        assert!(recovery.corrupt_tail);
        assert_eq!(recovery.transactions_recovered, 2);
        assert_eq!(value(&db), 2);

        // new commits land after the valid prefix
        db.counter.increment(Some("c")).unwrap();
    }

    let db = open_strict(dir.path());
    assert!(!db.recovery().unwrap().corrupt_tail);
    assert_eq!(value(&db), 3);
}

#[test]
fn test_ephemeral_writes_nothing() {
    let db = create_db();
    db.counter.increment(None).unwrap();
    assert!(db.is_ephemeral());
    assert!(db.path().is_none());
    assert!(db.recovery().is_none());
}

//! Concurrency Tests
//!
//! Many threads, one counter: the store serializes every commit.

use crate::*;
use std::sync::{Arc, Barrier};
use std::thread;

const THREADS: usize = 8;

fn run_concurrently<F>(db: &Arc<Tally>, per_thread: F) -> Vec<Vec<tally::Result<MutationResult>>>
where
    F: Fn(&Tally, usize) -> Vec<tally::Result<MutationResult>> + Send + Sync + 'static,
{
    let barrier = Arc::new(Barrier::new(THREADS));
    let per_thread = Arc::new(per_thread);
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let db = Arc::clone(db);
            let barrier = Arc::clone(&barrier);
            let per_thread = Arc::clone(&per_thread);
            thread::spawn(move || {
                barrier.wait();
                (*per_thread)(&*db, t)
            })
        })
        .collect();

    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

#[test]
fn test_same_key_applied_once() {
    let db = Arc::new(create_db());

    let results = run_concurrently(&db, |db, _| vec![db.counter.increment(Some("shared"))]);
    let results: Vec<_> = results.into_iter().flatten().map(|r| r.unwrap()).collect();

    let applied: Vec<_> = results.iter().filter(|r| !r.idempotent).collect();
    assert_eq!(applied.len(), 1, "exactly one request applies the delta");
    assert!(results.iter().all(|r| r.value == 1));
    assert_eq!(value(&db), 1);
    assert_eq!(db.metrics().ledger_entries, 1);
}

#[test]
fn test_distinct_keys_all_applied() {
    let db = Arc::new(create_db());
    const PER_THREAD: usize = 50;

    run_concurrently(&db, |db, t| {
        (0..PER_THREAD)
            .map(|i| db.counter.increment(Some(&format!("t{}-{}", t, i))))
            .collect()
    })
    .into_iter()
    .flatten()
    .for_each(|r| assert!(!r.unwrap().idempotent));

    let snap = db.counter.get().unwrap();
    assert_eq!(snap.value, (THREADS * PER_THREAD) as i64);
    assert_eq!(snap.version, (THREADS * PER_THREAD) as u64);
}

#[test]
fn test_contended_max_never_exceeded() {
    let db = Arc::new(create_bounded_db(0, 10));

    let results: Vec<_> = run_concurrently(&db, |db, _| {
        (0..5).map(|_| db.counter.increment(None)).collect()
    })
    .into_iter()
    .flatten()
    .collect();

    let accepted = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(Error::MaxReached { .. })))
        .count();
    assert_eq!(accepted, 10);
    assert_eq!(rejected, THREADS * 5 - 10);
    assert_eq!(value(&db), 10);
}

#[test]
fn test_mixed_directions_stay_in_bounds() {
    let db = Arc::new(create_bounded_db(0, 3));

    let results: Vec<_> = run_concurrently(&db, |db, t| {
        (0..40)
            .map(|i| {
                if (t + i) % 2 == 0 {
                    db.counter.increment(None)
                } else {
                    db.counter.decrement(None)
                }
            })
            .collect()
    })
    .into_iter()
    .flatten()
    .collect();

    for result in &results {
        match result {
            Ok(r) => assert!((0..=3).contains(&r.value)),
            Err(e) => assert!(e.is_rejection(), "unexpected error: {:?}", e),
        }
    }

    let accepted = results.iter().filter(|r| r.is_ok()).count() as u64;
    let snap = db.counter.get().unwrap();
    assert!((0..=3).contains(&snap.value));
    assert_eq!(snap.version, accepted);
}

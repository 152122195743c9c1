//! Property Tests
//!
//! Random request sequences against small bounds.

use crate::create_bounded_db;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Request {
    Inc(u8),
    Dec(u8),
}

fn request() -> impl Strategy<Value = Request> {
    // few distinct keys so replays are common
    prop_oneof![
        (0u8..6).prop_map(Request::Inc),
        (0u8..6).prop_map(Request::Dec),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_bounds_and_versions(
        min in -3i64..=0,
        span in 1i64..6,
        requests in prop::collection::vec(request(), 1..60),
    ) {
        let max = min + span;
        prop_assume!(max >= 0);
        let db = create_bounded_db(min, max);

        let mut last_version = 0u64;
        let mut applied = 0u64;
        let mut seen_keys = std::collections::HashSet::new();

        for req in requests {
            let (result, key) = match req {
                Request::Inc(k) => (db.counter.increment(Some(&format!("k{}", k))), k),
                Request::Dec(k) => (db.counter.decrement(Some(&format!("k{}", k))), k),
            };
            match result {
                Ok(r) => {
                    prop_assert!(r.value >= min && r.value <= max);
                    prop_assert!(r.version >= last_version);
                    // a replay means the key was accepted before
                    prop_assert_eq!(r.idempotent, seen_keys.contains(&key));
                    if !r.idempotent {
                        prop_assert_eq!(r.version, last_version + 1);
                        applied += 1;
                        seen_keys.insert(key);
                    }
                    last_version = r.version;
                }
                Err(e) => {
                    prop_assert!(e.is_rejection());
                    prop_assert!(!seen_keys.contains(&key));
                    let current = e.rejection().unwrap().current;
                    prop_assert!(current.value == min || current.value == max);
                }
            }
        }

        let snap = db.counter.get().unwrap();
        prop_assert_eq!(snap.version, applied);
        prop_assert_eq!(db.metrics().ledger_entries as u64, applied);
    }
}

//! Configuration Tests

use crate::*;

#[test]
fn test_invalid_bounds_rejected_at_open() {
    for (min, max) in [(1, 10), (-10, -1), (5, 5)] {
        let err = Tally::builder()
            .in_memory()
            .counter_config(CounterConfig::with_bounds(min, max))
            .open()
            .err()
            .expect("open should fail");
        assert!(matches!(err, Error::Config(_)), "({}, {})", min, max);
    }
}

#[test]
fn test_zero_ttl_rejected_at_open() {
    let result = Tally::builder()
        .in_memory()
        .counter_config(CounterConfig::default().ttl_secs(0))
        .open();
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_config_from_toml() {
    let config = CounterConfig::from_toml_str(
        r#"
        min_value = -5
        max_value = 5
        idempotency_ttl_secs = 30
        "#,
    )
    .unwrap();

    let db = Tally::builder()
        .in_memory()
        .counter_config(config.clone())
        .open()
        .unwrap();
    assert_eq!(db.counter.config(), &config);

    for _ in 0..5 {
        db.counter.decrement(None).unwrap();
    }
    assert!(matches!(
        db.counter.decrement(None),
        Err(Error::MinReached { .. })
    ));
}

#[test]
fn test_invalid_config_fails_before_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db");
    let result = Tally::builder()
        .path(&path)
        .counter_config(CounterConfig::with_bounds(0, 0))
        .open();
    assert!(result.is_err());
    assert!(!path.exists());
}

//! Counter Test Suite
//!
//! End-to-end tests of the bounded counter through the `Tally` facade.
//!
//! ## Key Verification Points
//!
//! 1. The value never leaves `[min_value, max_value]`
//! 2. One idempotency key, at most one applied delta
//! 3. Bound violations are rejected with the current state
//! 4. Versions only move forward
//! 5. Committed mutations survive a reopen
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test counter
//!
//! # Concurrency tests only
//! cargo test --test counter concurrency::
//! ```

use tally::prelude::*;

// Test modules
pub mod bounds;
pub mod concurrency;
pub mod config;
pub mod durability;
pub mod idempotency;
pub mod properties;
pub mod scenarios;

// =============================================================================
// SHARED TEST UTILITIES
// =============================================================================

/// Install a test subscriber so `RUST_LOG=debug` shows engine logs
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Ephemeral database with default bounds
pub fn create_db() -> Tally {
    init_tracing();
    Tally::builder()
        .in_memory()
        .counter_config(CounterConfig::default())
        .open()
        .expect("Failed to create ephemeral database")
}

/// Ephemeral database with the given bounds
pub fn create_bounded_db(min: i64, max: i64) -> Tally {
    init_tracing();
    Tally::builder()
        .in_memory()
        .counter_config(CounterConfig::with_bounds(min, max))
        .open()
        .expect("Failed to create ephemeral database")
}

/// Current counter value
pub fn value(db: &Tally) -> i64 {
    db.counter.get().unwrap().value
}

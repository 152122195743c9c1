//! Main database entry point for Tally.
//!
//! This module provides the `Tally` struct, the primary entry point for
//! all counter operations.

use crate::error::{Error, Result};
use crate::primitives::Counter;
use crate::types::{CounterConfig, DurabilityMode, RecoveryResult};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// The Tally database.
///
/// Create one with [`Tally::open`], [`Tally::ephemeral`] or
/// [`Tally::builder`].
///
/// # Example
///
/// ```ignore
/// use tally::prelude::*;
///
/// let db = Tally::open("./tally-data")?;
/// db.counter.increment(Some("req-1"))?;
/// db.close()?;
/// ```
pub struct Tally {
    /// The underlying engine database
    pub(crate) inner: Arc<tally_engine::Database>,

    /// Counter operations
    pub counter: Counter,
}

impl Tally {
    /// Open a database at the given path.
    ///
    /// Uses default settings: buffered durability, default counter config
    /// with `TALLY_*` environment overrides applied.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder().path(path).open()
    }

    /// Create an ephemeral database with no disk I/O.
    ///
    /// No files, no WAL, nothing survives a drop. Meant for tests.
    ///
    /// # Comparison
    ///
    /// | Method | Disk Files | Recovery |
    /// |--------|------------|----------|
    /// | `Tally::ephemeral()` | None | No |
    /// | `Tally::open(path)` | User dir | Yes |
    pub fn ephemeral() -> Result<Self> {
        Self::builder().in_memory().open()
    }

    /// Create a builder for database configuration.
    pub fn builder() -> TallyBuilder {
        TallyBuilder::new()
    }

    /// Force all logged commits to disk.
    ///
    /// In buffered mode commits reach the OS on every write but are only
    /// fsynced here and on close.
    pub fn flush(&self) -> Result<()> {
        self.inner.flush().map_err(Into::into)
    }

    /// Gracefully close the database.
    ///
    /// Stops the ledger sweeper and flushes the WAL. Later requests fail
    /// with a non-retryable store error.
    pub fn close(&self) -> Result<()> {
        self.inner.shutdown().map_err(Into::into)
    }

    /// Get the database directory path, `None` when ephemeral.
    pub fn path(&self) -> Option<&Path> {
        self.inner.data_dir()
    }

    /// Get the current durability mode.
    pub fn durability_mode(&self) -> DurabilityMode {
        self.inner.durability_mode()
    }

    /// Check if this is an ephemeral (no-disk) database.
    pub fn is_ephemeral(&self) -> bool {
        self.inner.is_ephemeral()
    }

    /// What the WAL replay found when the database was opened.
    pub fn recovery(&self) -> Option<&RecoveryResult> {
        self.inner.recovery_result()
    }

    /// Drop expired ledger records now; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.inner.purge_expired()
    }

    /// Get database metrics.
    pub fn metrics(&self) -> DatabaseMetrics {
        let txn_metrics = self.inner.metrics();
        DatabaseMetrics {
            transactions_committed: txn_metrics.total_committed,
            transactions_cancelled: txn_metrics.total_cancelled,
            transactions_aborted: txn_metrics.total_aborted,
            commit_rate: txn_metrics.commit_rate(),
            current_version: self.inner.current_version(),
            ledger_entries: self
                .inner
                .storage()
                .table_entry_count(tally_core::Table::Idempotency),
        }
    }
}

/// Database metrics.
#[derive(Debug, Clone)]
pub struct DatabaseMetrics {
    /// Transactions applied
    pub transactions_committed: u64,
    /// Transactions rejected by a failed condition (replays and rejections)
    pub transactions_cancelled: u64,
    /// Transactions that failed for any other reason
    pub transactions_aborted: u64,
    /// Commit success rate (0.0 - 1.0)
    pub commit_rate: f64,
    /// Commit version of the last applied transaction
    pub current_version: u64,
    /// Ledger records held, including expired ones not yet purged
    pub ledger_entries: usize,
}

/// Builder for database configuration.
///
/// # Example
///
/// ```ignore
/// // Production: disk-backed, fsync per commit, hourly ledger sweep
/// let db = Tally::builder()
///     .path("./tally-data")
///     .strict()
///     .ttl_sweep_interval(Duration::from_secs(3600))
///     .open()?;
///
/// // Tests: no disk, small bounds
/// let db = Tally::builder()
///     .in_memory()
///     .counter_config(CounterConfig::with_bounds(0, 3))
///     .open()?;
/// ```
pub struct TallyBuilder {
    inner: tally_engine::DatabaseBuilder,
    config: Option<CounterConfig>,
}

impl TallyBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            inner: tally_engine::DatabaseBuilder::new(),
            config: None,
        }
    }

    /// Set the database directory path.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.inner = self.inner.path(path.as_ref());
        self
    }

    /// No WAL and no disk files. All data is lost on drop.
    pub fn in_memory(mut self) -> Self {
        self.inner = self.inner.in_memory();
        self
    }

    /// Use buffered mode (default).
    ///
    /// Every commit reaches the OS; fsync happens on flush and close.
    pub fn buffered(mut self) -> Self {
        self.inner = self.inner.buffered();
        self
    }

    /// Use strict mode (safest, slowest).
    ///
    /// Syncs to disk on every commit. Zero data loss on crash.
    pub fn strict(mut self) -> Self {
        self.inner = self.inner.strict();
        self
    }

    /// Set the durability mode explicitly.
    pub fn durability(mut self, mode: DurabilityMode) -> Self {
        self.inner = self.inner.durability(mode);
        self
    }

    /// Purge expired ledger records in the background every `interval`.
    pub fn ttl_sweep_interval(mut self, interval: Duration) -> Self {
        self.inner = self.inner.ttl_sweep_interval(interval);
        self
    }

    /// Use this counter config instead of defaults plus environment.
    pub fn counter_config(mut self, config: CounterConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Open the database.
    ///
    /// Validates the counter config before touching the disk.
    pub fn open(self) -> Result<Tally> {
        let config = match self.config {
            Some(config) => config,
            None => CounterConfig::default().with_env_overrides()?,
        };
        config.validate()?;

        let db = Arc::new(self.inner.open().map_err(Error::from)?);
        Ok(Tally::from_engine(db, config))
    }
}

impl Default for TallyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Tally {
    /// Create Tally from an engine Database.
    fn from_engine(db: Arc<tally_engine::Database>, config: CounterConfig) -> Self {
        Self {
            counter: Counter::new(db.clone(), config),
            inner: db,
        }
    }
}

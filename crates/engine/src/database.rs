//! The transactional store
//!
//! [`Database`] wires the sharded storage, the transaction manager and the
//! WAL together and exposes them through the
//! [`StateStore`](tally_core::StateStore) contract.
//!
//! ```ignore
//! use tally_engine::Database;
//!
//! // Ephemeral mode for testing (no disk files)
//! let db = Database::ephemeral()?;
//!
//! // Strict mode for maximum durability
//! let db = Database::builder()
//!     .path("/data/tally")
//!     .strict()
//!     .open()?;
//! ```

use chrono::Utc;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tally_concurrency::{CommitError, TransactionContext, TransactionManager, TransactionMetrics};
use tally_core::error::{Result, StoreError};
use tally_core::types::Key;
use tally_core::{Record, StateStore, TransactOp, TransactOutcome};
use tally_durability::{recover, DurabilityMode, RecoveryResult, WAL};
use tally_storage::{ShardedStore, TTLCleaner};

/// Name of the WAL file inside the data directory
pub const WAL_FILENAME: &str = "wal.dat";

/// Transactional key-value store with conditional writes
pub struct Database {
    data_dir: Option<PathBuf>,
    storage: Arc<ShardedStore>,
    manager: TransactionManager,
    wal: Option<Mutex<WAL>>,
    mode: DurabilityMode,
    cleaner: Mutex<Option<TTLCleaner>>,
    recovery: Option<RecoveryResult>,
    closed: AtomicBool,
}

impl Database {
    /// Open a database at `path` with buffered durability
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder().path(path).open()
    }

    /// Create a database with no disk I/O
    ///
    /// No WAL, nothing survives the process.
    pub fn ephemeral() -> Result<Self> {
        Self::builder().in_memory().open()
    }

    /// Create a builder for database configuration
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    /// Direct access to the underlying storage
    pub fn storage(&self) -> &Arc<ShardedStore> {
        &self.storage
    }

    /// Transaction outcome counters
    pub fn metrics(&self) -> TransactionMetrics {
        self.manager.metrics()
    }

    /// Current commit version
    pub fn current_version(&self) -> u64 {
        self.manager.current_version()
    }

    /// Result of the WAL replay performed at open, if any
    pub fn recovery_result(&self) -> Option<&RecoveryResult> {
        self.recovery.as_ref()
    }

    /// Data directory, `None` for in-memory databases
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// Durability mode in effect
    pub fn durability_mode(&self) -> DurabilityMode {
        self.mode
    }

    /// Whether the database does no disk I/O
    pub fn is_ephemeral(&self) -> bool {
        self.wal.is_none()
    }

    /// Remove expired records now
    ///
    /// Returns the number of records removed.
    pub fn purge_expired(&self) -> usize {
        self.storage.purge_expired(Utc::now().timestamp())
    }

    /// Flush and fsync the WAL
    pub fn flush(&self) -> Result<()> {
        if let Some(wal) = &self.wal {
            wal.lock().fsync()?;
        }
        Ok(())
    }

    /// Stop background work, flush, and refuse further requests
    pub fn shutdown(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if let Some(mut cleaner) = self.cleaner.lock().take() {
            cleaner.shutdown();
        }
        let flushed = self.flush();
        tracing::info!(metrics = ?self.manager.metrics(), "database shut down");
        flushed
    }

    /// Whether [`Database::shutdown`] has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }
}

impl StateStore for Database {
    fn read(&self, key: &Key) -> Result<Option<Record>> {
        self.ensure_open()?;
        Ok(self
            .storage
            .get(key, Utc::now().timestamp())
            .map(|vr| vr.record))
    }

    fn transact(&self, ops: Vec<TransactOp>) -> Result<TransactOutcome> {
        self.ensure_open()?;
        let mut txn = TransactionContext::new(self.manager.next_txn_id(), ops);
        let mut wal = self.wal.as_ref().map(|w| w.lock());

        match self
            .manager
            .commit(&mut txn, &self.storage, wal.as_deref_mut())
        {
            Ok(receipt) => Ok(TransactOutcome::Committed(receipt)),
            Err(CommitError::ConditionFailed(reasons)) => Ok(TransactOutcome::Cancelled {
                reasons: Some(reasons),
            }),
            Err(CommitError::WALError(msg)) => Err(StoreError::Unavailable(msg)),
            Err(e) => Err(StoreError::Storage(e.to_string())),
        }
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::warn!(error = %e, "flush on drop failed");
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("data_dir", &self.data_dir)
            .field("mode", &self.mode)
            .field("version", &self.manager.current_version())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Builder for database configuration
///
/// # Example
///
/// ```ignore
/// let db = Database::builder()
///     .path("./tally-data")
///     .strict()
///     .ttl_sweep_interval(Duration::from_secs(30))
///     .open()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct DatabaseBuilder {
    path: Option<PathBuf>,
    mode: DurabilityMode,
    ttl_sweep_interval: Option<Duration>,
}

impl DatabaseBuilder {
    /// Create a new builder with default settings (buffered durability)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the data directory
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the durability mode explicitly
    pub fn durability(mut self, mode: DurabilityMode) -> Self {
        self.mode = mode;
        self
    }

    /// No WAL, no disk files
    pub fn in_memory(self) -> Self {
        self.durability(DurabilityMode::InMemory)
    }

    /// Flush to the OS on every commit, fsync on flush/shutdown (default)
    pub fn buffered(self) -> Self {
        self.durability(DurabilityMode::Buffered)
    }

    /// fsync on every commit
    pub fn strict(self) -> Self {
        self.durability(DurabilityMode::Strict)
    }

    /// Purge expired records in the background every `interval`
    pub fn ttl_sweep_interval(mut self, interval: Duration) -> Self {
        self.ttl_sweep_interval = Some(interval);
        self
    }

    /// Open the database, replaying the WAL if there is one
    pub fn open(self) -> Result<Database> {
        let storage = Arc::new(ShardedStore::new());
        let mode = self.mode;

        let (data_dir, wal, recovery, manager) = if mode.requires_wal() {
            let dir = self.path.ok_or_else(|| {
                StoreError::Storage(format!("{:?} durability requires a path", mode))
            })?;
            std::fs::create_dir_all(&dir)?;
            let wal_path = dir.join(WAL_FILENAME);

            let result = recover(&wal_path, &storage, Utc::now().timestamp())?;
            let wal = WAL::open_truncated(&wal_path, mode, result.valid_len)?;
            let manager = TransactionManager::with_txn_id(result.final_version, result.max_txn_id);
            (Some(dir), Some(Mutex::new(wal)), Some(result), manager)
        } else {
            (self.path, None, None, TransactionManager::new(0))
        };

        let cleaner = match self.ttl_sweep_interval {
            Some(interval) => Some(TTLCleaner::start(Arc::clone(&storage), interval)?),
            None => None,
        };

        tracing::info!(
            mode = mode.description(),
            path = ?data_dir,
            version = manager.current_version(),
            "database opened"
        );

        Ok(Database {
            data_dir,
            storage,
            manager,
            wal,
            mode,
            cleaner: Mutex::new(cleaner),
            recovery,
            closed: AtomicBool::new(false),
        })
    }
}

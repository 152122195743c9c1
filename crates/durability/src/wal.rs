//! Write-ahead log
//!
//! Entry types:
//! - BeginTxn: Start of a transaction
//! - Write: One record written by the transaction
//! - CommitTxn: Successful transaction completion (the durability point)
//!
//! Only committed transactions are ever written: the transaction manager
//! validates conditions before touching the log, so a cancelled transaction
//! leaves no trace here.

use crate::encoding::{decode_entry, encode_entry, DecodeError};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tally_core::error::{Result, StoreError};
use tally_core::types::Key;
use tally_core::VersionedRecord;

/// Durability mode for WAL writes.
///
/// # Mode Comparison
///
/// | Mode | WAL | fsync | Data Loss Window |
/// |------|-----|-------|------------------|
/// | InMemory | None | None | All (on crash) |
/// | Buffered | Append | On flush/shutdown | Since last flush |
/// | Strict | Append | Every commit | Zero |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurabilityMode {
    /// No WAL, no file I/O
    InMemory,
    /// Entries reach the OS on every commit, fsync on flush
    #[default]
    Buffered,
    /// fsync after every commit
    Strict,
}

impl DurabilityMode {
    /// Check if this mode requires WAL persistence.
    pub fn requires_wal(&self) -> bool {
        !matches!(self, DurabilityMode::InMemory)
    }

    /// Check if this mode requires fsync on every commit.
    pub fn requires_immediate_fsync(&self) -> bool {
        matches!(self, DurabilityMode::Strict)
    }

    /// Human-readable description of the mode.
    pub fn description(&self) -> &'static str {
        match self {
            DurabilityMode::InMemory => "No durability (all data lost on exit)",
            DurabilityMode::Buffered => "Buffered fsync (balanced speed/safety)",
            DurabilityMode::Strict => "Sync fsync (safest, slowest)",
        }
    }
}

/// WAL entry types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum WALEntry {
    /// Begin transaction
    BeginTxn {
        /// Transaction identifier
        txn_id: u64,
        /// Wall-clock time the commit started (microseconds since epoch)
        timestamp: i64,
    },

    /// One record written by the transaction
    Write {
        /// Transaction this write belongs to
        txn_id: u64,
        /// Key being written
        key: Key,
        /// Record with its commit version
        record: VersionedRecord,
    },

    /// Commit transaction
    ///
    /// All writes of this transaction are durable once this entry is.
    CommitTxn {
        /// Transaction identifier
        txn_id: u64,
    },
}

impl WALEntry {
    /// Transaction this entry belongs to
    pub fn txn_id(&self) -> u64 {
        match self {
            WALEntry::BeginTxn { txn_id, .. }
            | WALEntry::Write { txn_id, .. }
            | WALEntry::CommitTxn { txn_id } => *txn_id,
        }
    }

    /// Check if entry is a transaction boundary
    pub fn is_txn_boundary(&self) -> bool {
        matches!(self, WALEntry::BeginTxn { .. } | WALEntry::CommitTxn { .. })
    }
}

/// Entries read back from a WAL file
#[derive(Debug, Default)]
pub struct WalContents {
    /// Every entry decoded, in file order
    pub entries: Vec<WALEntry>,
    /// Byte length of the decodable prefix
    pub valid_len: u64,
    /// Why decoding stopped before end of file, if it did
    pub tail_error: Option<DecodeError>,
}

/// Append-only write-ahead log file
///
/// `committed_len` is the file length up to the last frame known to have
/// reached the OS. A transaction that fails part way is cut back to it, so
/// its frames can never be flushed behind a later commit.
pub struct WAL {
    path: PathBuf,
    /// `None` once a rollback failed; the log refuses writes until reopened
    writer: Option<BufWriter<File>>,
    mode: DurabilityMode,
    entries_written: u64,
    committed_len: u64,
    written_len: u64,
}

impl WAL {
    /// Open (or create) a WAL for appending
    pub fn open(path: impl AsRef<Path>, mode: DurabilityMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let len = file.metadata()?.len();
        Ok(Self::with_file(path, file, mode, len))
    }

    /// Open a WAL, cutting it back to `valid_len` bytes first
    ///
    /// Used after recovery so that new entries never follow a torn tail.
    pub fn open_truncated(
        path: impl AsRef<Path>,
        mode: DurabilityMode,
        valid_len: u64,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = Self::open_at(&path, valid_len)?;
        let len = file.metadata()?.len();
        Ok(Self::with_file(path, file, mode, len))
    }

    fn with_file(path: PathBuf, file: File, mode: DurabilityMode, len: u64) -> Self {
        Self {
            path,
            writer: Some(BufWriter::new(file)),
            mode,
            entries_written: 0,
            committed_len: len,
            written_len: len,
        }
    }

    fn open_at(path: &Path, len: u64) -> Result<File> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;
        if file.metadata()?.len() > len {
            tracing::warn!(
                path = %path.display(),
                len,
                "truncating WAL after last valid entry"
            );
            file.set_len(len)?;
            file.sync_all()?;
        }
        file.seek(SeekFrom::End(0))?;
        Ok(file)
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>> {
        self.writer.as_mut().ok_or_else(|| {
            StoreError::Unavailable(format!(
                "WAL {} is poisoned after a failed rollback, reopen the database",
                self.path.display()
            ))
        })
    }

    /// Append one entry to the write buffer
    pub fn append(&mut self, entry: &WALEntry) -> Result<()> {
        let frame = encode_entry(entry).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.writer()?.write_all(&frame)?;
        self.entries_written += 1;
        self.written_len += frame.len() as u64;
        Ok(())
    }

    /// Make everything appended so far survive a process crash
    ///
    /// Flushes the buffer to the OS; in Strict mode also fsyncs.
    pub fn commit_point(&mut self) -> Result<()> {
        let strict = self.mode.requires_immediate_fsync();
        let writer = self.writer()?;
        writer.flush()?;
        if strict {
            writer.get_ref().sync_data()?;
        }
        self.committed_len = self.written_len;
        Ok(())
    }

    /// Log one transaction and reach its commit point
    ///
    /// On any failure the transaction's frames are discarded and the file is
    /// cut back to where it began, so the error means the transaction is not
    /// in the log. If that cut fails too the WAL is poisoned.
    pub fn append_txn(&mut self, entries: &[WALEntry]) -> Result<()> {
        self.writer()?;
        match self.write_txn(entries) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.rollback();
                Err(e)
            }
        }
    }

    fn write_txn(&mut self, entries: &[WALEntry]) -> Result<()> {
        for entry in entries {
            self.append(entry)?;
        }
        self.commit_point()
    }

    fn rollback(&mut self) {
        // into_parts hands back the buffer instead of flushing it
        if let Some(stale) = self.writer.take() {
            let _discarded = stale.into_parts();
        }
        match Self::open_at(&self.path, self.committed_len) {
            Ok(file) => {
                tracing::warn!(
                    path = %self.path.display(),
                    len = self.committed_len,
                    "discarded failed WAL transaction"
                );
                self.writer = Some(BufWriter::new(file));
                self.written_len = self.committed_len;
            }
            Err(e) => {
                tracing::error!(
                    path = %self.path.display(),
                    error = %e,
                    "WAL rollback failed, refusing further commits"
                );
            }
        }
    }

    /// Check if an earlier rollback failed
    pub fn is_poisoned(&self) -> bool {
        self.writer.is_none()
    }

    /// Flush and fsync regardless of mode
    pub fn fsync(&mut self) -> Result<()> {
        let writer = self.writer()?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        self.committed_len = self.written_len;
        Ok(())
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Durability mode of this log
    pub fn mode(&self) -> DurabilityMode {
        self.mode
    }

    /// Entries appended through this handle
    pub fn entries_written(&self) -> u64 {
        self.entries_written
    }

    /// Read every decodable entry of a WAL file
    ///
    /// A missing file reads as empty. Decoding stops at the first frame that
    /// is incomplete or fails its checksum; everything after it is ignored.
    pub fn read_entries(path: impl AsRef<Path>) -> Result<WalContents> {
        let mut buf = Vec::new();
        match File::open(path.as_ref()) {
            Ok(mut file) => {
                file.read_to_end(&mut buf)?;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(WalContents::default())
            }
            Err(e) => return Err(e.into()),
        }

        let mut contents = WalContents::default();
        let mut offset = 0usize;
        while offset < buf.len() {
            match decode_entry(&buf[offset..]) {
                Ok((entry, consumed)) => {
                    contents.entries.push(entry);
                    offset += consumed;
                }
                Err(e) => {
                    contents.tail_error = Some(e);
                    break;
                }
            }
        }
        contents.valid_len = offset as u64;
        Ok(contents)
    }
}

impl std::fmt::Debug for WAL {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WAL")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("entries_written", &self.entries_written)
            .field("committed_len", &self.committed_len)
            .field("poisoned", &self.is_poisoned())
            .finish()
    }
}

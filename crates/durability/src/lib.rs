//! Durability layer for tally
//!
//! This crate implements write-ahead logging and recovery:
//! - WAL: Append-only write-ahead log
//! - WALEntry types: BeginTxn, Write, CommitTxn
//! - Entry framing with CRC32 checksums
//! - Durability modes: InMemory, Buffered (default), Strict
//! - Recovery: Replay committed transactions into storage

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod encoding;
pub mod recovery;
pub mod wal;

pub use encoding::{decode_entry, encode_entry, DecodeError};
pub use recovery::{recover, RecoveryResult};
pub use wal::{DurabilityMode, WALEntry, WalContents, WAL};

//! WAL entry framing
//!
//! Each entry is written as:
//!
//! ```text
//! +-----------+-----------+----------------------+
//! | len (u32) | crc (u32) | payload (len bytes)  |
//! +-----------+-----------+----------------------+
//! ```
//!
//! Both integers are little-endian. `crc` is the CRC32 of the payload and the
//! payload is the bincode encoding of a [`WALEntry`].

use crate::wal::WALEntry;
use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

/// Size of the `len` + `crc` header
pub const HEADER_SIZE: usize = 8;

/// Why a frame could not be decoded
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer ends before the frame does (torn write)
    #[error("incomplete entry: need {needed} bytes, have {have}")]
    Incomplete {
        /// Bytes available
        have: usize,
        /// Bytes the frame requires
        needed: usize,
    },

    /// The payload does not match its checksum
    #[error("checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch {
        /// Checksum stored in the header
        expected: u32,
        /// Checksum of the payload as read
        actual: u32,
    },

    /// The payload is not a valid entry
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Encode an entry into a frame
pub fn encode_entry(entry: &WALEntry) -> Result<Vec<u8>, bincode::Error> {
    let payload = bincode::serialize(entry)?;
    let mut header = [0u8; HEADER_SIZE];
    LittleEndian::write_u32(&mut header[0..4], payload.len() as u32);
    LittleEndian::write_u32(&mut header[4..8], crc32fast::hash(&payload));
    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.extend_from_slice(&header);
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Decode the frame at the start of `buf`
///
/// Returns the entry and the number of bytes consumed.
pub fn decode_entry(buf: &[u8]) -> Result<(WALEntry, usize), DecodeError> {
    if buf.len() < HEADER_SIZE {
        return Err(DecodeError::Incomplete {
            have: buf.len(),
            needed: HEADER_SIZE,
        });
    }

    let len = LittleEndian::read_u32(&buf[0..4]) as usize;
    let expected = LittleEndian::read_u32(&buf[4..8]);
    let needed = HEADER_SIZE + len;
    if buf.len() < needed {
        return Err(DecodeError::Incomplete {
            have: buf.len(),
            needed,
        });
    }

    let payload = &buf[HEADER_SIZE..needed];
    let actual = crc32fast::hash(payload);
    if actual != expected {
        return Err(DecodeError::ChecksumMismatch { expected, actual });
    }

    let entry = bincode::deserialize(payload).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    Ok((entry, needed))
}

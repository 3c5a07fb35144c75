//! Log entry encoding and decoding
//!
//! ## Entry Format
//!
//! ```text
//! [length: u32][type: u8][payload: bytes][crc32: u32]
//! ```
//!
//! - **length**: size of type + payload + crc (NOT including length itself)
//! - **type**: 1 = Put, 2 = Delete
//! - **payload**: MessagePack-encoded `Record` (Put) or `RecordId` (Delete)
//! - **crc32**: checksum over \[type\]\[payload\]
//!
//! All integers are little-endian.

use crc32fast::Hasher;
use serde::Serialize;
use thingdb_core::{Error, Record, RecordId, Result};

const TYPE_PUT: u8 = 1;
const TYPE_DELETE: u8 = 2;

/// Minimum value of the length field: type(1) + crc(4)
const MIN_ENTRY_LEN: usize = 5;

/// Default ceiling on the length field (16MB)
pub const MAX_ENTRY_LEN: usize = 16 * 1024 * 1024;

/// One logged mutation
#[derive(Debug, Clone, PartialEq)]
pub enum LogEntry {
    /// Record written (created or replaced)
    Put(Record),
    /// Record removed
    Delete(RecordId),
}

impl LogEntry {
    fn type_tag(&self) -> u8 {
        match self {
            LogEntry::Put(_) => TYPE_PUT,
            LogEntry::Delete(_) => TYPE_DELETE,
        }
    }

    /// Id of the record this entry touches
    pub fn record_id(&self) -> RecordId {
        match self {
            LogEntry::Put(record) => record.id,
            LogEntry::Delete(id) => *id,
        }
    }
}

/// Why an entry could not be decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DecodeError {
    /// Buffer ends before the declared entry does
    Incomplete,
    /// Entry is present but damaged
    Corrupt {
        /// What was wrong
        reason: String,
        /// Bytes the damaged entry claims to span, if its length was sane
        span: Option<usize>,
    },
}

fn encode_payload<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(rmp_serde::to_vec_named(value)?)
}

/// Encode a log entry to bytes
///
/// Format: `[length: u32][type: u8][payload: bytes][crc32: u32]`
///
/// # Errors
///
/// Returns [`Error::Serialization`] if the payload cannot be encoded.
pub fn encode_entry(entry: &LogEntry) -> Result<Vec<u8>> {
    let type_tag = entry.type_tag();
    let payload = match entry {
        LogEntry::Put(record) => encode_payload(record)?,
        LogEntry::Delete(id) => encode_payload(id)?,
    };

    let total_len = 1 + payload.len() + 4;
    let len_field = u32::try_from(total_len)
        .map_err(|_| Error::Storage(format!("log entry too large: {} bytes", total_len)))?;

    let mut hasher = Hasher::new();
    hasher.update(&[type_tag]);
    hasher.update(&payload);
    let crc = hasher.finalize();

    let mut buf = Vec::with_capacity(4 + total_len);
    buf.extend_from_slice(&len_field.to_le_bytes());
    buf.push(type_tag);
    buf.extend_from_slice(&payload);
    buf.extend_from_slice(&crc.to_le_bytes());
    Ok(buf)
}

/// Decode one entry from the front of `buf`
///
/// Returns the entry and the number of bytes consumed. A length field
/// above `max_len` is reported as corruption, never as an incomplete entry.
pub(crate) fn decode_entry(
    buf: &[u8],
    max_len: usize,
) -> std::result::Result<(LogEntry, usize), DecodeError> {
    if buf.len() < 4 {
        return Err(DecodeError::Incomplete);
    }
    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&buf[..4]);
    let total_len = u32::from_le_bytes(len_bytes) as usize;

    if total_len < MIN_ENTRY_LEN {
        return Err(DecodeError::Corrupt {
            reason: format!(
                "invalid entry length {} (minimum is {} bytes)",
                total_len, MIN_ENTRY_LEN
            ),
            span: None,
        });
    }
    if total_len > max_len {
        return Err(DecodeError::Corrupt {
            reason: format!(
                "entry length {} exceeds maximum of {} bytes",
                total_len, max_len
            ),
            span: None,
        });
    }

    let span = 4 + total_len;
    if buf.len() < span {
        return Err(DecodeError::Incomplete);
    }

    let type_tag = buf[4];
    let payload = &buf[5..span - 4];
    let mut crc_bytes = [0u8; 4];
    crc_bytes.copy_from_slice(&buf[span - 4..span]);
    let expected_crc = u32::from_le_bytes(crc_bytes);

    let mut hasher = Hasher::new();
    hasher.update(&[type_tag]);
    hasher.update(payload);
    let actual_crc = hasher.finalize();

    let corrupt = |reason: String| DecodeError::Corrupt {
        reason,
        span: Some(span),
    };

    if actual_crc != expected_crc {
        return Err(corrupt(format!(
            "CRC mismatch: expected {:08x}, got {:08x}",
            expected_crc, actual_crc
        )));
    }

    let entry = match type_tag {
        TYPE_PUT => rmp_serde::from_slice::<Record>(payload)
            .map(LogEntry::Put)
            .map_err(|e| corrupt(format!("undecodable put payload: {}", e)))?,
        TYPE_DELETE => rmp_serde::from_slice::<RecordId>(payload)
            .map(LogEntry::Delete)
            .map_err(|e| corrupt(format!("undecodable delete payload: {}", e)))?,
        other => return Err(corrupt(format!("unknown entry type {}", other))),
    };

    Ok((entry, span))
}

//! Entry framing
//!
//! ```text
//! +-------------+--------------+---------------------+
//! | len: u32 LE | crc32: u32 LE | payload (bincode)  |
//! +-------------+--------------+---------------------+
//! ```
//!
//! The checksum covers the payload only. A frame is valid iff it is complete
//! and its checksum matches.

use crate::error::WalError;
use crate::wal::WalEntry;
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

/// Size of the frame header in bytes
pub const FRAME_HEADER_SIZE: usize = 8;

/// Largest payload accepted on encode and decode
pub const MAX_PAYLOAD_SIZE: u32 = 64 * 1024 * 1024;

/// Result of decoding one frame
#[derive(Debug, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// A full frame was decoded
    Complete {
        /// Decoded entry
        entry: WalEntry,
        /// Bytes consumed, header included
        consumed: usize,
    },
    /// The buffer ends before the frame does
    Incomplete,
}

/// Encode an entry into a checksummed frame
///
/// Payloads above [`MAX_PAYLOAD_SIZE`] are refused here, since recovery
/// would stop at such a frame and drop everything after it.
pub fn encode_entry(entry: &WalEntry) -> Result<Vec<u8>, WalError> {
    let payload = bincode::serialize(entry)?;
    let length = u32::try_from(payload.len())
        .ok()
        .filter(|len| *len <= MAX_PAYLOAD_SIZE)
        .ok_or(WalError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD_SIZE,
        })?;
    let crc = crc32fast::hash(&payload);

    let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
    frame.write_u32::<LittleEndian>(length)?;
    frame.write_u32::<LittleEndian>(crc)?;
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Decode the frame at the start of `buf`
///
/// `offset` is the position of `buf` in the log and only feeds error messages.
pub fn decode_entry(buf: &[u8], offset: u64) -> Result<DecodeOutcome, WalError> {
    if buf.len() < FRAME_HEADER_SIZE {
        return Ok(DecodeOutcome::Incomplete);
    }

    let length = LittleEndian::read_u32(&buf[0..4]);
    let expected = LittleEndian::read_u32(&buf[4..8]);

    if length > MAX_PAYLOAD_SIZE {
        return Err(WalError::InvalidLength { offset, length });
    }

    let end = FRAME_HEADER_SIZE + length as usize;
    if buf.len() < end {
        return Ok(DecodeOutcome::Incomplete);
    }

    let payload = &buf[FRAME_HEADER_SIZE..end];
    let actual = crc32fast::hash(payload);
    if actual != expected {
        return Err(WalError::ChecksumMismatch {
            offset,
            expected,
            actual,
        });
    }

    let entry = bincode::deserialize(payload)?;
    Ok(DecodeOutcome::Complete {
        entry,
        consumed: end,
    })
}

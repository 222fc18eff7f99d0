//! WAL errors

use eventvault_core::StoreError;
use thiserror::Error;

/// Errors raised while writing or replaying the WAL
#[derive(Debug, Error)]
pub enum WalError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Entry could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Stored checksum does not match the payload
    #[error("checksum mismatch at offset {offset}: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch {
        /// Byte offset of the frame
        offset: u64,
        /// Checksum stored in the frame header
        expected: u32,
        /// Checksum computed over the payload
        actual: u32,
    },

    /// Frame header announces an impossible payload length
    #[error("invalid frame length {length} at offset {offset}")]
    InvalidLength {
        /// Byte offset of the frame
        offset: u64,
        /// Announced payload length
        length: u32,
    },

    /// Entry too large to be framed
    #[error("entry payload of {size} bytes exceeds the {max} byte frame limit")]
    PayloadTooLarge {
        /// Encoded payload size
        size: usize,
        /// Largest payload a frame may carry
        max: u32,
    },
}

impl From<bincode::Error> for WalError {
    fn from(e: bincode::Error) -> Self {
        WalError::Serialization(e.to_string())
    }
}

impl From<WalError> for StoreError {
    fn from(e: WalError) -> Self {
        match e {
            WalError::Io(io) => StoreError::Io(io),
            WalError::Serialization(msg) => StoreError::Serialization(msg),
            too_large @ WalError::PayloadTooLarge { .. } => {
                StoreError::Storage(too_large.to_string())
            }
            other => StoreError::Corruption(other.to_string()),
        }
    }
}

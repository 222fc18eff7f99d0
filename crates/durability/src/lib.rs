//! Durability layer for eventvault
//!
//! This crate implements write-ahead logging:
//! - WalEntry types: CreateNamespace, Commit
//! - Entry framing with CRC32 checksums
//! - Durability modes: None, Strict, Batched (default)
//! - Recovery: replay the WAL, truncating a torn tail

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod encoding;
pub mod error;
pub mod file;
pub mod mode;
pub mod recovery;
pub mod wal;

pub use encoding::{decode_entry, encode_entry, DecodeOutcome};
pub use error::WalError;
pub use file::WalFile;
pub use mode::DurabilityMode;
pub use recovery::{recover, RecoveryResult};
pub use wal::{WalEntry, WalWrite};

//! WAL replay
//!
//! Reads every valid frame from the start of the log. The first incomplete
//! or checksum-failing frame ends replay: everything before it is a prefix
//! of the committed history, everything from it onwards is a torn write
//! left by a crash and is reported as truncatable.
//!
//! ## Key Principle
//!
//! After recovery the store corresponds to a **prefix of the committed
//! transaction history**. No partial transaction may become visible.

use crate::encoding::{decode_entry, DecodeOutcome};
use crate::error::WalError;
use crate::wal::WalEntry;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

/// Outcome of replaying a WAL file
#[derive(Debug, Default, Clone)]
pub struct RecoveryResult {
    /// Entries in log order
    pub entries: Vec<WalEntry>,
    /// Length of the valid prefix in bytes
    pub valid_len: u64,
    /// Bytes after the valid prefix
    pub truncated_bytes: u64,
}

impl RecoveryResult {
    /// Number of Commit entries recovered
    pub fn transactions_recovered(&self) -> usize {
        self.entries.iter().filter(|e| e.is_commit()).count()
    }

    /// Highest commit version seen, 0 if none
    pub fn final_version(&self) -> u64 {
        self.entries
            .iter()
            .filter_map(WalEntry::version)
            .max()
            .unwrap_or(0)
    }

    /// Human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "Recovery complete: {} entries, {} transactions, final version {}, {} bytes discarded",
            self.entries.len(),
            self.transactions_recovered(),
            self.final_version(),
            self.truncated_bytes
        )
    }

    /// Check if a torn tail was found
    pub fn has_issues(&self) -> bool {
        self.truncated_bytes > 0
    }
}

/// Replay the WAL at `path`
///
/// A missing file is an empty log. The file is not modified.
pub fn recover(path: &Path) -> Result<RecoveryResult, WalError> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No WAL file found at {}", path.display());
            return Ok(RecoveryResult::default());
        }
        Err(e) => return Err(e.into()),
    };

    let mut result = RecoveryResult::default();
    let mut offset = 0usize;

    while offset < data.len() {
        match decode_entry(&data[offset..], offset as u64) {
            Ok(DecodeOutcome::Complete { entry, consumed }) => {
                result.entries.push(entry);
                offset += consumed;
            }
            Ok(DecodeOutcome::Incomplete) => {
                warn!(offset, "Incomplete WAL frame, discarding tail");
                break;
            }
            Err(e) => {
                warn!(offset, error = %e, "Invalid WAL frame, discarding tail");
                break;
            }
        }
    }

    result.valid_len = offset as u64;
    result.truncated_bytes = (data.len() - offset) as u64;
    Ok(result)
}

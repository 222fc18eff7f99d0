//! WAL (Write-Ahead Log) entry types
//!
//! - CreateNamespace: a namespace came into existence
//! - Commit: every write of one committed transaction
//!
//! A transaction is logged as a single Commit record, so on replay it is
//! either present in full or not at all. There is no separate begin/abort
//! marker: an aborted transaction never reaches the log.

use eventvault_core::{CommitVersion, StoreKey};
use serde::{Deserialize, Serialize};

/// One put inside a committed transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalWrite {
    /// Target key
    pub key: StoreKey,
    /// Value written
    pub value: Vec<u8>,
}

/// WAL entry types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalEntry {
    /// Namespace creation
    CreateNamespace {
        /// Namespace name
        name: String,
    },

    /// Committed transaction
    Commit {
        /// Commit version assigned to every write
        version: CommitVersion,
        /// Wall-clock commit time, milliseconds since epoch
        timestamp: i64,
        /// Writes in application order
        writes: Vec<WalWrite>,
    },
}

impl WalEntry {
    /// Build a Commit entry stamped with the current time
    pub fn commit(version: CommitVersion, writes: Vec<WalWrite>) -> Self {
        WalEntry::Commit {
            version,
            timestamp: chrono::Utc::now().timestamp_millis(),
            writes,
        }
    }

    /// Commit version (Commit entries only)
    pub fn version(&self) -> Option<CommitVersion> {
        match self {
            WalEntry::Commit { version, .. } => Some(*version),
            WalEntry::CreateNamespace { .. } => None,
        }
    }

    /// Check if entry is a transaction commit
    pub fn is_commit(&self) -> bool {
        matches!(self, WalEntry::Commit { .. })
    }
}

//! Commit-time validation
//!
//! First committer wins. A transaction conflicts if:
//! - a key it read now has a different latest version (read-write conflict)
//! - a key it writes without having read it was committed by someone else
//!   after its snapshot (write-write conflict)
//! - a key it touched cannot be looked up at all (unreadable key)

use crate::transaction::TransactionContext;
use eventvault_core::{CommitVersion, StoreKey};
use eventvault_storage::VersionedStore;
use std::collections::HashMap;

/// A single detected conflict
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictType {
    /// A key read by the transaction changed before commit
    ReadWriteConflict {
        /// Conflicting key
        key: StoreKey,
        /// Version observed when read
        read_version: Option<CommitVersion>,
        /// Version at validation time
        current_version: Option<CommitVersion>,
    },
    /// A blind write targets a key committed after the snapshot
    WriteWriteConflict {
        /// Conflicting key
        key: StoreKey,
        /// Snapshot version of the transaction
        start_version: CommitVersion,
        /// Version at validation time
        current_version: CommitVersion,
    },
    /// The latest version of a touched key could not be determined
    Unreadable {
        /// Key that failed to validate
        key: StoreKey,
        /// Error raised by the store
        reason: String,
    },
}

impl std::fmt::Display for ConflictType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictType::ReadWriteConflict {
                key,
                read_version,
                current_version,
            } => write!(
                f,
                "read-write conflict on {}: read {:?}, now {:?}",
                key, read_version, current_version
            ),
            ConflictType::WriteWriteConflict {
                key,
                start_version,
                current_version,
            } => write!(
                f,
                "write-write conflict on {}: snapshot {}, now {}",
                key, start_version, current_version
            ),
            ConflictType::Unreadable { key, reason } => {
                write!(f, "cannot validate {}: {}", key, reason)
            }
        }
    }
}

/// Outcome of validating a transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    /// Every conflict found
    pub conflicts: Vec<ConflictType>,
}

impl ValidationResult {
    /// A result with no conflicts
    pub fn ok() -> Self {
        Self::default()
    }

    /// Check if the transaction may commit
    pub fn is_valid(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Number of conflicts
    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }

    /// Append the conflicts of `other`
    pub fn merge(&mut self, other: ValidationResult) {
        self.conflicts.extend(other.conflicts);
    }
}

impl std::fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.conflicts.is_empty() {
            return write!(f, "no conflicts");
        }
        let parts: Vec<String> = self.conflicts.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Check every read key still has the version the transaction observed
pub fn validate_read_set(
    read_set: &HashMap<StoreKey, Option<CommitVersion>>,
    store: &VersionedStore,
) -> ValidationResult {
    let mut result = ValidationResult::ok();
    for (key, read_version) in read_set {
        let current_version = match store.latest_version(&key.namespace, &key.key) {
            Ok(version) => version,
            Err(e) => {
                result.conflicts.push(ConflictType::Unreadable {
                    key: key.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };
        if current_version != *read_version {
            result.conflicts.push(ConflictType::ReadWriteConflict {
                key: key.clone(),
                read_version: *read_version,
                current_version,
            });
        }
    }
    result
}

/// Check blind writes against commits made after `start_version`
///
/// Keys present in the read set are skipped: the read-set check already
/// covers them.
pub fn validate_write_set<'a>(
    writes: impl Iterator<Item = &'a StoreKey>,
    read_set: &HashMap<StoreKey, Option<CommitVersion>>,
    start_version: CommitVersion,
    store: &VersionedStore,
) -> ValidationResult {
    let mut result = ValidationResult::ok();
    for key in writes.filter(|k| !read_set.contains_key(*k)) {
        match store.latest_version(&key.namespace, &key.key) {
            Ok(Some(current_version)) if current_version > start_version => {
                result.conflicts.push(ConflictType::WriteWriteConflict {
                    key: key.clone(),
                    start_version,
                    current_version,
                });
            }
            Ok(_) => {}
            Err(e) => result.conflicts.push(ConflictType::Unreadable {
                key: key.clone(),
                reason: e.to_string(),
            }),
        }
    }
    result
}

/// Full validation of a transaction
pub fn validate_transaction(txn: &TransactionContext, store: &VersionedStore) -> ValidationResult {
    let mut result = validate_read_set(txn.read_set(), store);
    result.merge(validate_write_set(
        txn.write_set().keys(),
        txn.read_set(),
        txn.start_version(),
        store,
    ));
    result
}

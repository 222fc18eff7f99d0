//! Transaction manager for coordinating commit operations
//!
//! Provides atomic commit by orchestrating:
//! 1. Validation (first-committer-wins)
//! 2. WAL writing (durability)
//! 3. Storage application (visibility)
//!
//! ## Commit Sequence
//!
//! ```text
//! 1. acquire commit lock
//! 2. validate; on conflict abort and return error
//! 3. read-only? return current version, nothing to log
//! 4. allocate commit_version (increment global version)
//! 5. append Commit record to WAL (DURABILITY POINT)
//! 6. apply writes to storage (VISIBILITY POINT)
//! 7. return commit_version
//! ```
//!
//! If the process dies before step 5 completes, the transaction is not
//! durable and is absent after recovery. After step 5 it is replayed.
//!
//! Validation rejects every write whose namespace is missing, which is the
//! only way applying a batch can fail, so step 6 does not fail in practice.
//! If it ever does, the commit is reported as failed rather than succeeding
//! with writes that readers cannot see.

use crate::transaction::{CommitError, TransactionContext, TransactionStatus};
use eventvault_core::{CommitVersion, Result};
use eventvault_durability::{WalEntry, WalFile, WalWrite};
use eventvault_storage::{SnapshotView, VersionedStore};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Point-in-time transaction counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransactionMetrics {
    /// Transactions committed (read-only ones included)
    pub total_committed: u64,
    /// Transactions aborted by conflict, failure or rollback
    pub total_aborted: u64,
    /// Latest allocated commit version
    pub current_version: CommitVersion,
}

/// Manages transaction lifecycle and atomic commits
///
/// # Thread Safety
///
/// The commit operation is serialized via an internal lock so that no other
/// transaction can modify storage between validation and application.
pub struct TransactionManager {
    /// Global version counter
    ///
    /// Monotonically increasing. Each committed write transaction increments by 1.
    version: AtomicU64,

    /// Next transaction ID
    next_txn_id: AtomicU64,

    /// Serializes validate -> WAL -> apply
    commit_lock: Mutex<()>,

    committed: AtomicU64,
    aborted: AtomicU64,
}

impl TransactionManager {
    /// Create a new transaction manager
    ///
    /// # Arguments
    /// * `initial_version` - Starting version (typically from recovery's final_version)
    pub fn new(initial_version: CommitVersion) -> Self {
        TransactionManager {
            version: AtomicU64::new(initial_version),
            next_txn_id: AtomicU64::new(1),
            commit_lock: Mutex::new(()),
            committed: AtomicU64::new(0),
            aborted: AtomicU64::new(0),
        }
    }

    /// Get current global version
    pub fn current_version(&self) -> CommitVersion {
        self.version.load(Ordering::SeqCst)
    }

    /// Allocate next transaction ID
    pub fn next_txn_id(&self) -> u64 {
        self.next_txn_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Allocate next commit version (increment global version)
    ///
    /// # Version Gaps
    ///
    /// A transaction that fails after allocation (e.g. WAL write failure)
    /// leaves a gap. Consumers must not assume commit versions are contiguous.
    pub fn allocate_version(&self) -> CommitVersion {
        self.version.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Start a transaction reading at the latest visible version
    pub fn begin(&self, store: &Arc<VersionedStore>) -> TransactionContext {
        TransactionContext::new(self.next_txn_id(), SnapshotView::latest(store))
    }

    /// Commit a transaction atomically
    ///
    /// # Arguments
    /// * `txn` - Transaction to commit (must be in Active state)
    /// * `store` - Storage to validate against and apply writes to
    /// * `wal` - WAL for durability, `None` for ephemeral stores
    ///
    /// # Returns
    /// - Ok(commit_version) on success
    /// - Err(CommitError) if validation, the WAL write or storage application fails
    pub fn commit(
        &self,
        txn: &mut TransactionContext,
        store: &VersionedStore,
        wal: Option<&Mutex<WalFile>>,
    ) -> std::result::Result<CommitVersion, CommitError> {
        let _commit_guard = self.commit_lock.lock();

        if let Err(e) = txn.commit(store) {
            self.aborted.fetch_add(1, Ordering::Relaxed);
            return Err(e);
        }

        if txn.is_read_only() {
            self.committed.fetch_add(1, Ordering::Relaxed);
            return Ok(store.version());
        }

        let commit_version = self.allocate_version();

        if let Some(wal) = wal {
            let writes = txn
                .writes()
                .into_iter()
                .map(|(key, value)| WalWrite { key, value })
                .collect();
            if let Err(e) = wal.lock().append(&WalEntry::commit(commit_version, writes)) {
                txn.status = TransactionStatus::Aborted {
                    reason: format!("WAL write failed: {}", e),
                };
                self.aborted.fetch_add(1, Ordering::Relaxed);
                return Err(CommitError::WALError(e.to_string()));
            }
        }

        if let Err(e) = txn.apply_writes(store, commit_version) {
            tracing::error!(
                txn_id = txn.txn_id,
                commit_version = commit_version,
                error = %e,
                "Storage application failed after WAL commit; replayed on restart"
            );
            txn.status = TransactionStatus::Aborted {
                reason: format!("apply failed: {}", e),
            };
            self.aborted.fetch_add(1, Ordering::Relaxed);
            return Err(CommitError::ApplyFailed {
                version: commit_version,
                reason: e.to_string(),
            });
        }

        self.committed.fetch_add(1, Ordering::Relaxed);
        Ok(commit_version)
    }

    /// Explicitly abort a transaction
    ///
    /// All buffered operations are discarded. Nothing is written to the WAL.
    pub fn abort(&self, txn: &mut TransactionContext, reason: String) -> Result<()> {
        txn.mark_aborted(reason)?;
        self.aborted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Snapshot of the counters
    pub fn metrics(&self) -> TransactionMetrics {
        TransactionMetrics {
            total_committed: self.committed.load(Ordering::Relaxed),
            total_aborted: self.aborted.load(Ordering::Relaxed),
            current_version: self.current_version(),
        }
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new(0)
    }
}

impl std::fmt::Debug for TransactionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionManager")
            .field("metrics", &self.metrics())
            .finish()
    }
}

//! Transaction context
//!
//! A [`TransactionContext`] reads from a pinned snapshot, buffers its writes
//! and remembers the version of every key it read. Nothing it does is
//! visible to other transactions until the manager commits it.
//!
//! ## State Machine
//!
//! ```text
//! Active ──> Validating ──> Committed
//!   │             │
//!   └─────────────┴───────> Aborted
//! ```

use crate::validation::{validate_transaction, ValidationResult};
use eventvault_core::{CommitVersion, KeyValue, Result, StoreError, StoreKey};
use eventvault_storage::{SnapshotView, VersionedStore};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Transaction lifecycle state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Accepting reads and writes
    Active,
    /// Commit validation in progress
    Validating,
    /// Writes applied
    Committed,
    /// Discarded
    Aborted {
        /// Why the transaction was aborted
        reason: String,
    },
}

/// Errors raised while committing
#[derive(Debug, Error)]
pub enum CommitError {
    /// Another transaction committed a conflicting write first
    #[error("transaction aborted due to conflicts: {0}")]
    ValidationFailed(ValidationResult),

    /// Commit attempted outside the Active state
    #[error("invalid transaction state: {0}")]
    InvalidState(String),

    /// The WAL record could not be written
    #[error("WAL error: {0}")]
    WALError(String),

    /// The WAL record was written but storage refused the writes
    #[error("commit {version} logged but not applied: {reason}")]
    ApplyFailed {
        /// Version recorded in the WAL
        version: CommitVersion,
        /// Error raised by storage
        reason: String,
    },
}

impl From<CommitError> for StoreError {
    fn from(e: CommitError) -> Self {
        match e {
            CommitError::ValidationFailed(result) => {
                StoreError::TransactionConflict(result.to_string())
            }
            CommitError::InvalidState(msg) => StoreError::TransactionNotActive(msg),
            CommitError::WALError(msg) => StoreError::Storage(format!("WAL write failed: {}", msg)),
            failed @ CommitError::ApplyFailed { .. } => StoreError::Storage(failed.to_string()),
        }
    }
}

/// Read/write set of one optimistic transaction
#[derive(Debug)]
pub struct TransactionContext {
    /// Transaction identifier
    pub txn_id: u64,
    /// Status
    pub status: TransactionStatus,
    snapshot: SnapshotView,
    /// Key -> commit version observed (None: key absent)
    read_set: HashMap<StoreKey, Option<CommitVersion>>,
    /// Buffered writes, last put wins
    write_set: BTreeMap<StoreKey, Vec<u8>>,
}

impl TransactionContext {
    /// Create an active transaction reading from `snapshot`
    pub fn new(txn_id: u64, snapshot: SnapshotView) -> Self {
        Self {
            txn_id,
            status: TransactionStatus::Active,
            snapshot,
            read_set: HashMap::new(),
            write_set: BTreeMap::new(),
        }
    }

    /// Snapshot version this transaction reads at
    pub fn start_version(&self) -> CommitVersion {
        self.snapshot.version()
    }

    /// Check if the transaction still accepts operations
    pub fn is_active(&self) -> bool {
        self.status == TransactionStatus::Active
    }

    /// Check if nothing was written
    pub fn is_read_only(&self) -> bool {
        self.write_set.is_empty()
    }

    /// Number of buffered writes
    pub fn write_count(&self) -> usize {
        self.write_set.len()
    }

    /// Keys read with the version observed
    pub fn read_set(&self) -> &HashMap<StoreKey, Option<CommitVersion>> {
        &self.read_set
    }

    /// Buffered writes, sorted by key
    pub fn write_set(&self) -> &BTreeMap<StoreKey, Vec<u8>> {
        &self.write_set
    }

    fn ensure_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(StoreError::TransactionNotActive(format!(
                "txn {} is {:?}",
                self.txn_id, self.status
            )))
        }
    }

    /// Read a key: own writes first, then the snapshot
    ///
    /// Snapshot reads are recorded for commit-time validation.
    pub fn get(&mut self, namespace: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.ensure_active()?;

        let store_key = StoreKey::new(namespace, key);
        if let Some(value) = self.write_set.get(&store_key) {
            return Ok(Some(value.clone()));
        }

        let found = self.snapshot.get(namespace, key)?;
        self.read_set
            .entry(store_key)
            .or_insert(found.as_ref().map(|v| v.version));
        Ok(found.map(|v| v.value))
    }

    /// Prefix scan merging own writes over the snapshot
    ///
    /// Returned keys are recorded like point reads. Keys inserted by other
    /// transactions after the snapshot (phantoms) are not detected.
    pub fn scan_prefix(&mut self, namespace: &str, prefix: &[u8]) -> Result<Vec<KeyValue>> {
        self.ensure_active()?;

        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = BTreeMap::new();
        for (key, value) in self.snapshot.scan_prefix(namespace, prefix)? {
            let version = self
                .snapshot
                .get(namespace, &key)?
                .map(|v| v.version);
            self.read_set
                .entry(StoreKey::new(namespace, key.clone()))
                .or_insert(version);
            merged.insert(key, value);
        }
        for (store_key, value) in &self.write_set {
            if store_key.namespace == namespace && store_key.starts_with(prefix) {
                merged.insert(store_key.key.clone(), value.clone());
            }
        }
        Ok(merged.into_iter().collect())
    }

    /// Buffer a write
    pub fn put(&mut self, namespace: &str, key: &[u8], value: &[u8]) -> Result<()> {
        self.ensure_active()?;
        if !self.snapshot.has_namespace(namespace) {
            return Err(StoreError::NamespaceNotFound(namespace.to_string()));
        }
        self.write_set
            .insert(StoreKey::new(namespace, key), value.to_vec());
        Ok(())
    }

    /// Validate against `store` and move to Committed or Aborted
    ///
    /// Does not apply writes: the manager does that after the WAL record is
    /// durable.
    pub fn commit(&mut self, store: &VersionedStore) -> std::result::Result<(), CommitError> {
        if !self.is_active() {
            return Err(CommitError::InvalidState(format!(
                "cannot commit txn {} in state {:?}",
                self.txn_id, self.status
            )));
        }

        self.status = TransactionStatus::Validating;
        let result = validate_transaction(self, store);
        if !result.is_valid() {
            self.status = TransactionStatus::Aborted {
                reason: result.to_string(),
            };
            return Err(CommitError::ValidationFailed(result));
        }

        self.status = TransactionStatus::Committed;
        Ok(())
    }

    /// Apply buffered writes to storage with `version`
    pub fn apply_writes(&self, store: &VersionedStore, version: CommitVersion) -> Result<()> {
        if self.status != TransactionStatus::Committed {
            return Err(StoreError::TransactionNotActive(format!(
                "txn {} not committed",
                self.txn_id
            )));
        }
        store.apply_batch(&self.writes(), version)
    }

    /// Buffered writes as an owned batch
    pub fn writes(&self) -> Vec<(StoreKey, Vec<u8>)> {
        self.write_set
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Check if the transaction can still be rolled back
    pub fn can_rollback(&self) -> bool {
        matches!(
            self.status,
            TransactionStatus::Active | TransactionStatus::Validating
        )
    }

    /// Discard buffered writes and mark Aborted
    pub fn mark_aborted(&mut self, reason: String) -> Result<()> {
        if !self.can_rollback() {
            return Err(StoreError::TransactionNotActive(format!(
                "cannot abort txn {} in state {:?}",
                self.txn_id, self.status
            )));
        }
        self.write_set.clear();
        self.status = TransactionStatus::Aborted { reason };
        Ok(())
    }
}

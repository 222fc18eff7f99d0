//! Store contract
//!
//! The capabilities an embedded key-value store must provide for the event
//! store to run on top of it:
//!
//! - create-namespace-if-absent (idempotent)
//! - read-write transactions with point get, point put, commit and rollback
//! - read-only transactions with point get and snapshot isolation
//!
//! Implementations MUST guarantee:
//! - Commit is all-or-nothing: either every put becomes visible or none does
//! - A read transaction never observes a write committed after it began
//! - Concurrent write transactions are serialized, or the later committer
//!   fails with [`StoreError::TransactionConflict`](crate::StoreError)
//!
//! Reads take `&mut self` because an optimistic write transaction records
//! what it read for commit-time validation.

use crate::error::Result;
use crate::types::{CommitVersion, KeyValue};

/// Read operations available inside any transaction
pub trait ReadTransaction {
    /// Point lookup of `key` in `namespace`.
    ///
    /// Returns `None` if the key has no value visible to this transaction.
    fn get(&mut self, namespace: &str, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// All entries of `namespace` whose key starts with `prefix`, sorted by key.
    fn scan_prefix(&mut self, namespace: &str, prefix: &[u8]) -> Result<Vec<KeyValue>>;
}

/// A read-write transaction
///
/// Writes are buffered and become visible to other transactions only after
/// [`commit`](WriteTransaction::commit) returns `Ok`.
pub trait WriteTransaction: ReadTransaction {
    /// Buffer a put of `value` under `key` in `namespace`.
    fn put(&mut self, namespace: &str, key: &[u8], value: &[u8]) -> Result<()>;

    /// Atomically apply every buffered write.
    ///
    /// Returns the commit version. On error nothing is applied.
    fn commit(self) -> Result<CommitVersion>;

    /// Discard every buffered write.
    fn rollback(self);
}

/// An embedded, transactional, ordered key-value store
pub trait TransactionalStore: Send + Sync {
    /// Read-only snapshot transaction
    type Read<'a>: ReadTransaction
    where
        Self: 'a;

    /// Read-write transaction
    type Write<'a>: WriteTransaction
    where
        Self: 'a;

    /// Create `name` if it does not exist yet.
    ///
    /// Calling this for an existing namespace is a successful no-op.
    fn create_namespace(&self, name: &str) -> Result<()>;

    /// Begin a read-only transaction pinned to the latest committed version.
    fn begin_read(&self) -> Result<Self::Read<'_>>;

    /// Begin a read-write transaction.
    fn begin_write(&self) -> Result<Self::Write<'_>>;
}

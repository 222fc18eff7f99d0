//! Transaction handles returned by [`Database`]
//!
//! - [`ReadTxn`]: pinned snapshot, never conflicts, never blocks writers
//! - [`WriteTxn`]: optimistic; reads are tracked and validated at commit
//!
//! A `WriteTxn` dropped without commit or rollback is rolled back.

use crate::database::Database;
use eventvault_concurrency::TransactionContext;
use eventvault_core::{CommitVersion, KeyValue, ReadTransaction, Result, WriteTransaction};
use eventvault_storage::SnapshotView;
use tracing::debug;

/// Read-only snapshot transaction
#[derive(Debug, Clone)]
pub struct ReadTxn {
    snapshot: SnapshotView,
}

impl ReadTxn {
    pub(crate) fn new(snapshot: SnapshotView) -> Self {
        Self { snapshot }
    }

    /// Commit version this transaction reads at
    pub fn version(&self) -> CommitVersion {
        self.snapshot.version()
    }
}

impl ReadTransaction for ReadTxn {
    fn get(&mut self, namespace: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.snapshot.get(namespace, key)?.map(|v| v.value))
    }

    fn scan_prefix(&mut self, namespace: &str, prefix: &[u8]) -> Result<Vec<KeyValue>> {
        self.snapshot.scan_prefix(namespace, prefix)
    }
}

/// Read-write optimistic transaction
pub struct WriteTxn<'a> {
    db: &'a Database,
    ctx: TransactionContext,
}

impl<'a> WriteTxn<'a> {
    pub(crate) fn new(db: &'a Database, ctx: TransactionContext) -> Self {
        Self { db, ctx }
    }

    /// Transaction identifier
    pub fn id(&self) -> u64 {
        self.ctx.txn_id
    }

    /// Snapshot version reads are served from
    pub fn start_version(&self) -> CommitVersion {
        self.ctx.start_version()
    }

    /// Number of buffered writes
    pub fn write_count(&self) -> usize {
        self.ctx.write_count()
    }
}

impl ReadTransaction for WriteTxn<'_> {
    fn get(&mut self, namespace: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.ctx.get(namespace, key)
    }

    fn scan_prefix(&mut self, namespace: &str, prefix: &[u8]) -> Result<Vec<KeyValue>> {
        self.ctx.scan_prefix(namespace, prefix)
    }
}

impl WriteTransaction for WriteTxn<'_> {
    fn put(&mut self, namespace: &str, key: &[u8], value: &[u8]) -> Result<()> {
        self.ctx.put(namespace, key, value)
    }

    fn commit(mut self) -> Result<CommitVersion> {
        let version = self
            .db
            .manager
            .commit(&mut self.ctx, &self.db.storage, self.db.wal.as_ref())?;
        debug!(txn_id = self.ctx.txn_id, version, "committed");
        Ok(version)
    }

    fn rollback(mut self) {
        self.abort("rolled back");
    }
}

impl WriteTxn<'_> {
    fn abort(&mut self, reason: &str) {
        if self.ctx.can_rollback()
            && self
                .db
                .manager
                .abort(&mut self.ctx, reason.to_string())
                .is_ok()
        {
            debug!(txn_id = self.ctx.txn_id, reason, "aborted");
        }
    }
}

impl Drop for WriteTxn<'_> {
    fn drop(&mut self) {
        if self.ctx.is_active() {
            self.abort("dropped without commit");
        }
    }
}

impl std::fmt::Debug for WriteTxn<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteTxn")
            .field("id", &self.ctx.txn_id)
            .field("status", &self.ctx.status)
            .field("start_version", &self.ctx.start_version())
            .field("writes", &self.ctx.write_count())
            .finish()
    }
}

//! Main database entry point
//!
//! # Example
//!
//! ```ignore
//! use eventvault_engine::Database;
//!
//! // Ephemeral: no files, nothing survives the process
//! let db = Database::ephemeral();
//!
//! // Disk-backed with batched fsync (default)
//! let db = Database::open("./data")?;
//!
//! // Strict mode for maximum durability
//! let db = Database::builder().path("./data").strict().open()?;
//! ```

use crate::config::DatabaseConfig;
use crate::transaction::{ReadTxn, WriteTxn};
use eventvault_concurrency::TransactionManager;
use eventvault_core::{CommitVersion, Result, StoreError, StoreKey, TransactionalStore};
use eventvault_durability::{recover, DurabilityMode, RecoveryResult, WalEntry, WalFile};
use eventvault_storage::{SnapshotView, VersionedStore};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Name of the WAL file inside the data directory
pub const WAL_FILENAME: &str = "wal.log";

/// Embedded transactional key-value database
///
/// Thread-safe: share it behind an `Arc`. Readers never block writers;
/// writers are serialized at commit time only.
pub struct Database {
    pub(crate) storage: Arc<VersionedStore>,
    pub(crate) manager: TransactionManager,
    pub(crate) wal: Option<Mutex<WalFile>>,
    config: DatabaseConfig,
}

impl Database {
    /// Create an in-memory database with no disk I/O.
    pub fn ephemeral() -> Self {
        let storage = Arc::new(VersionedStore::new());
        Self {
            manager: TransactionManager::new(storage.version()),
            storage,
            wal: None,
            config: DatabaseConfig::ephemeral(),
        }
    }

    /// Open (or create) a database in `path` with default settings.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder().path(path).open()
    }

    /// Create a builder for database configuration.
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    /// Open a database from a configuration
    pub fn from_config(config: DatabaseConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        let storage = Arc::new(VersionedStore::new());
        let mut wal = None;

        if let Some(dir) = &config.path {
            let wal_path = dir.join(WAL_FILENAME);
            let recovered = if config.read_only || !config.durability.requires_wal() {
                recover(&wal_path)?
            } else {
                let (file, recovered) = WalFile::open(&wal_path, config.durability)?;
                wal = Some(Mutex::new(file));
                recovered
            };
            replay(&storage, &recovered)?;
            info!(path = %dir.display(), "{}", recovered.summary());
        }

        Ok(Self {
            manager: TransactionManager::new(storage.version()),
            storage,
            wal,
            config,
        })
    }

    /// Data directory, `None` when ephemeral
    pub fn path(&self) -> Option<&Path> {
        self.config.path.as_deref()
    }

    /// Configured durability mode
    pub fn durability_mode(&self) -> DurabilityMode {
        self.config.durability
    }

    /// Check if this database has no backing files
    pub fn is_ephemeral(&self) -> bool {
        self.config.path.is_none()
    }

    /// Check if writes are rejected
    pub fn is_read_only(&self) -> bool {
        self.config.read_only
    }

    /// Latest visible commit version
    pub fn version(&self) -> CommitVersion {
        self.storage.version()
    }

    /// Names of all namespaces, sorted
    pub fn namespaces(&self) -> Vec<String> {
        self.storage.namespace_names()
    }

    /// Force an fsync of the WAL.
    ///
    /// In batched mode commits are synced periodically; call this to make
    /// everything committed so far durable. No-op without a WAL.
    pub fn flush(&self) -> Result<()> {
        if let Some(wal) = &self.wal {
            wal.lock().flush()?;
        }
        Ok(())
    }

    /// Database metrics
    pub fn metrics(&self) -> DatabaseMetrics {
        let txn = self.manager.metrics();
        DatabaseMetrics {
            transactions_committed: txn.total_committed,
            transactions_aborted: txn.total_aborted,
            current_version: self.storage.version(),
            namespaces: self.storage.namespace_names().len(),
        }
    }
}

/// Apply recovered WAL entries to an empty store
fn replay(storage: &VersionedStore, recovered: &RecoveryResult) -> Result<()> {
    for entry in &recovered.entries {
        match entry {
            WalEntry::CreateNamespace { name } => {
                storage.create_namespace(name);
            }
            WalEntry::Commit {
                version, writes, ..
            } => {
                let batch: Vec<(StoreKey, Vec<u8>)> = writes
                    .iter()
                    .map(|w| (w.key.clone(), w.value.clone()))
                    .collect();
                storage.apply_batch(&batch, *version).map_err(|e| {
                    StoreError::Corruption(format!("replay of commit {} failed: {}", version, e))
                })?;
            }
        }
    }
    debug!(version = storage.version(), "WAL replay applied");
    Ok(())
}

impl TransactionalStore for Database {
    type Read<'a> = ReadTxn;
    type Write<'a> = WriteTxn<'a>;

    fn create_namespace(&self, name: &str) -> Result<()> {
        if self.storage.has_namespace(name) {
            return Ok(());
        }
        if self.config.read_only {
            return Err(StoreError::ReadOnly);
        }

        match &self.wal {
            Some(wal) => {
                // Holding the WAL lock keeps the log free of duplicate creations
                let mut wal = wal.lock();
                if self.storage.has_namespace(name) {
                    return Ok(());
                }
                wal.append(&WalEntry::CreateNamespace {
                    name: name.to_string(),
                })?;
                self.storage.create_namespace(name);
            }
            None => {
                self.storage.create_namespace(name);
            }
        }
        debug!(namespace = name, "created namespace");
        Ok(())
    }

    fn begin_read(&self) -> Result<ReadTxn> {
        Ok(ReadTxn::new(SnapshotView::latest(&self.storage)))
    }

    fn begin_write(&self) -> Result<WriteTxn<'_>> {
        if self.config.read_only {
            return Err(StoreError::ReadOnly);
        }
        Ok(WriteTxn::new(self, self.manager.begin(&self.storage)))
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.config.path)
            .field("durability", &self.config.durability)
            .field("read_only", &self.config.read_only)
            .field("version", &self.storage.version())
            .finish()
    }
}

/// Database metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseMetrics {
    /// Total committed transactions
    pub transactions_committed: u64,
    /// Total aborted transactions
    pub transactions_aborted: u64,
    /// Latest visible commit version
    pub current_version: CommitVersion,
    /// Number of namespaces
    pub namespaces: usize,
}

/// Builder for database configuration.
///
/// # Example
///
/// ```ignore
/// // Production: disk-backed with batched fsync
/// let db = Database::builder().path("./data").open()?;
///
/// // Inspect a live data directory without touching it
/// let db = Database::builder().path("./data").read_only(true).open()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct DatabaseBuilder {
    config: DatabaseConfig,
}

impl DatabaseBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the database directory path.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.config.path = Some(PathBuf::from(path.as_ref()));
        self
    }

    /// Set the durability mode.
    pub fn durability(mut self, mode: DurabilityMode) -> Self {
        self.config.durability = mode;
        self
    }

    /// Do not log new commits (existing WAL is still replayed).
    pub fn no_durability(self) -> Self {
        self.durability(DurabilityMode::None)
    }

    /// Use batched mode with default parameters (100ms or 1000 commits).
    pub fn buffered(self) -> Self {
        self.durability(DurabilityMode::buffered_default())
    }

    /// Use batched mode with custom parameters.
    pub fn buffered_with(self, interval_ms: u64, batch_size: usize) -> Self {
        self.durability(DurabilityMode::Batched {
            interval_ms,
            batch_size,
        })
    }

    /// Use strict mode (fsync on every commit).
    pub fn strict(self) -> Self {
        self.durability(DurabilityMode::Strict)
    }

    /// Reject writes and namespace creation.
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.config.read_only = read_only;
        self
    }

    /// Open the database.
    ///
    /// Without a path the database is ephemeral whatever mode was chosen.
    pub fn open(mut self) -> Result<Database> {
        if self.config.path.is_none() {
            self.config.durability = DurabilityMode::None;
        }
        Database::from_config(self.config)
    }
}

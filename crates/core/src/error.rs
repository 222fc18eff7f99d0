//! Error types for the transactional key-value store

use thiserror::Error;

/// Errors raised by the key-value store and its transactions
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error (WAL file, fsync, disk full)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Namespace was never created
    #[error("namespace not found: {0}")]
    NamespaceNotFound(String),

    /// Write attempted against a read-only store
    #[error("store is read-only")]
    ReadOnly,

    /// Commit-time validation failed (first committer wins)
    #[error("transaction conflict: {0}")]
    TransactionConflict(String),

    /// Operation on a transaction that is no longer active
    #[error("transaction not active: {0}")]
    TransactionNotActive(String),

    /// Persisted data failed validation
    #[error("corruption: {0}")]
    Corruption(String),

    /// Encoding or decoding failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Any other storage failure
    #[error("storage error: {0}")]
    Storage(String),
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Check if this error is a transaction conflict.
    ///
    /// Conflicts may succeed on retry with fresh data.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::TransactionConflict(_))
    }

    /// Check if this error indicates damaged persisted state.
    pub fn is_corruption(&self) -> bool {
        matches!(self, StoreError::Corruption(_))
    }
}

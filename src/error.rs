//! Event store errors
//!
//! Store failures are wrapped, never flattened to strings, so callers can
//! still inspect the underlying [`StoreError`].

use crate::types::Version;
use eventvault_core::StoreError;
use thiserror::Error;

/// All event store errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Namespace setup failed; the store is unusable
    #[error("failed to initialize namespace {namespace}: {source}")]
    Initialization {
        /// Namespace that could not be created
        namespace: String,
        /// Underlying store error
        #[source]
        source: StoreError,
    },

    /// Appended version is not above the aggregate's current version
    #[error("overlapping version {version} for aggregate {aggregate_id} (current {current})")]
    OverlappingVersion {
        /// Aggregate being appended to
        aggregate_id: String,
        /// First version of the rejected batch
        version: Version,
        /// Highest version already persisted
        current: Version,
    },

    /// Batch versions are not strictly increasing
    #[error("invalid batch for aggregate {aggregate_id}: {reason}")]
    InvalidBatch {
        /// Aggregate being appended to
        aggregate_id: String,
        /// What is wrong with the batch
        reason: String,
    },

    /// Aggregate identifier cannot be used as a key
    #[error("invalid aggregate id: {0}")]
    InvalidAggregateId(String),

    /// Event store configuration is unusable
    #[error("configuration error: {0}")]
    Config(String),

    /// Underlying transactional store failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for event store operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if re-reading current state and retrying may succeed.
    ///
    /// True for overlapping versions and for store transaction conflicts.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::OverlappingVersion { .. } => true,
            Error::Store(e) => e.is_conflict(),
            _ => false,
        }
    }

    /// Check if this is an optimistic concurrency rejection
    pub fn is_overlapping_version(&self) -> bool {
        matches!(self, Error::OverlappingVersion { .. })
    }

    /// The wrapped store error, if any
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Error::Store(e) | Error::Initialization { source: e, .. } => Some(e),
            _ => None,
        }
    }
}

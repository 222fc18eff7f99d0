//! Concurrency layer for eventvault
//!
//! This crate implements optimistic concurrency control (OCC) with:
//! - TransactionContext: Read/write set tracking
//! - Snapshot isolation via SnapshotView
//! - Conflict detection at commit time (first committer wins)
//! - TransactionManager: validate, log, apply under one commit lock

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod manager;
pub mod transaction;
pub mod validation;

pub use manager::{TransactionManager, TransactionMetrics};
pub use transaction::{CommitError, TransactionContext, TransactionStatus};
pub use validation::{
    validate_read_set, validate_transaction, validate_write_set, ConflictType, ValidationResult,
};

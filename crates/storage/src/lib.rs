//! Storage layer for eventvault
//!
//! This crate implements the in-memory MVCC backend:
//! - VersionedStore: namespaced BTreeMaps with per-key version chains
//! - Global commit version with acquire/release visibility
//! - SnapshotView: reads pinned to a commit version

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod snapshot;
pub mod versioned;

pub use snapshot::SnapshotView;
pub use versioned::{VersionedStore, VersionedValue};

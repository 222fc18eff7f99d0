//! Snapshot views
//!
//! A [`SnapshotView`] pins a commit version. Every read through the view
//! sees exactly the data committed at or before that version, no matter how
//! many transactions commit afterwards. Acquisition is O(1): the view holds
//! an `Arc` to the store and a version number, nothing is cloned.
//!
//! While a view is alive its version is pinned in the store, which keeps
//! the values it can see out of version-chain pruning.

use crate::versioned::{VersionedStore, VersionedValue};
use eventvault_core::{CommitVersion, KeyValue, Result};
use std::sync::Arc;

/// Point-in-time view of a [`VersionedStore`]
#[derive(Debug)]
pub struct SnapshotView {
    store: Arc<VersionedStore>,
    version: CommitVersion,
}

impl SnapshotView {
    /// Pin the latest published version of `store`
    pub fn latest(store: &Arc<VersionedStore>) -> Self {
        Self {
            store: Arc::clone(store),
            version: store.pin_latest(),
        }
    }

    /// Pin an explicit version
    ///
    /// History older than every snapshot alive at the time may already have
    /// been pruned.
    pub fn at(store: &Arc<VersionedStore>, version: CommitVersion) -> Self {
        store.pin(version);
        Self {
            store: Arc::clone(store),
            version,
        }
    }

    /// The pinned commit version
    pub fn version(&self) -> CommitVersion {
        self.version
    }

    /// Check if a namespace exists (namespaces are never dropped)
    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.store.has_namespace(namespace)
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<VersionedStore> {
        &self.store
    }

    /// Point lookup as of the pinned version
    pub fn get(&self, namespace: &str, key: &[u8]) -> Result<Option<VersionedValue>> {
        self.store.get_at(namespace, key, self.version)
    }

    /// Prefix scan as of the pinned version
    pub fn scan_prefix(&self, namespace: &str, prefix: &[u8]) -> Result<Vec<KeyValue>> {
        self.store.scan_prefix_at(namespace, prefix, self.version)
    }
}

impl Clone for SnapshotView {
    fn clone(&self) -> Self {
        Self::at(&self.store, self.version)
    }
}

impl Drop for SnapshotView {
    fn drop(&mut self) {
        self.store.unpin(self.version);
    }
}

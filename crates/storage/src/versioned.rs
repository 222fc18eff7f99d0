//! Versioned storage
//!
//! Namespaced ordered maps where every key keeps a chain of versioned
//! values. Readers pick the newest value at or below their snapshot version,
//! so a writer never has to copy data to keep readers consistent.
//!
//! # Design
//!
//! - FxHashMap of namespaces: O(1) namespace lookup, fast non-crypto hash
//! - BTreeMap within a namespace: ordered keys for prefix scans
//! - Version chain per key: ascending commit versions
//!
//! # Pruning
//!
//! Live [`SnapshotView`](crate::SnapshotView)s pin their version in the
//! store. When a batch writes a key, entries of that key that no pinned
//! version can reach are dropped: everything older than the newest entry at
//! or below the oldest pin (or the current version when nothing is pinned).
//! Reads at unpinned historical versions are therefore not guaranteed.
//!
//! # Visibility
//!
//! `apply_batch` inserts every write under the namespace write lock and only
//! then publishes the new commit version. A reader that loaded version `v`
//! ignores entries stamped above `v`, so it never sees a partial batch.

use eventvault_core::{CommitVersion, KeyValue, Result, StoreError, StoreKey};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// A value stamped with the commit version that wrote it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedValue {
    /// Raw value bytes
    pub value: Vec<u8>,
    /// Commit version of the writing transaction
    pub version: CommitVersion,
}

/// One namespace: ordered keys, each with an ascending version chain
#[derive(Debug, Default)]
struct NamespaceData {
    entries: BTreeMap<Vec<u8>, Vec<VersionedValue>>,
}

impl NamespaceData {
    fn get_at(&self, key: &[u8], version: CommitVersion) -> Option<&VersionedValue> {
        self.entries
            .get(key)
            .and_then(|chain| chain.iter().rev().find(|v| v.version <= version))
    }
}

/// Drop entries older than the newest one visible at `floor`
fn prune_chain(chain: &mut Vec<VersionedValue>, floor: CommitVersion) {
    if let Some(keep_from) = chain.iter().rposition(|v| v.version <= floor) {
        chain.drain(..keep_from);
    }
}

/// MVCC store shared by all transactions
pub struct VersionedStore {
    namespaces: RwLock<FxHashMap<String, NamespaceData>>,
    /// Latest published commit version
    version: AtomicU64,
    /// Versions held by live snapshots, with their reader counts
    pins: Mutex<BTreeMap<CommitVersion, usize>>,
}

impl VersionedStore {
    /// Create an empty store at version 0
    pub fn new() -> Self {
        Self {
            namespaces: RwLock::new(FxHashMap::default()),
            version: AtomicU64::new(0),
            pins: Mutex::new(BTreeMap::new()),
        }
    }

    /// Latest published commit version
    #[inline]
    pub fn version(&self) -> CommitVersion {
        self.version.load(Ordering::Acquire)
    }

    /// Set version (used during recovery)
    pub fn set_version(&self, version: CommitVersion) {
        self.version.store(version, Ordering::Release);
    }

    /// Pin the latest published version and return it
    pub(crate) fn pin_latest(&self) -> CommitVersion {
        let mut pins = self.pins.lock();
        let version = self.version();
        *pins.entry(version).or_insert(0) += 1;
        version
    }

    /// Pin an explicit version
    pub(crate) fn pin(&self, version: CommitVersion) {
        *self.pins.lock().entry(version).or_insert(0) += 1;
    }

    /// Release one pin of `version`
    pub(crate) fn unpin(&self, version: CommitVersion) {
        let mut pins = self.pins.lock();
        if let Some(count) = pins.get_mut(&version) {
            *count -= 1;
            if *count == 0 {
                pins.remove(&version);
            }
        }
    }

    /// Oldest version a live reader can still ask for
    fn retention_floor(&self) -> CommitVersion {
        let pins = self.pins.lock();
        pins.keys().next().copied().unwrap_or_else(|| self.version())
    }

    /// Create a namespace if absent.
    ///
    /// Returns `true` if the namespace was created by this call.
    pub fn create_namespace(&self, name: &str) -> bool {
        let mut namespaces = self.namespaces.write();
        if namespaces.contains_key(name) {
            return false;
        }
        namespaces.insert(name.to_string(), NamespaceData::default());
        true
    }

    /// Check if a namespace exists
    pub fn has_namespace(&self, name: &str) -> bool {
        self.namespaces.read().contains_key(name)
    }

    /// Names of all namespaces, sorted
    pub fn namespace_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.namespaces.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Newest value of `key` at or below `version`
    pub fn get_at(
        &self,
        namespace: &str,
        key: &[u8],
        version: CommitVersion,
    ) -> Result<Option<VersionedValue>> {
        let namespaces = self.namespaces.read();
        let data = namespaces
            .get(namespace)
            .ok_or_else(|| StoreError::NamespaceNotFound(namespace.to_string()))?;
        Ok(data.get_at(key, version).cloned())
    }

    /// Commit version of the newest value of `key`, ignoring snapshots
    ///
    /// Used by commit-time validation. `None` means the key was never written.
    pub fn latest_version(&self, namespace: &str, key: &[u8]) -> Result<Option<CommitVersion>> {
        let namespaces = self.namespaces.read();
        let data = namespaces
            .get(namespace)
            .ok_or_else(|| StoreError::NamespaceNotFound(namespace.to_string()))?;
        Ok(data
            .entries
            .get(key)
            .and_then(|chain| chain.last())
            .map(|v| v.version))
    }

    /// Entries whose key starts with `prefix`, as of `version`, sorted by key
    pub fn scan_prefix_at(
        &self,
        namespace: &str,
        prefix: &[u8],
        version: CommitVersion,
    ) -> Result<Vec<KeyValue>> {
        let namespaces = self.namespaces.read();
        let data = namespaces
            .get(namespace)
            .ok_or_else(|| StoreError::NamespaceNotFound(namespace.to_string()))?;

        let results = data
            .entries
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .filter_map(|(k, chain)| {
                chain
                    .iter()
                    .rev()
                    .find(|v| v.version <= version)
                    .map(|v| (k.clone(), v.value.clone()))
            })
            .collect();
        Ok(results)
    }

    /// Apply a batch of writes atomically
    ///
    /// Every target namespace is checked before anything is written, so a
    /// missing namespace leaves the store untouched. All writes are stamped
    /// with `version`, which is published once the batch is in place.
    /// Chains of the written keys are pruned down to what live snapshots
    /// can still read.
    pub fn apply_batch(&self, writes: &[(StoreKey, Vec<u8>)], version: CommitVersion) -> Result<()> {
        let mut namespaces = self.namespaces.write();
        let floor = self.retention_floor();

        if let Some((missing, _)) = writes
            .iter()
            .find(|(key, _)| !namespaces.contains_key(&key.namespace))
        {
            return Err(StoreError::NamespaceNotFound(missing.namespace.clone()));
        }

        for (key, value) in writes {
            if let Some(data) = namespaces.get_mut(&key.namespace) {
                let chain = data.entries.entry(key.key.clone()).or_default();
                chain.push(VersionedValue {
                    value: value.clone(),
                    version,
                });
                prune_chain(chain, floor);
            }
        }

        if version > self.version() {
            self.set_version(version);
        }
        tracing::trace!(version, writes = writes.len(), "applied batch");
        Ok(())
    }

    /// Number of values retained for `key`, current one included
    pub fn chain_len(&self, namespace: &str, key: &[u8]) -> usize {
        self.namespaces
            .read()
            .get(namespace)
            .and_then(|data| data.entries.get(key))
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Number of distinct keys in a namespace
    pub fn key_count(&self, namespace: &str) -> usize {
        self.namespaces
            .read()
            .get(namespace)
            .map(|data| data.entries.len())
            .unwrap_or(0)
    }
}

impl Default for VersionedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VersionedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionedStore")
            .field("namespaces", &self.namespace_names())
            .field("version", &self.version())
            .finish()
    }
}

//! Core types for the key-value layer
//!
//! - [`StoreKey`]: a byte key scoped to a namespace
//! - [`CommitVersion`]: the global version stamped on every committed transaction

use serde::{Deserialize, Serialize};

/// Global commit version
///
/// Monotonically increasing. Every committed write transaction is assigned
/// exactly one commit version, and all keys it writes carry that version.
/// Version 0 is the empty store.
pub type CommitVersion = u64;

/// A key/value pair as returned by prefix scans
pub type KeyValue = (Vec<u8>, Vec<u8>);

/// A key inside a namespace
///
/// Namespaces partition the keyspace: the same key bytes in two different
/// namespaces are unrelated entries.
///
/// Ordered by namespace first, then by raw key bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoreKey {
    /// Namespace name
    pub namespace: String,
    /// Raw key bytes
    pub key: Vec<u8>,
}

impl StoreKey {
    /// Create a new key
    pub fn new(namespace: impl Into<String>, key: impl Into<Vec<u8>>) -> Self {
        Self {
            namespace: namespace.into(),
            key: key.into(),
        }
    }

    /// Check whether the key bytes start with `prefix`
    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.key.starts_with(prefix)
    }
}

impl std::fmt::Display for StoreKey {
    /// Display as `namespace/key`, with non-UTF-8 keys shown as bytes
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match std::str::from_utf8(&self.key) {
            Ok(s) => write!(f, "{}/{}", self.namespace, s),
            Err(_) => write!(f, "{}/{:?}", self.namespace, self.key),
        }
    }
}

//! EventStore: append and fetch versioned events
//!
//! Two namespaces in the underlying store:
//!
//! ```text
//! index  (default "ids"):    aggregate id -> highest version (decimal text)
//! events (default "events"): event key    -> payload
//! ```
//!
//! `save` is one read-write transaction: read the index, reject overlap,
//! put every event and the new index value, commit. `fetch` is one
//! read-only transaction, so it sees a consistent snapshot.

use crate::config::EventStoreConfig;
use crate::error::{Error, Result};
use crate::keys::{self, KeyLayout};
use crate::types::{EventRecord, History, Version};
use eventvault_core::{ReadTransaction, TransactionalStore, WriteTransaction};
use std::sync::Arc;
use tracing::{debug, warn};

/// Event-sourcing persistence over a transactional key-value store
///
/// Holds no locks or caches of its own; every call is an independent
/// transaction against the shared store.
pub struct EventStore<S: TransactionalStore> {
    store: Arc<S>,
    config: EventStoreConfig,
}

impl<S: TransactionalStore> EventStore<S> {
    /// Create an event store with the default configuration.
    ///
    /// Creates the index and event namespaces if absent. Calling this again
    /// on an initialized store is a no-op.
    pub fn new(store: Arc<S>) -> Result<Self> {
        Self::with_config(store, EventStoreConfig::default())
    }

    /// Create an event store with `config`.
    ///
    /// # Errors
    /// - [`Error::Config`] if the configuration is unusable
    /// - [`Error::Initialization`] if a namespace cannot be created
    pub fn with_config(store: Arc<S>, config: EventStoreConfig) -> Result<Self> {
        config.validate()?;

        for namespace in [&config.index_namespace, &config.event_namespace] {
            store
                .create_namespace(namespace)
                .map_err(|source| Error::Initialization {
                    namespace: namespace.clone(),
                    source,
                })?;
        }

        debug!(
            index = %config.index_namespace,
            events = %config.event_namespace,
            layout = %config.key_layout,
            "event store initialized"
        );
        Ok(Self { store, config })
    }

    /// Active configuration
    pub fn config(&self) -> &EventStoreConfig {
        &self.config
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Atomically append `records` to `aggregate_id`.
    ///
    /// `records` must be in ascending version order. Only the first record is
    /// checked against the current version; the index is set to the last
    /// record's version. An empty batch succeeds without touching the store.
    ///
    /// # Errors
    /// - [`Error::OverlappingVersion`] if the current version is >= the first
    ///   record's version
    /// - [`Error::InvalidBatch`] if batch validation is on and versions are
    ///   not strictly increasing
    /// - [`Error::Store`] on any store failure, including a commit conflict
    ///   with a concurrent writer. Nothing is persisted.
    pub fn save(&self, aggregate_id: &str, records: &[EventRecord]) -> Result<()> {
        validate_aggregate_id(aggregate_id)?;

        let (first, last) = match (records.first(), records.last()) {
            (Some(first), Some(last)) => (first.version, last.version),
            _ => return Ok(()),
        };
        if self.config.validate_batches {
            check_batch_order(aggregate_id, records)?;
        }

        let mut txn = self.store.begin_write()?;
        if let Err(e) = self.append(&mut txn, aggregate_id, records, first, last) {
            txn.rollback();
            return Err(e);
        }
        let commit_version = txn.commit()?;

        debug!(
            aggregate_id,
            first,
            last,
            count = records.len(),
            commit_version,
            "saved events"
        );
        Ok(())
    }

    fn append<T: WriteTransaction>(
        &self,
        txn: &mut T,
        aggregate_id: &str,
        records: &[EventRecord],
        first: Version,
        last: Version,
    ) -> Result<()> {
        if let Some(current) = read_current(txn, &self.config.index_namespace, aggregate_id)? {
            if current >= first {
                warn!(aggregate_id, version = first, current, "rejected overlapping version");
                return Err(Error::OverlappingVersion {
                    aggregate_id: aggregate_id.to_string(),
                    version: first,
                    current,
                });
            }
        }

        for record in records {
            let key = self.config.key_layout.event_key(aggregate_id, record.version);
            txn.put(&self.config.event_namespace, &key, &record.data)?;
        }
        txn.put(
            &self.config.index_namespace,
            keys::index_key(aggregate_id),
            &keys::encode_version(last),
        )?;
        Ok(())
    }

    /// History of `aggregate_id` up to `max_version`.
    ///
    /// A `max_version` of 0, or one above the highest persisted version, means
    /// "everything". Missing versions are skipped. An unknown aggregate has an
    /// empty history.
    pub fn fetch(&self, aggregate_id: &str, max_version: Version) -> Result<History> {
        validate_aggregate_id(aggregate_id)?;

        let mut txn = self.store.begin_read()?;
        let current = match read_current(&mut txn, &self.config.index_namespace, aggregate_id)? {
            Some(current) => current,
            None => return Ok(Vec::new()),
        };
        let bound = if max_version == 0 || max_version > current {
            current
        } else {
            max_version
        };

        let history = match self.config.key_layout {
            KeyLayout::Decimal => self.fetch_points(&mut txn, aggregate_id, bound)?,
            KeyLayout::Ordered => self.fetch_scan(&mut txn, aggregate_id, bound)?,
        };

        debug!(aggregate_id, bound, count = history.len(), "fetched events");
        Ok(history)
    }

    fn fetch_points<T: ReadTransaction>(
        &self,
        txn: &mut T,
        aggregate_id: &str,
        bound: Version,
    ) -> Result<History> {
        let mut history = Vec::new();
        for version in 0..=bound {
            let key = KeyLayout::Decimal.event_key(aggregate_id, version);
            if let Some(data) = txn.get(&self.config.event_namespace, &key)? {
                history.push(EventRecord { version, data });
            }
        }
        Ok(history)
    }

    fn fetch_scan<T: ReadTransaction>(
        &self,
        txn: &mut T,
        aggregate_id: &str,
        bound: Version,
    ) -> Result<History> {
        let prefix = keys::aggregate_prefix(aggregate_id);
        let mut history = Vec::new();
        for (key, data) in txn.scan_prefix(&self.config.event_namespace, &prefix)? {
            let version = keys::ordered_key_version(&prefix, &key)?;
            if version > bound {
                break;
            }
            history.push(EventRecord { version, data });
        }
        Ok(history)
    }

    /// Highest persisted version of `aggregate_id`, `None` if it has no events
    pub fn current_version(&self, aggregate_id: &str) -> Result<Option<Version>> {
        validate_aggregate_id(aggregate_id)?;
        let mut txn = self.store.begin_read()?;
        read_current(&mut txn, &self.config.index_namespace, aggregate_id)
    }
}

impl<S: TransactionalStore> Clone for EventStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: TransactionalStore> std::fmt::Debug for EventStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn read_current<T: ReadTransaction>(
    txn: &mut T,
    index_namespace: &str,
    aggregate_id: &str,
) -> Result<Option<Version>> {
    match txn.get(index_namespace, keys::index_key(aggregate_id))? {
        Some(bytes) => Ok(Some(keys::decode_version(&bytes)?)),
        None => Ok(None),
    }
}

fn validate_aggregate_id(aggregate_id: &str) -> Result<()> {
    if aggregate_id.is_empty() {
        return Err(Error::InvalidAggregateId(
            "aggregate id must not be empty".into(),
        ));
    }
    if aggregate_id.len() > u32::MAX as usize {
        return Err(Error::InvalidAggregateId(format!(
            "aggregate id of {} bytes exceeds the key limit",
            aggregate_id.len()
        )));
    }
    Ok(())
}

fn check_batch_order(aggregate_id: &str, records: &[EventRecord]) -> Result<()> {
    for pair in records.windows(2) {
        if pair[1].version <= pair[0].version {
            return Err(Error::InvalidBatch {
                aggregate_id: aggregate_id.to_string(),
                reason: format!(
                    "version {} follows version {}",
                    pair[1].version, pair[0].version
                ),
            });
        }
    }
    Ok(())
}

//! # EventVault
//!
//! Event-sourcing persistence over an embedded transactional key-value store.
//!
//! [`EventStore`] appends ordered, versioned events for an aggregate and
//! reads back its history up to a requested version. Event payloads are
//! opaque bytes; serialization and aggregate replay belong to the caller.
//!
//! ## Quick Start
//!
//! ```ignore
//! use eventvault::prelude::*;
//! use std::sync::Arc;
//!
//! let db = Arc::new(Database::open("./data")?);
//! let store = EventStore::new(db)?;
//!
//! store.save("u1", &[
//!     EventRecord::new(1, "created"),
//!     EventRecord::new(2, "email-set"),
//! ])?;
//!
//! let history = store.fetch("u1", 0)?;
//! assert_eq!(history.len(), 2);
//!
//! // Appending an existing version fails
//! let err = store.save("u1", &[EventRecord::new(2, "dup")]).unwrap_err();
//! assert!(err.is_overlapping_version());
//! ```
//!
//! ## Consistency
//!
//! - `save` commits all of its events and the new current version, or nothing
//! - `fetch` reads one consistent snapshot
//! - Concurrent saves to the same aggregate: the loser gets
//!   [`Error::OverlappingVersion`] or a retryable store conflict
//!
//! Any [`TransactionalStore`] can back an `EventStore`; [`Database`] is the
//! bundled implementation.

#![warn(missing_docs)]

mod config;
mod error;
mod event_store;
mod keys;
mod types;

pub mod prelude;

pub use config::{EventStoreConfig, DEFAULT_EVENT_NAMESPACE, DEFAULT_INDEX_NAMESPACE};
pub use error::{Error, Result};
pub use event_store::EventStore;
pub use keys::KeyLayout;
pub use types::{EventRecord, History, Version};

// Store contract and the bundled engine
pub use eventvault_core::{ReadTransaction, StoreError, TransactionalStore, WriteTransaction};
pub use eventvault_engine::{Database, DatabaseBuilder, DatabaseConfig, DurabilityMode};

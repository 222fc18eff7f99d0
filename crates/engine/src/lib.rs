//! Embedded transactional key-value engine
//!
//! [`Database`] ties the layers together:
//! - storage: MVCC VersionedStore
//! - concurrency: optimistic transactions and the commit protocol
//! - durability: WAL replay on open, one record per commit
//!
//! It implements [`TransactionalStore`](eventvault_core::TransactionalStore),
//! the contract consumed by the event store.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod database;
pub mod transaction;

pub use config::{ConfigError, DatabaseConfig};
pub use database::{Database, DatabaseBuilder, DatabaseMetrics, WAL_FILENAME};
pub use eventvault_durability::DurabilityMode;
pub use transaction::{ReadTxn, WriteTxn};

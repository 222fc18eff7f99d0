//! Core types and traits for eventvault
//!
//! This crate defines the contract shared by every layer:
//! - [`StoreKey`]: a key inside a named namespace
//! - [`StoreError`]: errors raised by the transactional store
//! - [`TransactionalStore`], [`ReadTransaction`], [`WriteTransaction`]: the
//!   capabilities the event store requires from an embedded key-value store

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Result, StoreError};
pub use traits::{ReadTransaction, TransactionalStore, WriteTransaction};
pub use types::{CommitVersion, KeyValue, StoreKey};

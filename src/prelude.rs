//! Convenient imports for EventVault.
//!
//! ```ignore
//! use eventvault::prelude::*;
//!
//! let store = EventStore::new(Arc::new(Database::ephemeral()))?;
//! store.save("u1", &[EventRecord::new(1, "created")])?;
//! ```

// Main entry point
pub use crate::event_store::EventStore;

// Error handling
pub use crate::error::{Error, Result};

// Core types
pub use crate::types::{EventRecord, History, Version};

// Configuration
pub use crate::config::EventStoreConfig;
pub use crate::keys::KeyLayout;

// Bundled store
pub use eventvault_engine::{Database, DurabilityMode};

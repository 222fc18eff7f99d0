//! Event store configuration
//!
//! ```toml
//! index_namespace = "ids"
//! event_namespace = "events"
//! key_layout = "ordered"
//! validate_batches = true
//! ```
//!
//! Every field is optional.

use crate::error::{Error, Result};
use crate::keys::KeyLayout;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default version index namespace
pub const DEFAULT_INDEX_NAMESPACE: &str = "ids";
/// Default event log namespace
pub const DEFAULT_EVENT_NAMESPACE: &str = "events";

/// Settings for an [`EventStore`](crate::EventStore)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EventStoreConfig {
    /// Namespace mapping aggregate id to its highest version
    pub index_namespace: String,
    /// Namespace holding event payloads
    pub event_namespace: String,
    /// Event log key layout
    pub key_layout: KeyLayout,
    /// Reject batches whose versions are not strictly increasing
    pub validate_batches: bool,
}

impl Default for EventStoreConfig {
    fn default() -> Self {
        Self {
            index_namespace: DEFAULT_INDEX_NAMESPACE.to_string(),
            event_namespace: DEFAULT_EVENT_NAMESPACE.to_string(),
            key_layout: KeyLayout::default(),
            validate_batches: false,
        }
    }
}

impl EventStoreConfig {
    /// Use `layout` for event log keys
    pub fn with_key_layout(mut self, layout: KeyLayout) -> Self {
        self.key_layout = layout;
        self
    }

    /// Turn strict batch validation on or off
    pub fn with_batch_validation(mut self, enabled: bool) -> Self {
        self.validate_batches = enabled;
        self
    }

    /// Use custom namespace names
    pub fn with_namespaces(mut self, index: impl Into<String>, events: impl Into<String>) -> Self {
        self.index_namespace = index.into();
        self.event_namespace = events.into();
        self
    }

    /// Parse a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Check that the namespaces are usable
    pub fn validate(&self) -> Result<()> {
        if self.index_namespace.is_empty() || self.event_namespace.is_empty() {
            return Err(Error::Config("namespace names must not be empty".into()));
        }
        if self.index_namespace == self.event_namespace {
            return Err(Error::Config(format!(
                "index and event namespaces must differ (both {:?})",
                self.index_namespace
            )));
        }
        Ok(())
    }
}

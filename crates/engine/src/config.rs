//! Database configuration
//!
//! Loadable from TOML:
//!
//! ```toml
//! path = "./data/events"
//! read_only = false
//!
//! [durability]
//! mode = "batched"
//! interval_ms = 100
//! batch_size = 1000
//! ```

use eventvault_durability::DurabilityMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config text is not valid TOML for this schema
    #[error("parse error: {0}")]
    Parse(String),

    /// Settings are inconsistent
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for opening a [`Database`](crate::Database)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Data directory; `None` for an ephemeral database
    pub path: Option<PathBuf>,
    /// WAL fsync policy
    pub durability: DurabilityMode,
    /// Reject all writes and namespace creation
    pub read_only: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            durability: DurabilityMode::default(),
            read_only: false,
        }
    }
}

impl DatabaseConfig {
    /// Configuration for an in-memory database with no files
    pub fn ephemeral() -> Self {
        Self {
            path: None,
            durability: DurabilityMode::None,
            read_only: false,
        }
    }

    /// Parse a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check that the settings can be honoured
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.is_none() && self.durability.requires_wal() {
            return Err(ConfigError::Invalid(format!(
                "durability mode {:?} requires a path",
                self.durability
            )));
        }
        if let DurabilityMode::Batched { batch_size: 0, .. } = self.durability {
            return Err(ConfigError::Invalid("batch_size must be at least 1".into()));
        }
        Ok(())
    }
}

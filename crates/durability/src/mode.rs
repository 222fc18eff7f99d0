//! Durability mode for WAL operations.
//!
//! Defines the durability guarantees for WAL writes.

use serde::{Deserialize, Serialize};

/// Durability mode for WAL writes.
///
/// Controls when data is fsynced to disk and the trade-off between
/// performance and durability.
///
/// # Mode Comparison
///
/// | Mode | WAL | fsync | Use Case |
/// |------|-----|-------|----------|
/// | None | no | never | Tests, ephemeral data |
/// | Batched | yes | every N commits or T ms | Production (balanced) |
/// | Strict | yes | every commit | Audit logs, zero loss |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DurabilityMode {
    /// No durability - all data lost when the process exits.
    ///
    /// Bypasses WAL entirely. No fsync, no file I/O.
    None,

    /// fsync after every commit (slow, maximum durability).
    Strict,

    /// fsync every N commits OR every T milliseconds.
    ///
    /// May lose up to batch_size commits or interval_ms of data on crash.
    Batched {
        /// Maximum time between fsyncs in milliseconds
        interval_ms: u64,
        /// Maximum commits between fsyncs
        batch_size: usize,
    },
}

impl DurabilityMode {
    /// Check if this mode requires WAL persistence.
    ///
    /// Returns false for None mode, true for all others.
    pub fn requires_wal(&self) -> bool {
        !matches!(self, DurabilityMode::None)
    }

    /// Check if this mode requires immediate fsync on every commit.
    ///
    /// Returns true only for Strict mode.
    pub fn requires_immediate_fsync(&self) -> bool {
        matches!(self, DurabilityMode::Strict)
    }

    /// Human-readable description of the mode.
    pub fn description(&self) -> &'static str {
        match self {
            DurabilityMode::None => "No durability (fastest, all data lost on exit)",
            DurabilityMode::Strict => "Sync fsync (safest, slowest)",
            DurabilityMode::Batched { .. } => "Batched fsync (balanced speed/safety)",
        }
    }

    /// Create a batched mode with recommended defaults.
    ///
    /// Returns `Batched { interval_ms: 100, batch_size: 1000 }`.
    pub fn buffered_default() -> Self {
        DurabilityMode::Batched {
            interval_ms: 100,
            batch_size: 1000,
        }
    }
}

impl Default for DurabilityMode {
    fn default() -> Self {
        Self::buffered_default()
    }
}

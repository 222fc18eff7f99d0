//! Event store value types

use serde::{Deserialize, Serialize};

/// Per-aggregate event sequence number
///
/// Strictly increasing per aggregate. By convention the first event is
/// version 1; version 0 is never written by well-behaved callers.
pub type Version = u64;

/// One event: a version and its opaque payload
///
/// The payload encoding belongs to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the aggregate's history
    pub version: Version,
    /// Opaque event bytes
    pub data: Vec<u8>,
}

impl EventRecord {
    /// Create a record
    pub fn new(version: Version, data: impl Into<Vec<u8>>) -> Self {
        Self {
            version,
            data: data.into(),
        }
    }
}

/// Events of one aggregate in ascending version order
pub type History = Vec<EventRecord>;

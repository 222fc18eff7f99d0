//! Store key encoding
//!
//! Two layouts for the event log:
//!
//! ```text
//! Decimal:  "<version>:<aggregate>"                      e.g. b"12:user-7"
//! Ordered:  [len: u32 BE][aggregate bytes][version: u64 BE]
//! ```
//!
//! Decimal keys are unique per (aggregate, version) but do not sort by
//! aggregate or numerically ("10" < "2"), so every fetch is a series of
//! point lookups. Ordered keys group an aggregate's events contiguously in
//! numeric order; a fetch is one prefix scan.
//!
//! The two layouts are not interchangeable on existing data: the layout a
//! namespace was written with must be used to read it.
//!
//! The version index maps the raw aggregate bytes to the highest version as
//! decimal text.

use crate::types::Version;
use byteorder::{BigEndian, ByteOrder};
use eventvault_core::StoreError;
use serde::{Deserialize, Serialize};

const LEN_PREFIX: usize = 4;
const VERSION_SUFFIX: usize = 8;

/// Event log key layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyLayout {
    /// Version-first decimal text, point-lookup fetch
    #[default]
    Decimal,
    /// Aggregate-first big-endian binary, prefix-scan fetch
    Ordered,
}

impl KeyLayout {
    /// Event log key for `(aggregate_id, version)`
    pub fn event_key(&self, aggregate_id: &str, version: Version) -> Vec<u8> {
        match self {
            KeyLayout::Decimal => format!("{}:{}", version, aggregate_id).into_bytes(),
            KeyLayout::Ordered => {
                let id = aggregate_id.as_bytes();
                let mut key = aggregate_prefix(aggregate_id);
                key.resize(LEN_PREFIX + id.len() + VERSION_SUFFIX, 0);
                BigEndian::write_u64(&mut key[LEN_PREFIX + id.len()..], version);
                key
            }
        }
    }

    /// Check if fetch can use a prefix scan
    pub fn supports_scan(&self) -> bool {
        matches!(self, KeyLayout::Ordered)
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            KeyLayout::Decimal => "decimal",
            KeyLayout::Ordered => "ordered",
        }
    }
}

impl std::fmt::Display for KeyLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered-layout prefix shared by every event of `aggregate_id`
///
/// The length prefix keeps "ab" from matching the events of "abc".
pub fn aggregate_prefix(aggregate_id: &str) -> Vec<u8> {
    let id = aggregate_id.as_bytes();
    let mut prefix = vec![0u8; LEN_PREFIX];
    BigEndian::write_u32(&mut prefix, id.len() as u32);
    prefix.extend_from_slice(id);
    prefix
}

/// Version of an ordered-layout key found under `prefix`
pub fn ordered_key_version(prefix: &[u8], key: &[u8]) -> Result<Version, StoreError> {
    if key.len() != prefix.len() + VERSION_SUFFIX || !key.starts_with(prefix) {
        return Err(StoreError::Corruption(format!(
            "malformed event key of {} bytes under prefix of {} bytes",
            key.len(),
            prefix.len()
        )));
    }
    Ok(BigEndian::read_u64(&key[prefix.len()..]))
}

/// Version index key for `aggregate_id`
pub fn index_key(aggregate_id: &str) -> &[u8] {
    aggregate_id.as_bytes()
}

/// Version index value
pub fn encode_version(version: Version) -> Vec<u8> {
    version.to_string().into_bytes()
}

/// Parse a version index value
pub fn decode_version(bytes: &[u8]) -> Result<Version, StoreError> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse::<Version>().ok())
        .ok_or_else(|| {
            StoreError::Corruption(format!(
                "version index value {:?} is not a decimal integer",
                String::from_utf8_lossy(bytes)
            ))
        })
}

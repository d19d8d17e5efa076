//! Strongly-typed identifier value objects.
//!
//! Alternative and observation identifiers come from the shipment data that
//! callers already hold (forwarder codes, shipment numbers), so they wrap
//! strings rather than generated UUIDs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Identifier of a ranked alternative (forwarder, route, carrier).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AlternativeId(String);

impl AlternativeId {
    /// Creates an AlternativeId, rejecting blank values.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::empty_field("alternative_id"));
        }
        Ok(Self(value))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AlternativeId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AlternativeId> for String {
    fn from(id: AlternativeId) -> Self {
        id.0
    }
}

impl fmt::Display for AlternativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AlternativeId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Longest queue file stem; well under common 255-byte name limits.
pub const MAX_FILE_STEM_LEN: usize = 120;

const FILE_STEM_PREFIX_LEN: usize = 80;

/// Identifier of one observed outcome (typically a shipment id).
///
/// Drift feedback is deduplicated on this value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObservationId(String);

impl ObservationId {
    /// Creates an ObservationId, rejecting blank values.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::empty_field("observation_id"));
        }
        Ok(Self(value))
    }

    /// Creates a random ObservationId for outcomes without a natural key.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File-system safe form used as a queue file stem.
    ///
    /// ASCII alphanumerics, `-` and `_` pass through; every other byte is
    /// written as `~xx` hex. Stems longer than `MAX_FILE_STEM_LEN` keep a
    /// prefix followed by `.` and a UUIDv5 of the full id. The escaping
    /// never emits `.`, so bounded and plain stems cannot collide.
    pub fn file_stem(&self) -> String {
        let mut stem = String::with_capacity(self.0.len());
        for byte in self.0.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
                stem.push(char::from(byte));
            } else {
                stem.push_str(&format!("~{:02x}", byte));
            }
        }

        if stem.len() > MAX_FILE_STEM_LEN {
            let digest = Uuid::new_v5(&Uuid::NAMESPACE_OID, self.0.as_bytes());
            stem.truncate(FILE_STEM_PREFIX_LEN);
            stem.push('.');
            stem.push_str(&digest.simple().to_string());
        }
        stem
    }
}

impl TryFrom<String> for ObservationId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ObservationId> for String {
    fn from(id: ObservationId) -> Self {
        id.0
    }
}

impl fmt::Display for ObservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ObservationId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Monotonic version number of an engine weight snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightsVersion(u64);

impl WeightsVersion {
    /// The first active snapshot.
    pub const INITIAL: Self = Self(1);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// The version that follows this one.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for WeightsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

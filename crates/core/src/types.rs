//! Identity types for thingdb
//!
//! - RecordId: globally unique identifier of a Thing or Action
//! - RecordKind: Thing/Action discriminator

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a record
///
/// A RecordId is a wrapper around a UUID v4. Ids are unique across the
/// whole store regardless of kind, and are never reused after deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Create a new random RecordId using UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a RecordId from raw bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Parse a RecordId from a string representation
    ///
    /// Accepts standard UUID format (with or without hyphens).
    /// Returns None if the string is not a valid UUID.
    pub fn from_string(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }

    /// Get the raw bytes of this RecordId
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for RecordId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Record kind discriminator
///
/// Immutable for the lifetime of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordKind {
    /// A noun-like entity
    Thing,
    /// A verb-like entity
    Action,
}

impl RecordKind {
    /// All kinds, in a stable order
    pub const ALL: [RecordKind; 2] = [RecordKind::Thing, RecordKind::Action];

    /// Name used in cross-reference `type` fields
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Thing => "Thing",
            RecordKind::Action => "Action",
        }
    }

    /// Collection name used in REST paths (`things`, `actions`)
    pub fn plural(&self) -> &'static str {
        match self {
            RecordKind::Thing => "things",
            RecordKind::Action => "actions",
        }
    }

    /// Parse a kind name, returning None for anything else
    ///
    /// Matching is exact on the capitalised names used by cross-references.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Thing" => Some(RecordKind::Thing),
            "Action" => Some(RecordKind::Action),
            _ => None,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_unique() {
        let a = RecordId::new();
        let b = RecordId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_record_id_string_roundtrip() {
        let id = RecordId::new();
        let parsed = RecordId::from_string(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
        let parsed: RecordId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_record_id_invalid_string() {
        assert!(RecordId::from_string("not-a-uuid").is_none());
        assert!("".parse::<RecordId>().is_err());
    }

    #[test]
    fn test_record_id_bytes() {
        let id = RecordId::from_bytes([7u8; 16]);
        assert_eq!(id.as_bytes(), &[7u8; 16]);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(RecordKind::Thing.as_str(), "Thing");
        assert_eq!(RecordKind::Action.plural(), "actions");
        assert_eq!(RecordKind::parse("Action"), Some(RecordKind::Action));
        assert_eq!(RecordKind::parse("thing"), None);
        assert_eq!(RecordKind::parse("TestThing"), None);
    }
}

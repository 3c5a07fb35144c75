//! Property value types for thingdb
//!
//! This module defines:
//! - PropertyValue: the closed set of values a property can hold
//! - CrossRef: typed, location-aware pointer to another record
//! - TargetType: what a cross-reference claims to point at
//!
//! ## Value Model
//!
//! Exactly four variants: Number, String, Boolean, Reference. There is no
//! null, array, or nested object. A JSON object is only accepted when it
//! encodes a cross-reference:
//!
//! ```json
//! { "$cref": "<uuid>", "locationUrl": "http://localhost", "type": "Thing" }
//! ```
//!
//! Numbers are always `f64`; integral JSON numbers are widened.

use crate::types::{RecordId, RecordKind};
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value as Json};
use std::fmt;
use thiserror::Error;

/// JSON key holding the referenced id
pub const CREF_KEY: &str = "$cref";
/// JSON key holding the hosting node's address
pub const LOCATION_KEY: &str = "locationUrl";
/// JSON key holding the target type
pub const TYPE_KEY: &str = "type";

/// Conversion failures between JSON and property values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// JSON shape has no property-value counterpart
    #[error("unsupported value of type {found}")]
    Unsupported {
        /// JSON type that was found
        found: &'static str,
    },
    /// Object carried `$cref` but was not a well-formed reference
    #[error("malformed cross-reference: {0}")]
    MalformedReference(String),
    /// NaN or infinite number
    #[error("number is not finite")]
    NonFiniteNumber,
    /// Property bag key is empty
    #[error("property name must not be empty")]
    EmptyPropertyName,
    /// Property bag itself was not a JSON object
    #[error("schema must be an object, found {found}")]
    NotAnObject {
        /// JSON type that was found
        found: &'static str,
    },
}

pub(crate) fn json_type_name(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

// =============================================================================
// TargetType
// =============================================================================

/// What a cross-reference claims to point at
///
/// Either a kind discriminator (`Thing`, `Action`) or the name of a
/// registered class. Whether a class name is known is decided by the
/// schema registry, not here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetType {
    /// Any record of this kind
    Kind(RecordKind),
    /// A record of this class
    Class(String),
}

impl TargetType {
    /// Parse a `type` field
    ///
    /// Kind names win over class names; the empty string is rejected.
    pub fn parse(s: &str) -> Result<Self, ValueError> {
        if s.is_empty() {
            return Err(ValueError::MalformedReference("empty type".into()));
        }
        Ok(match RecordKind::parse(s) {
            Some(kind) => TargetType::Kind(kind),
            None => TargetType::Class(s.to_string()),
        })
    }

    /// String form as written on the wire
    pub fn as_str(&self) -> &str {
        match self {
            TargetType::Kind(kind) => kind.as_str(),
            TargetType::Class(class) => class,
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RecordKind> for TargetType {
    fn from(kind: RecordKind) -> Self {
        TargetType::Kind(kind)
    }
}

// =============================================================================
// CrossRef
// =============================================================================

/// Typed pointer from one record's property to another record
///
/// Opaque until resolved: storing a CrossRef never requires the target to
/// exist. An empty `location_url` means the local node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CrossRef {
    /// Referenced record id (`$cref`)
    pub target_id: RecordId,
    /// Declared target kind or class (`type`)
    pub target_type: TargetType,
    /// Address of the hosting node (`locationUrl`)
    pub location_url: String,
}

impl CrossRef {
    /// Create a reference
    pub fn new(
        target_id: RecordId,
        target_type: impl Into<TargetType>,
        location_url: impl Into<String>,
    ) -> Self {
        Self {
            target_id,
            target_type: target_type.into(),
            location_url: location_url.into(),
        }
    }

    /// Reference to a record of `kind` on the local node
    pub fn local(target_id: RecordId, kind: RecordKind) -> Self {
        Self::new(target_id, kind, "")
    }

    /// Encode as a `$cref` object
    pub fn to_json(&self) -> Json {
        let mut map = Map::new();
        map.insert(CREF_KEY.to_string(), Json::String(self.target_id.to_string()));
        map.insert(
            LOCATION_KEY.to_string(),
            Json::String(self.location_url.clone()),
        );
        map.insert(
            TYPE_KEY.to_string(),
            Json::String(self.target_type.as_str().to_string()),
        );
        Json::Object(map)
    }

    /// Decode a `$cref` object
    ///
    /// `$cref` and `type` are required; a missing `locationUrl` means local.
    /// Keys other than the three reference keys are rejected.
    pub fn from_json(map: &Map<String, Json>) -> Result<Self, ValueError> {
        if let Some(extra) = map
            .keys()
            .find(|k| !matches!(k.as_str(), CREF_KEY | LOCATION_KEY | TYPE_KEY))
        {
            return Err(ValueError::MalformedReference(format!(
                "unexpected key '{}'",
                extra
            )));
        }

        let target_id = match map.get(CREF_KEY) {
            Some(Json::String(s)) => RecordId::from_string(s).ok_or_else(|| {
                ValueError::MalformedReference(format!("'{}' is not a uuid", s))
            })?,
            Some(other) => {
                return Err(ValueError::MalformedReference(format!(
                    "{} must be a string, found {}",
                    CREF_KEY,
                    json_type_name(other)
                )))
            }
            None => return Err(ValueError::MalformedReference(format!("missing {}", CREF_KEY))),
        };

        let target_type = match map.get(TYPE_KEY) {
            Some(Json::String(s)) => TargetType::parse(s)?,
            Some(other) => {
                return Err(ValueError::MalformedReference(format!(
                    "{} must be a string, found {}",
                    TYPE_KEY,
                    json_type_name(other)
                )))
            }
            None => return Err(ValueError::MalformedReference(format!("missing {}", TYPE_KEY))),
        };

        let location_url = match map.get(LOCATION_KEY) {
            Some(Json::String(s)) => s.clone(),
            Some(other) => {
                return Err(ValueError::MalformedReference(format!(
                    "{} must be a string, found {}",
                    LOCATION_KEY,
                    json_type_name(other)
                )))
            }
            None => String::new(),
        };

        Ok(Self {
            target_id,
            target_type,
            location_url,
        })
    }
}

impl Serialize for CrossRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry(CREF_KEY, &self.target_id.to_string())?;
        map.serialize_entry(LOCATION_KEY, &self.location_url)?;
        map.serialize_entry(TYPE_KEY, self.target_type.as_str())?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for CrossRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Json::deserialize(deserializer)? {
            Json::Object(map) => CrossRef::from_json(&map).map_err(D::Error::custom),
            other => Err(D::Error::custom(ValueError::Unsupported {
                found: json_type_name(&other),
            })),
        }
    }
}

// =============================================================================
// PropertyValue
// =============================================================================

/// Value held by a single property
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// 64-bit floating point
    Number(f64),
    /// UTF-8 string
    String(String),
    /// Boolean
    Boolean(bool),
    /// Cross-reference to another record
    Reference(CrossRef),
}

impl PropertyValue {
    /// Type name used in validation messages and class schemas
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Number(_) => "number",
            PropertyValue::String(_) => "string",
            PropertyValue::Boolean(_) => "boolean",
            PropertyValue::Reference(_) => "cref",
        }
    }

    /// Get as f64 if this is a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as string slice if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as bool if this is a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the cross-reference if this is one
    pub fn as_reference(&self) -> Option<&CrossRef> {
        match self {
            PropertyValue::Reference(r) => Some(r),
            _ => None,
        }
    }

    /// Mutable access to the cross-reference if this is one
    pub fn as_reference_mut(&mut self) -> Option<&mut CrossRef> {
        match self {
            PropertyValue::Reference(r) => Some(r),
            _ => None,
        }
    }

    /// Check if this is a cross-reference
    pub fn is_reference(&self) -> bool {
        matches!(self, PropertyValue::Reference(_))
    }

    /// Reject values that cannot be stored (non-finite numbers)
    pub fn validate(&self) -> Result<(), ValueError> {
        match self {
            PropertyValue::Number(n) if !n.is_finite() => Err(ValueError::NonFiniteNumber),
            _ => Ok(()),
        }
    }

    /// Convert from JSON
    pub fn from_json(value: &Json) -> Result<Self, ValueError> {
        match value {
            Json::Number(n) => n
                .as_f64()
                .map(PropertyValue::Number)
                .ok_or(ValueError::NonFiniteNumber),
            Json::String(s) => Ok(PropertyValue::String(s.clone())),
            Json::Bool(b) => Ok(PropertyValue::Boolean(*b)),
            Json::Object(map) if map.contains_key(CREF_KEY) => {
                CrossRef::from_json(map).map(PropertyValue::Reference)
            }
            other => Err(ValueError::Unsupported {
                found: json_type_name(other),
            }),
        }
    }

    /// Convert to JSON
    ///
    /// Non-finite numbers have no JSON form and become `null`; they are
    /// rejected by [`PropertyValue::validate`] before reaching storage.
    pub fn to_json(&self) -> Json {
        match self {
            PropertyValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            PropertyValue::String(s) => Json::String(s.clone()),
            PropertyValue::Boolean(b) => Json::Bool(*b),
            PropertyValue::Reference(r) => r.to_json(),
        }
    }
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PropertyValue::Number(n) => serializer.serialize_f64(*n),
            PropertyValue::String(s) => serializer.serialize_str(s),
            PropertyValue::Boolean(b) => serializer.serialize_bool(*b),
            PropertyValue::Reference(r) => r.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for PropertyValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = Json::deserialize(deserializer)?;
        PropertyValue::from_json(&json).map_err(D::Error::custom)
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Number(n)
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        PropertyValue::Number(n as f64)
    }
}

impl From<i32> for PropertyValue {
    fn from(n: i32) -> Self {
        PropertyValue::Number(n as f64)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Boolean(b)
    }
}

impl From<CrossRef> for PropertyValue {
    fn from(r: CrossRef) -> Self {
        PropertyValue::Reference(r)
    }
}

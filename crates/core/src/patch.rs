//! Patch operations on a record's property bag
//!
//! This module defines:
//! - PatchDocument: the wire form `{op, path, value}`
//! - PatchOp: add / remove / replace
//! - PatchPath: a parsed `/schema/<property>[/<field>]` pointer
//! - PatchOperation: a fully parsed operation with its converted value
//!
//! # Path Syntax
//!
//! Paths are RFC 6901 pointers. The first segment must be `schema`, the
//! second names the property. A third segment addresses one field of a
//! cross-reference value:
//!
//! | Path | Target |
//! |------|--------|
//! | `/schema/testNumber` | property `testNumber` |
//! | `/schema/testCref/locationUrl` | `locationUrl` of the reference in `testCref` |
//! | `/schema/a~1b` | property `a/b` |
//!
//! Parsing happens once per operation, before any mutation, so a batch with
//! a malformed operation is rejected without touching the bag.

use crate::error::PatchError;
use crate::types::RecordId;
use crate::value::{PropertyValue, TargetType, CREF_KEY, LOCATION_KEY, TYPE_KEY};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as Json;
use std::fmt;
use std::str::FromStr;

/// Root segment every patch path must start with
pub const SCHEMA_ROOT: &str = "schema";

/// Wire form of a single patch operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchDocument {
    /// Operation name
    pub op: String,
    /// RFC 6901 pointer
    pub path: String,
    /// Value for add/replace; an explicit `null` is `Some(Json::Null)`
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Json>,
}

/// Only an absent `value` field maps to `None`
fn present_value<'de, D>(deserializer: D) -> Result<Option<Json>, D::Error>
where
    D: Deserializer<'de>,
{
    Json::deserialize(deserializer).map(Some)
}

impl PatchDocument {
    /// `add` operation
    pub fn add(path: impl Into<String>, value: Json) -> Self {
        Self {
            op: "add".into(),
            path: path.into(),
            value: Some(value),
        }
    }

    /// `replace` operation
    pub fn replace(path: impl Into<String>, value: Json) -> Self {
        Self {
            op: "replace".into(),
            path: path.into(),
            value: Some(value),
        }
    }

    /// `remove` operation
    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            op: "remove".into(),
            path: path.into(),
            value: None,
        }
    }
}

/// Supported operation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatchOp {
    /// Insert or overwrite
    Add,
    /// Delete an existing property
    Remove,
    /// Overwrite an existing property
    Replace,
}

impl PatchOp {
    /// Operation name as on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            PatchOp::Add => "add",
            PatchOp::Remove => "remove",
            PatchOp::Replace => "replace",
        }
    }

    /// Whether the operation carries a value
    pub fn takes_value(&self) -> bool {
        !matches!(self, PatchOp::Remove)
    }
}

impl FromStr for PatchOp {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(PatchOp::Add),
            "remove" => Ok(PatchOp::Remove),
            "replace" => Ok(PatchOp::Replace),
            other => Err(PatchError::UnsupportedOp(other.to_string())),
        }
    }
}

impl fmt::Display for PatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field of a cross-reference addressable by a nested path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrossRefField {
    /// `$cref`
    TargetId,
    /// `locationUrl`
    LocationUrl,
    /// `type`
    TargetType,
}

impl CrossRefField {
    /// Parse a path segment
    pub fn parse(segment: &str) -> Option<Self> {
        match segment {
            CREF_KEY => Some(CrossRefField::TargetId),
            LOCATION_KEY => Some(CrossRefField::LocationUrl),
            TYPE_KEY => Some(CrossRefField::TargetType),
            _ => None,
        }
    }

    /// Key as on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            CrossRefField::TargetId => CREF_KEY,
            CrossRefField::LocationUrl => LOCATION_KEY,
            CrossRefField::TargetType => TYPE_KEY,
        }
    }
}

/// Parsed patch path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatchPath {
    /// Property name (unescaped)
    pub property: String,
    /// Cross-reference field, for nested paths
    pub field: Option<CrossRefField>,
}

impl PatchPath {
    /// Path to a whole property
    pub fn property(name: impl Into<String>) -> Self {
        Self {
            property: name.into(),
            field: None,
        }
    }

    /// Path to one field of a reference property
    pub fn field(name: impl Into<String>, field: CrossRefField) -> Self {
        Self {
            property: name.into(),
            field: Some(field),
        }
    }
}

/// Undo RFC 6901 escaping; `~1` before `~0` so `~01` decodes to `~1`.
fn unescape_segment(segment: &str) -> Option<String> {
    let mut out = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

impl FromStr for PatchPath {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unsupported = || PatchError::UnsupportedPath(s.to_string());

        let rest = s.strip_prefix('/').ok_or_else(unsupported)?;
        let segments = rest
            .split('/')
            .map(unescape_segment)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(unsupported)?;

        match segments.as_slice() {
            [root, property] if root == SCHEMA_ROOT && !property.is_empty() => {
                Ok(PatchPath::property(property.clone()))
            }
            [root, property, field] if root == SCHEMA_ROOT && !property.is_empty() => {
                let field = CrossRefField::parse(field).ok_or_else(unsupported)?;
                Ok(PatchPath::field(property.clone(), field))
            }
            _ => Err(unsupported()),
        }
    }
}

impl fmt::Display for PatchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", SCHEMA_ROOT, escape_segment(&self.property))?;
        if let Some(field) = self.field {
            write!(f, "/{}", field.as_str())?;
        }
        Ok(())
    }
}

/// New value for one field of a cross-reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// New `$cref`
    TargetId(RecordId),
    /// New `locationUrl`
    LocationUrl(String),
    /// New `type`
    TargetType(TargetType),
}

/// Converted value of an add/replace operation
#[derive(Debug, Clone, PartialEq)]
pub enum PatchValue {
    /// Whole property value
    Property(PropertyValue),
    /// Single reference field
    Field(FieldValue),
}

/// A parsed, validated patch operation
#[derive(Debug, Clone, PartialEq)]
pub struct PatchOperation {
    /// Operation kind
    pub op: PatchOp,
    /// Target
    pub path: PatchPath,
    /// Converted value (None for remove)
    pub value: Option<PatchValue>,
}

impl PatchOperation {
    /// Parse a wire operation
    ///
    /// Checks, in order: op name, path shape, presence and convertibility
    /// of the value. Values of `remove` operations are ignored.
    pub fn parse(doc: &PatchDocument) -> Result<Self, PatchError> {
        let op: PatchOp = doc.op.parse()?;
        let path: PatchPath = doc.path.parse()?;

        let value = if op.takes_value() {
            let raw = doc.value.as_ref().ok_or_else(|| PatchError::MissingValue {
                op: op.to_string(),
                path: doc.path.clone(),
            })?;
            Some(Self::convert_value(&doc.path, path.field, raw)?)
        } else {
            None
        };

        Ok(Self { op, path, value })
    }

    fn convert_value(
        raw_path: &str,
        field: Option<CrossRefField>,
        raw: &Json,
    ) -> Result<PatchValue, PatchError> {
        let invalid = |reason: String| PatchError::InvalidValue {
            path: raw_path.to_string(),
            reason,
        };

        let Some(field) = field else {
            return PropertyValue::from_json(raw)
                .and_then(|v| v.validate().map(|_| v))
                .map(PatchValue::Property)
                .map_err(|e| invalid(e.to_string()));
        };

        let text = raw
            .as_str()
            .ok_or_else(|| invalid(format!("{} must be a string", field.as_str())))?;
        let value = match field {
            CrossRefField::TargetId => FieldValue::TargetId(
                RecordId::from_string(text)
                    .ok_or_else(|| invalid(format!("'{}' is not a uuid", text)))?,
            ),
            CrossRefField::LocationUrl => FieldValue::LocationUrl(text.to_string()),
            CrossRefField::TargetType => {
                FieldValue::TargetType(TargetType::parse(text).map_err(|e| invalid(e.to_string()))?)
            }
        };
        Ok(PatchValue::Field(value))
    }
}

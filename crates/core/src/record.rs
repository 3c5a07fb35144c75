//! Record: a stored Thing or Action
//!
//! `id` and `kind` never change. `class` is fixed at creation. `context`
//! changes only through a full update; `schema` through full updates and
//! patches. Every successful mutation bumps `version` and `updated_at`.

use crate::schema::PropertyBag;
use crate::types::{RecordId, RecordKind};
use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A versioned Thing or Action
///
/// The serialized field names follow the REST representation
/// (`@class`, `@context`, `creationTimeUnix`, `lastUpdateTimeUnix`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier
    pub id: RecordId,
    /// Thing or Action
    pub kind: RecordKind,
    /// Registered class name
    #[serde(rename = "@class")]
    pub class: String,
    /// Context annotation
    #[serde(rename = "@context")]
    pub context: String,
    /// Property bag
    #[serde(default)]
    pub schema: PropertyBag,
    /// Starts at 1, increments on every mutation
    pub version: u64,
    /// Creation time (millis since epoch)
    #[serde(rename = "creationTimeUnix")]
    pub created_at: i64,
    /// Last modification time (millis since epoch)
    #[serde(rename = "lastUpdateTimeUnix")]
    pub updated_at: i64,
}

impl Record {
    /// Create a record with a fresh id
    pub fn new(
        kind: RecordKind,
        class: impl Into<String>,
        context: impl Into<String>,
        schema: PropertyBag,
    ) -> Self {
        Self::with_id(RecordId::new(), kind, class, context, schema)
    }

    /// Create a record with a caller-chosen id
    ///
    /// Used when rebuilding records that already have an identity
    /// (log replay, remote fetches).
    pub fn with_id(
        id: RecordId,
        kind: RecordKind,
        class: impl Into<String>,
        context: impl Into<String>,
        schema: PropertyBag,
    ) -> Self {
        let now = now_millis();
        Self {
            id,
            kind,
            class: class.into(),
            context: context.into(),
            schema,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Increment version and update timestamp
    ///
    /// Call this after any modification to the record.
    pub fn touch(&mut self) {
        self.version += 1;
        self.updated_at = now_millis().max(self.updated_at);
    }

    /// JSON representation
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id.to_string(),
            "kind": self.kind.as_str(),
            "@class": self.class,
            "@context": self.context,
            "schema": self.schema.to_json(),
            "version": self.version,
            "creationTimeUnix": self.created_at,
            "lastUpdateTimeUnix": self.updated_at,
        })
    }
}

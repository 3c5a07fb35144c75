//! PropertyBag: the dynamic `schema` payload of a record
//!
//! Property names are unique; insertion order is irrelevant. Entries are
//! kept sorted so serialized forms are deterministic.

use crate::value::{json_type_name, CrossRef, PropertyValue, ValueError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use std::collections::btree_map::{self, BTreeMap};

/// Mapping from property name to value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyBag {
    properties: BTreeMap<String, PropertyValue>,
}

impl PropertyBag {
    /// Create an empty bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a property
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Mutable access to a property
    pub fn get_mut(&mut self, name: &str) -> Option<&mut PropertyValue> {
        self.properties.get_mut(name)
    }

    /// Insert or overwrite a property, returning the previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Option<PropertyValue> {
        self.properties.insert(name.into(), value.into())
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Remove a property, returning its value
    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        self.properties.remove(name)
    }

    /// Check if a property exists
    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Check if the bag has no properties
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Iterate over properties in name order
    pub fn iter(&self) -> btree_map::Iter<'_, String, PropertyValue> {
        self.properties.iter()
    }

    /// Property names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// All cross-reference properties
    pub fn references(&self) -> impl Iterator<Item = (&str, &CrossRef)> {
        self.properties
            .iter()
            .filter_map(|(name, value)| value.as_reference().map(|r| (name.as_str(), r)))
    }

    /// Overwrite this bag's entries with every entry of `other`
    ///
    /// Properties absent from `other` are kept.
    pub fn merge(&mut self, other: PropertyBag) {
        self.properties.extend(other.properties);
    }

    /// Check every value can be stored and every name is non-empty
    pub fn validate(&self) -> Result<(), ValueError> {
        for (name, value) in &self.properties {
            if name.is_empty() {
                return Err(ValueError::EmptyPropertyName);
            }
            value.validate()?;
        }
        Ok(())
    }

    /// Convert from a JSON object
    ///
    /// `null` is accepted as the empty bag, matching clients that send no
    /// schema at all on create.
    pub fn from_json(value: &Json) -> Result<Self, ValueError> {
        match value {
            Json::Null => Ok(Self::new()),
            Json::Object(map) => Self::from_json_map(map),
            other => Err(ValueError::NotAnObject {
                found: json_type_name(other),
            }),
        }
    }

    /// Convert from a JSON map
    pub fn from_json_map(map: &Map<String, Json>) -> Result<Self, ValueError> {
        let mut bag = Self::new();
        for (name, value) in map {
            if name.is_empty() {
                return Err(ValueError::EmptyPropertyName);
            }
            bag.insert(name.clone(), PropertyValue::from_json(value)?);
        }
        Ok(bag)
    }

    /// Convert to a JSON object
    pub fn to_json(&self) -> Json {
        Json::Object(
            self.properties
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<PropertyValue>> FromIterator<(K, V)> for PropertyBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            properties: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for PropertyBag {
    type Item = (String, PropertyValue);
    type IntoIter = btree_map::IntoIter<String, PropertyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.properties.into_iter()
    }
}

impl<'a> IntoIterator for &'a PropertyBag {
    type Item = (&'a String, &'a PropertyValue);
    type IntoIter = btree_map::Iter<'a, String, PropertyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.properties.iter()
    }
}

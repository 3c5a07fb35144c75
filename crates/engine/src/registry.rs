//! Class registries
//!
//! - `ClassRegistry`: explicit classes with typed properties, strict
//! - `OpenRegistry`: accepts every class and property
//!
//! A `ClassRegistry` can be loaded from a JSON schema document:
//!
//! ```json
//! {
//!   "things":  [{"class": "TestThing",  "properties": [{"name": "testNumber", "dataType": ["number"]}]}],
//!   "actions": [{"class": "TestAction", "properties": [{"name": "testCref",   "dataType": ["TestThing"]}]}]
//! }
//! ```
//!
//! A `dataType` naming a primitive (`number`, `int`, `string`, `text`,
//! `date`, `boolean`) declares a scalar; anything else is a list of
//! allowed reference targets (class names or `Thing` / `Action`).

use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_json::Value as Json;
use std::collections::BTreeMap;
use std::path::Path;
use thingdb_core::{
    Error, PropertyValue, RecordKind, Result, SchemaRegistry, TargetType,
};

/// Declared type of a class property
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyType {
    /// Floating point number
    Number,
    /// String
    String,
    /// Boolean
    Boolean,
    /// Cross-reference to one of `targets` (class or kind names)
    CrossRef {
        /// Allowed target types
        targets: Vec<String>,
    },
}

impl PropertyType {
    /// Short name used in error messages
    pub fn name(&self) -> &'static str {
        match self {
            PropertyType::Number => "number",
            PropertyType::String => "string",
            PropertyType::Boolean => "boolean",
            PropertyType::CrossRef { .. } => "cref",
        }
    }

    /// Cross-reference to any of the given targets
    pub fn cref<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PropertyType::CrossRef {
            targets: targets.into_iter().map(Into::into).collect(),
        }
    }

    fn from_data_type(data_type: &[String]) -> Option<Self> {
        match data_type {
            [single] => match single.as_str() {
                "number" | "int" => Some(PropertyType::Number),
                "string" | "text" | "date" => Some(PropertyType::String),
                "boolean" => Some(PropertyType::Boolean),
                other => Some(PropertyType::cref([other])),
            },
            [] => None,
            many => Some(PropertyType::cref(many.iter().cloned())),
        }
    }
}

/// A class and its declared properties
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSchema {
    /// Class name
    pub name: String,
    /// Kind of records using this class
    pub kind: RecordKind,
    /// Declared properties
    pub properties: BTreeMap<String, PropertyType>,
}

impl ClassSchema {
    /// Class with no properties
    pub fn new(name: impl Into<String>, kind: RecordKind) -> Self {
        Self {
            name: name.into(),
            kind,
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style property declaration
    pub fn property(mut self, name: impl Into<String>, property_type: PropertyType) -> Self {
        self.properties.insert(name.into(), property_type);
        self
    }
}

// Wire shape of the schema document
#[derive(Deserialize)]
struct SchemaDocument {
    #[serde(default)]
    things: Vec<ClassDocument>,
    #[serde(default)]
    actions: Vec<ClassDocument>,
}

#[derive(Deserialize)]
struct ClassDocument {
    class: String,
    #[serde(default)]
    properties: Vec<PropertyDocument>,
}

#[derive(Deserialize)]
struct PropertyDocument {
    name: String,
    #[serde(rename = "dataType", deserialize_with = "one_or_many")]
    data_type: Vec<String>,
}

fn one_or_many<'de, D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

/// Strict registry of explicitly declared classes
///
/// Unknown classes, undeclared properties, and type mismatches all fail
/// with [`Error::Validation`].
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: FxHashMap<String, ClassSchema>,
}

impl ClassRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration
    ///
    /// # Errors
    ///
    /// Same as [`ClassRegistry::register`].
    pub fn with_class(mut self, class: ClassSchema) -> Result<Self> {
        self.register(class)?;
        Ok(self)
    }

    /// Register a class
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a class of the same name exists or the
    /// name collides with a kind name.
    pub fn register(&mut self, class: ClassSchema) -> Result<()> {
        if RecordKind::parse(&class.name).is_some() {
            return Err(Error::Config(format!(
                "class name '{}' is reserved for the record kind",
                class.name
            )));
        }
        if self.classes.contains_key(&class.name) {
            return Err(Error::Config(format!("class '{}' registered twice", class.name)));
        }
        self.classes.insert(class.name.clone(), class);
        Ok(())
    }

    /// Look up a class
    pub fn class(&self, name: &str) -> Option<&ClassSchema> {
        self.classes.get(name)
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Check if no classes are registered
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Build a registry from a schema document
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the document is malformed, declares a
    /// class twice, or references an unknown target class.
    pub fn from_json(document: &Json) -> Result<Self> {
        let doc = SchemaDocument::deserialize(document)
            .map_err(|e| Error::Config(format!("invalid schema document: {}", e)))?;

        let mut registry = Self::new();
        let groups = [(RecordKind::Thing, doc.things), (RecordKind::Action, doc.actions)];
        for (kind, classes) in groups {
            for class_doc in classes {
                let mut class = ClassSchema::new(class_doc.class, kind);
                for prop in class_doc.properties {
                    let property_type = PropertyType::from_data_type(&prop.data_type).ok_or_else(|| {
                        Error::Config(format!(
                            "property '{}' of class '{}' has an empty dataType",
                            prop.name, class.name
                        ))
                    })?;
                    class.properties.insert(prop.name, property_type);
                }
                registry.register(class)?;
            }
        }
        registry.check_targets()?;
        Ok(registry)
    }

    /// Load a schema document from disk
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or is invalid.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read schema file '{}': {}", path.display(), e))
        })?;
        let document: Json = serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse schema file '{}': {}", path.display(), e))
        })?;
        Self::from_json(&document)
    }

    /// Every declared reference target must name a kind or a class
    fn check_targets(&self) -> Result<()> {
        for class in self.classes.values() {
            for (name, property_type) in &class.properties {
                if let PropertyType::CrossRef { targets } = property_type {
                    if let Some(unknown) = targets
                        .iter()
                        .find(|t| RecordKind::parse(t).is_none() && !self.classes.contains_key(t.as_str()))
                    {
                        return Err(Error::Config(format!(
                            "property '{}' of class '{}' references unknown class '{}'",
                            name, class.name, unknown
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Whether a reference of type `target` may be stored in a property
    /// declared with `targets`
    fn target_allowed(&self, targets: &[String], target: &TargetType) -> bool {
        match target {
            TargetType::Class(class) => {
                let kind = self.kind_of(class);
                targets
                    .iter()
                    .any(|t| t == class || kind.map_or(false, |k| t == k.as_str()))
            }
            TargetType::Kind(kind) => targets
                .iter()
                .any(|t| t == kind.as_str() || self.kind_of(t) == Some(*kind)),
        }
    }

    fn class_for(&self, kind: RecordKind, class: &str) -> Result<&ClassSchema> {
        let schema = self
            .classes
            .get(class)
            .ok_or_else(|| Error::validation(format!("unknown class '{}'", class)))?;
        if schema.kind != kind {
            return Err(Error::validation(format!(
                "class '{}' is a {} class, not a {} class",
                class, schema.kind, kind
            )));
        }
        Ok(schema)
    }
}

impl SchemaRegistry for ClassRegistry {
    fn has_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    fn kind_of(&self, class: &str) -> Option<RecordKind> {
        self.classes.get(class).map(|c| c.kind)
    }

    fn check_class(&self, kind: RecordKind, class: &str) -> Result<()> {
        self.class_for(kind, class).map(|_| ())
    }

    fn check_property(
        &self,
        kind: RecordKind,
        class: &str,
        name: &str,
        value: &PropertyValue,
    ) -> Result<()> {
        let schema = self.class_for(kind, class)?;
        let declared = schema.properties.get(name).ok_or_else(|| {
            Error::validation(format!("class '{}' has no property '{}'", class, name))
        })?;

        let matches = match (declared, value) {
            (PropertyType::Number, PropertyValue::Number(_))
            | (PropertyType::String, PropertyValue::String(_))
            | (PropertyType::Boolean, PropertyValue::Boolean(_)) => true,
            (PropertyType::CrossRef { targets }, PropertyValue::Reference(cref)) => {
                if !self.target_allowed(targets, &cref.target_type) {
                    return Err(Error::validation(format!(
                        "property '{}' of class '{}' cannot reference type '{}' (allowed: {})",
                        name,
                        class,
                        cref.target_type,
                        targets.join(", ")
                    )));
                }
                true
            }
            _ => false,
        };

        if matches {
            Ok(())
        } else {
            Err(Error::validation(format!(
                "property '{}' of class '{}' expects {}, found {}",
                name,
                class,
                declared.name(),
                value.type_name()
            )))
        }
    }
}

/// Registry that accepts every class and property
///
/// Used when no schema document is configured. Only the structural checks
/// of the property bag itself still apply.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenRegistry;

impl SchemaRegistry for OpenRegistry {
    fn has_class(&self, name: &str) -> bool {
        !name.is_empty()
    }

    fn kind_of(&self, _class: &str) -> Option<RecordKind> {
        None
    }

    fn check_class(&self, _kind: RecordKind, class: &str) -> Result<()> {
        if class.is_empty() {
            return Err(Error::validation("class must not be empty"));
        }
        Ok(())
    }

    fn check_property(
        &self,
        _kind: RecordKind,
        _class: &str,
        _name: &str,
        _value: &PropertyValue,
    ) -> Result<()> {
        Ok(())
    }
}

//! Update Engine: full-document updates
//!
//! The class of a record is fixed at creation; an update naming another
//! class is rejected. What happens to properties missing from the new
//! schema is decided by [`UpdateMode`].

use crate::database::config::UpdateMode;
use crate::validation::validate_bag;
use thingdb_core::{Error, PropertyBag, Record, Result, SchemaRegistry};

/// Builds the record a full update produces
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateEngine {
    mode: UpdateMode,
}

impl UpdateEngine {
    /// Engine using `mode`
    pub fn new(mode: UpdateMode) -> Self {
        Self { mode }
    }

    /// Configured mode
    pub fn mode(&self) -> UpdateMode {
        self.mode
    }

    /// Compute the updated record; `current` is not modified
    ///
    /// The result has its version bumped and is ready to be stored.
    ///
    /// # Errors
    ///
    /// `Validation` if `class` differs from the stored class or the new bag
    /// does not fit it; `Reference(InvalidType)` for reference values with
    /// an unknown type.
    pub fn apply(
        &self,
        registry: &dyn SchemaRegistry,
        current: &Record,
        class: &str,
        context: String,
        schema: PropertyBag,
    ) -> Result<Record> {
        if class != current.class {
            return Err(Error::validation(format!(
                "cannot change class of {} from '{}' to '{}'",
                current.id, current.class, class
            )));
        }

        let bag = match self.mode {
            UpdateMode::Replace => schema,
            UpdateMode::Merge => {
                let mut merged = current.schema.clone();
                merged.merge(schema);
                merged
            }
        };
        validate_bag(registry, current.kind, class, &bag)?;

        let mut next = current.clone();
        next.context = context;
        next.schema = bag;
        next.touch();
        Ok(next)
    }
}

//! Core traits for injected collaborators
//!
//! The record store depends on these traits rather than on concrete
//! implementations, so persistence and schema enforcement can be swapped
//! (or faked in tests) without touching the engine.

use crate::error::{Error, Result};
use crate::record::Record;
use crate::schema::PropertyBag;
use crate::types::{RecordId, RecordKind};
use crate::value::PropertyValue;

/// Persistence backend for records
///
/// Thread safety: all methods must be safe to call concurrently from
/// multiple threads. Implementations store whole records; a `put` is
/// visible to readers either entirely or not at all.
pub trait RecordStorage: Send + Sync {
    /// Get the current record for an id
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get(&self, id: &RecordId) -> Result<Option<Record>>;

    /// Insert or overwrite a record
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails; the previous
    /// record (if any) stays visible in that case.
    fn put(&self, record: Record) -> Result<()>;

    /// Delete a record, returning it if it existed
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn delete(&self, id: &RecordId) -> Result<Option<Record>>;

    /// All records, optionally restricted to one kind, ordered by id
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn scan(&self, kind: Option<RecordKind>) -> Result<Vec<Record>>;

    /// Number of stored records
    fn len(&self) -> usize;

    /// Check if no records are stored
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Source of class definitions
///
/// Implementations decide how strict they are; an open registry may accept
/// every class and property.
pub trait SchemaRegistry: Send + Sync {
    /// Whether `name` is a known class of any kind
    fn has_class(&self, name: &str) -> bool;

    /// Kind of a known class, if the registry tracks it
    fn kind_of(&self, class: &str) -> Option<RecordKind>;

    /// Check that `class` may be used for records of `kind`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the class is unknown or belongs to
    /// the other kind.
    fn check_class(&self, kind: RecordKind, class: &str) -> Result<()>;

    /// Check a single property against the class definition
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for undeclared properties or type
    /// mismatches.
    fn check_property(
        &self,
        kind: RecordKind,
        class: &str,
        name: &str,
        value: &PropertyValue,
    ) -> Result<()>;

    /// Check every property of a bag
    ///
    /// # Errors
    ///
    /// Returns the first property error, or [`Error::Validation`] if the bag
    /// holds values that cannot be stored.
    fn check_bag(&self, kind: RecordKind, class: &str, bag: &PropertyBag) -> Result<()> {
        bag.validate().map_err(Error::from)?;
        for (name, value) in bag {
            self.check_property(kind, class, name, value)?;
        }
        Ok(())
    }
}

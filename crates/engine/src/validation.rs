//! Write-time checks shared by create, full update and patch
//!
//! Reference values are checked for a usable `type` only. Targets are
//! never looked up here; dangling references are legal until resolved.

use thingdb_core::{CrossRef, PropertyBag, RecordKind, ReferenceError, Result, SchemaRegistry, TargetType};

/// Check that a reference names a kind or a class the registry knows
///
/// # Errors
///
/// Returns `Reference(InvalidType)` otherwise.
pub fn check_reference_type(registry: &dyn SchemaRegistry, cref: &CrossRef) -> Result<()> {
    match &cref.target_type {
        TargetType::Kind(_) => Ok(()),
        TargetType::Class(class) if registry.has_class(class) => Ok(()),
        TargetType::Class(class) => Err(ReferenceError::InvalidType(class.clone()).into()),
    }
}

/// Validate a complete property bag for a record of `kind` / `class`
///
/// Order: class, reference types, then every property against the class.
///
/// # Errors
///
/// `Validation` for class or property failures, `Reference(InvalidType)`
/// for reference values with an unknown type.
pub fn validate_bag(
    registry: &dyn SchemaRegistry,
    kind: RecordKind,
    class: &str,
    bag: &PropertyBag,
) -> Result<()> {
    registry.check_class(kind, class)?;
    for (_, cref) in bag.references() {
        check_reference_type(registry, cref)?;
    }
    registry.check_bag(kind, class, bag)
}

//! Patch Engine
//!
//! Applies an ordered batch of patch operations to a working copy of a
//! record's property bag.
//!
//! ## Sequence
//!
//! ```text
//! 1. Parse every operation (op, path, value); nothing is touched yet
//! 2. Apply operations in order to a clone of the bag
//! 3. Validate reference types and the bag against the class
//! 4. Hand the new bag back; the caller writes it in one storage put
//! ```
//!
//! Any error drops the working copy, so a failed batch changes nothing.

use crate::validation::validate_bag;
use thingdb_core::{
    CrossRef, FieldValue, PatchDocument, PatchError, PatchOp, PatchOperation, PatchPath, PatchValue,
    PropertyBag, PropertyValue, Record, Result, SchemaRegistry,
};

/// Parse a batch of wire operations
///
/// # Errors
///
/// The first operation that fails to parse aborts the batch.
pub fn parse_batch(docs: &[PatchDocument]) -> std::result::Result<Vec<PatchOperation>, PatchError> {
    docs.iter().map(PatchOperation::parse).collect()
}

/// Stateless patch applier
#[derive(Debug, Clone, Copy, Default)]
pub struct PatchEngine;

impl PatchEngine {
    /// Compute the bag `record` would have after `docs`
    ///
    /// `record` is not modified.
    ///
    /// # Errors
    ///
    /// `Patch(..)` for malformed or inapplicable operations,
    /// `Reference(InvalidType)` for reference values with an unknown type,
    /// `Validation` if the result does not fit the class.
    pub fn apply(
        &self,
        registry: &dyn SchemaRegistry,
        record: &Record,
        docs: &[PatchDocument],
    ) -> Result<PropertyBag> {
        let operations = parse_batch(docs)?;

        let mut working = record.schema.clone();
        for operation in &operations {
            apply_operation(&mut working, operation)?;
        }

        validate_bag(registry, record.kind, &record.class, &working)?;
        Ok(working)
    }
}

fn path_not_found(path: &PatchPath) -> PatchError {
    PatchError::PathNotFound(path.to_string())
}

fn apply_operation(bag: &mut PropertyBag, operation: &PatchOperation) -> std::result::Result<(), PatchError> {
    let path = &operation.path;
    match (path.field, operation.op) {
        (None, PatchOp::Add) => {
            bag.insert(path.property.clone(), property_value(operation)?);
        }
        (None, PatchOp::Replace) => {
            let slot = bag
                .get_mut(&path.property)
                .ok_or_else(|| path_not_found(path))?;
            *slot = property_value(operation)?;
        }
        (None, PatchOp::Remove) => {
            bag.remove(&path.property).ok_or_else(|| path_not_found(path))?;
        }
        (Some(_), PatchOp::Remove) => {
            // Every field of a reference is mandatory
            return Err(PatchError::UnsupportedPath(path.to_string()));
        }
        (Some(_), PatchOp::Add | PatchOp::Replace) => {
            let cref = bag
                .get_mut(&path.property)
                .ok_or_else(|| path_not_found(path))?
                .as_reference_mut()
                .ok_or_else(|| path_not_found(path))?;
            set_field(cref, field_value(operation)?);
        }
    }
    Ok(())
}

fn property_value(operation: &PatchOperation) -> std::result::Result<PropertyValue, PatchError> {
    match &operation.value {
        Some(PatchValue::Property(value)) => Ok(value.clone()),
        _ => Err(PatchError::MissingValue {
            op: operation.op.to_string(),
            path: operation.path.to_string(),
        }),
    }
}

fn field_value(operation: &PatchOperation) -> std::result::Result<&FieldValue, PatchError> {
    match &operation.value {
        Some(PatchValue::Field(value)) => Ok(value),
        _ => Err(PatchError::MissingValue {
            op: operation.op.to_string(),
            path: operation.path.to_string(),
        }),
    }
}

fn set_field(cref: &mut CrossRef, value: &FieldValue) {
    match value {
        FieldValue::TargetId(id) => cref.target_id = *id,
        FieldValue::LocationUrl(url) => cref.location_url = url.clone(),
        FieldValue::TargetType(target_type) => cref.target_type = target_type.clone(),
    }
}

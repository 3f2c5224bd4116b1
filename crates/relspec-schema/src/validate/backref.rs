//! # Back-Reference Validation
//!
//! A relationship may name its reverse side with `x-backref`. Declaring
//! that property on the target is optional; when it is declared it must
//! mirror the forward relationship.

use serde_json::Value;

use relspec_core::{keys, Document, SchemaResult, SchemaType, ValidationResult};

use crate::classify::Relationship;
use crate::resolve::iterate::{self, Scope};
use crate::resolve::peek;

use super::column_mismatch;

fn sub_properties(
    doc: &Document,
    owner: &Value,
    property_name: &str,
    items: &Value,
) -> SchemaResult<ValidationResult> {
    for (name, sub) in iterate::properties(doc, items, Scope::All)? {
        if name == property_name {
            return Ok(ValidationResult::fail(format!(
                "{name} :: properties cannot contain the property of the relationship to avoid circular references"
            )));
        }
        let Some(column) = iterate::property(doc, owner, name, Scope::All)? else {
            return Ok(ValidationResult::fail(format!(
                "{name} :: could not find {name} in the model schema"
            )));
        };
        if let Some(mismatch) = column_mismatch(doc, column, sub)? {
            return Ok(ValidationResult::fail(format!("{name} :: {mismatch}")));
        }
    }
    Ok(ValidationResult::ok())
}

fn backref(
    doc: &Document,
    owner: &Value,
    property_name: &str,
    relationship: &Relationship<'_>,
    declared: &Value,
) -> SchemaResult<ValidationResult> {
    if peek::read_only(doc, declared)? != Some(true) {
        return Ok(ValidationResult::fail("the property must be readOnly"));
    }

    let expected = relationship.kind.backref_shape().schema_type();
    let actual = peek::schema_type(doc, declared)?;
    if actual != expected {
        return Ok(ValidationResult::fail(format!(
            "{} :: expected {expected}, actual is {actual}.",
            keys::TYPE
        )));
    }
    if expected != SchemaType::Array {
        return Ok(ValidationResult::ok());
    }

    let Some(items) = peek::items(doc, declared)? else {
        return Ok(ValidationResult::fail(format!("{} :: not defined", keys::ITEMS)));
    };
    let items_type = peek::schema_type(doc, items)?;
    if items_type != SchemaType::Object {
        return Ok(ValidationResult::fail(format!(
            "{} :: {} :: expected object, actual is {items_type}.",
            keys::ITEMS,
            keys::TYPE
        )));
    }
    Ok(sub_properties(doc, owner, property_name, items)?.within(keys::ITEMS))
}

/// Validate the declared back-reference of a relationship, if any.
///
/// Passes when the relationship names no back-reference or when the
/// target does not declare it.
pub fn check_backref(
    doc: &Document,
    owner: &Value,
    property_name: &str,
    relationship: &Relationship<'_>,
) -> ValidationResult {
    let Some(name) = relationship.modifiers.backref else {
        return ValidationResult::ok();
    };
    let declared = match iterate::property(doc, relationship.target, name, Scope::All) {
        Ok(Some(declared)) => declared,
        Ok(None) => return ValidationResult::ok(),
        Err(err) => return err.into(),
    };
    backref(doc, owner, property_name, relationship, declared)
        .unwrap_or_else(ValidationResult::from)
        .within(name)
        .within("backref property")
}

//! # Relationship Validation
//!
//! Checks a relationship property in four steps:
//!
//! 1. gather it (one target, no modifier set twice) and require a
//!    back-reference for one-to-one;
//! 2. the target must pass model validation on its own;
//! 3. many-to-one, one-to-one and one-to-many: a foreign-key column
//!    declared under the synthesized name must agree with the synthesized
//!    one; many-to-many: both ends need a table and a single primary key;
//! 4. the declared back-reference, if any, must mirror the relationship.

use serde_json::Value;

use relspec_core::{keys, Document, RelationshipKind, SchemaError, SchemaResult, ValidationResult};

use crate::classify::{gather, Relationship};
use crate::foreign_key::calculate_gathered;
use crate::resolve::iterate::{self, Scope};
use crate::resolve::peek;

use super::backref::check_backref;
use super::model::check_model;
use super::property::check_simple;
use super::column_mismatch;

fn declared_foreign_key(
    doc: &Document,
    owner_name: &str,
    owner: &Value,
    property_name: &str,
    relationship: &Relationship<'_>,
) -> SchemaResult<ValidationResult> {
    let Some(artifact) = calculate_gathered(doc, owner_name, owner, property_name, relationship)? else {
        return Ok(ValidationResult::ok());
    };
    let receiving = if artifact.owner_schema_name == owner_name {
        owner
    } else {
        doc.get(&artifact.owner_schema_name).ok_or_else(|| {
            SchemaError::ReferenceNotFound(format!(
                "{} was not found in the schemas",
                artifact.owner_schema_name
            ))
        })?
    };
    let Some(declared) = iterate::property(doc, receiving, &artifact.property_name, Scope::All)? else {
        return Ok(ValidationResult::ok());
    };

    let frame = |reason: String| {
        ValidationResult::fail(reason)
            .within(&artifact.property_name)
            .within("foreign key")
    };
    if let Some(mismatch) = column_mismatch(doc, &artifact.property_schema, declared)? {
        return Ok(frame(mismatch));
    }
    let expected = artifact.foreign_key().unwrap_or_default();
    match peek::foreign_key(doc, declared)? {
        Some(actual) if actual == expected => Ok(ValidationResult::ok()),
        actual => Ok(frame(format!(
            "{} :: expected {expected}, actual is {}.",
            keys::FOREIGN_KEY,
            actual.unwrap_or("not defined")
        ))),
    }
}

fn association_end(doc: &Document, schema: &Value) -> SchemaResult<ValidationResult> {
    if peek::tablename(doc, schema)?.is_none() {
        return Ok(ValidationResult::fail(format!(
            "{} :: a many-to-many relationship requires a table on both sides",
            keys::TABLENAME
        )));
    }
    match iterate::primary_keys(doc, schema, Scope::All)?.as_slice() {
        [] => Ok(ValidationResult::fail(format!(
            "{} :: a many-to-many relationship requires a primary key on both sides",
            keys::PRIMARY_KEY
        ))),
        [(name, column)] => Ok(check_simple(doc, column).within(name).within("primary key")),
        _ => Ok(ValidationResult::fail(format!(
            "{} :: currently only support single primary key schemas",
            keys::PRIMARY_KEY
        ))),
    }
}

fn relationship(
    doc: &Document,
    owner_name: &str,
    owner: &Value,
    property_name: &str,
    property: &Value,
) -> SchemaResult<ValidationResult> {
    let gathered = gather(doc, property)?;

    if gathered.kind == RelationshipKind::OneToOne && gathered.modifiers.backref.is_none() {
        return Ok(ValidationResult::fail(
            "a one-to-one relationship must define a back reference",
        ));
    }

    let target = check_model(doc, gathered.target)
        .within(gathered.target_name)
        .within("referenced schema");
    if !target.is_valid() {
        return Ok(target);
    }

    let keys_result = match gathered.kind {
        RelationshipKind::ManyToMany => {
            let owner_end = association_end(doc, owner)?.within(owner_name);
            if owner_end.is_valid() {
                association_end(doc, gathered.target)?.within(gathered.target_name)
            } else {
                owner_end
            }
        }
        _ => declared_foreign_key(doc, owner_name, owner, property_name, &gathered)?,
    };
    if !keys_result.is_valid() {
        return Ok(keys_result);
    }

    Ok(check_backref(doc, owner, property_name, &gathered))
}

/// Validate a relationship property of `owner`.
pub fn check_relationship(
    doc: &Document,
    owner_name: &str,
    owner: &Value,
    property_name: &str,
    property: &Value,
) -> ValidationResult {
    relationship(doc, owner_name, owner, property_name, property).unwrap_or_else(ValidationResult::from)
}

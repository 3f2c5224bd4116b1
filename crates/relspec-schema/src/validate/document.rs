//! # Document Consistency
//!
//! Whole-graph uniqueness checks that no single schema can see:
//!
//! - every table name belongs to one schema (single-table inheritance
//!   children share their parent's table and are skipped);
//! - every many-to-many association table name belongs to one
//!   relationship.
//!
//! Schemas that fail to resolve are skipped here; their own validation
//! reports the problem.

use std::collections::HashMap;

use serde_json::Value;

use relspec_core::{keys, Document, RelationshipKind, SchemaError, ValidationResult};

use crate::classify::{gather, is_relationship};
use crate::resolve::iterate::{self, Scope};
use crate::resolve::{is_single_table_child, peek};

fn owned_tablename<'a>(doc: &'a Document, schema: &'a Value) -> Option<&'a str> {
    let tablename = peek::tablename(doc, schema).ok().flatten()?;
    match is_single_table_child(doc, schema) {
        Ok(false) => Some(tablename),
        _ => None,
    }
}

fn unique_tablenames(doc: &Document) -> Result<(), SchemaError> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for (name, schema) in doc.iter() {
        let Some(tablename) = owned_tablename(doc, schema) else {
            continue;
        };
        if let Some(first) = seen.insert(tablename, name) {
            return Err(SchemaError::ConstraintViolation(format!(
                "{} :: {tablename:?} is already used by {first}, duplicate defined on {name}",
                keys::TABLENAME
            )));
        }
    }
    Ok(())
}

/// Every `(schema, property, secondary)` many-to-many relationship
/// declared at each model's own level.
fn secondaries(doc: &Document) -> Vec<(&str, &str, &str)> {
    let mut out = Vec::new();
    for (name, schema) in doc.iter() {
        if peek::tablename(doc, schema).ok().flatten().is_none() {
            continue;
        }
        let Ok(properties) = iterate::properties(doc, schema, Scope::Model) else {
            continue;
        };
        for (property_name, property) in properties {
            if !is_relationship(doc, property).unwrap_or(false) {
                continue;
            }
            let Ok(relationship) = gather(doc, property) else {
                continue;
            };
            if let (RelationshipKind::ManyToMany, Some(secondary)) =
                (relationship.kind, relationship.modifiers.secondary)
            {
                out.push((name, property_name, secondary));
            }
        }
    }
    out
}

fn unique_secondaries(doc: &Document) -> Result<(), SchemaError> {
    let mut seen: HashMap<&str, (&str, &str)> = HashMap::new();
    for (name, property, secondary) in secondaries(doc) {
        if let Some((first_name, first_property)) = seen.insert(secondary, (name, property)) {
            return Err(SchemaError::ConstraintViolation(format!(
                "{} :: {secondary:?} is already used by {first_name}.{first_property}, duplicate defined on {name}.{property}",
                keys::SECONDARY
            )));
        }
    }
    Ok(())
}

/// Check table and association name uniqueness across the document.
pub fn check_document(doc: &Document) -> ValidationResult {
    unique_tablenames(doc)
        .and_then(|()| unique_secondaries(doc))
        .into()
}

//! # Property Validation
//!
//! Checks one property according to its [`PropertyKind`]:
//!
//! - **simple**: a scalar column, possibly a foreign key;
//! - **json**: a column stored as JSON, whatever its shape;
//! - **backref**: a read-only object, or array of objects, of simple
//!   sub-properties;
//! - **relationship**: delegated to [`relationship::check_relationship`].

use serde_json::{Map, Value};

use relspec_core::{describe, keys, Document, SchemaError, SchemaResult, SchemaType, ValidationResult};

use crate::classify::{property_kind, PropertyKind};
use crate::resolve::iterate::{self, Scope};
use crate::resolve::{is_single_table_child, peek};

use super::{column_mismatch, relationship};

fn check_kwargs(kwargs: Option<&Map<String, Value>>) -> Option<String> {
    let reserved = kwargs?
        .keys()
        .find(|key| keys::COLUMN_RESERVED_KWARGS.contains(&key.as_str()))?;
    Some(format!(
        "{} :: {reserved} is controlled by the schema and cannot be set",
        keys::KWARGS
    ))
}

/// Split a `table.column` foreign key.
pub fn split_foreign_key(foreign_key: &str) -> SchemaResult<(&str, &str)> {
    match foreign_key.split_once('.') {
        Some((table, column)) if !table.is_empty() && !column.is_empty() && !column.contains('.') => {
            Ok((table, column))
        }
        _ => Err(SchemaError::extension(format!(
            "{} :: expected the format <table>.<column>, actual is {foreign_key:?}",
            keys::FOREIGN_KEY
        ))),
    }
}

/// The column a `table.column` foreign key points at.
pub fn foreign_key_target<'a>(doc: &'a Document, foreign_key: &str) -> SchemaResult<(&'a str, &'a Value)> {
    let (table, column) = split_foreign_key(foreign_key)?;
    for (name, schema) in doc.iter() {
        // Malformed schemas elsewhere are reported on their own.
        if peek::tablename(doc, schema).ok().flatten() != Some(table)
            || is_single_table_child(doc, schema).unwrap_or(false)
        {
            continue;
        }
        return iterate::property(doc, schema, column, Scope::All)?
            .map(|property| (name, property))
            .ok_or_else(|| {
                SchemaError::ReferenceNotFound(format!(
                    "{} :: {foreign_key} :: the column {column:?} was not found on {name}",
                    keys::FOREIGN_KEY
                ))
            });
    }
    Err(SchemaError::ReferenceNotFound(format!(
        "{} :: {foreign_key} :: no schema defines the table {table:?}",
        keys::FOREIGN_KEY
    )))
}

fn simple(doc: &Document, property: &Value) -> SchemaResult<ValidationResult> {
    let schema_type = peek::schema_type(doc, property)?;
    if !schema_type.is_simple() {
        return Ok(ValidationResult::fail(format!(
            "{} :: expected integer, number, string or boolean, actual is {schema_type}.",
            keys::TYPE
        )));
    }

    // Shape checks; the values themselves are not needed.
    peek::format(doc, property)?;
    peek::max_length(doc, property)?;
    peek::description(doc, property)?;
    peek::read_only(doc, property)?;
    peek::write_only(doc, property)?;
    peek::primary_key(doc, property)?;
    peek::autoincrement(doc, property)?;
    peek::index(doc, property)?;
    peek::unique(doc, property)?;
    peek::dict_ignore(doc, property)?;
    let nullable = peek::nullable(doc, property)?;

    if let Some(default) = peek::default(doc, property)? {
        let accepted = schema_type.accepts(default) || (default.is_null() && nullable == Some(true));
        if !accepted {
            return Ok(ValidationResult::fail(format!(
                "{} :: expected {schema_type}, actual is {}.",
                keys::DEFAULT,
                describe(default)
            )));
        }
    }

    let foreign_key = peek::foreign_key(doc, property)?;
    if let Some(foreign_key) = foreign_key {
        let (_, column) = foreign_key_target(doc, foreign_key)?;
        if let Some(mismatch) = column_mismatch(doc, column, property)? {
            return Ok(ValidationResult::fail(format!(
                "{} :: {foreign_key} :: {mismatch}",
                keys::FOREIGN_KEY
            )));
        }
    }

    if let Some(kwargs) = peek::foreign_key_kwargs(doc, property)? {
        if foreign_key.is_none() {
            return Ok(ValidationResult::fail(format!(
                "{} :: can only be defined alongside {}",
                keys::FOREIGN_KEY_KWARGS,
                keys::FOREIGN_KEY
            )));
        }
        if let Some(key) = kwargs
            .keys()
            .find(|key| !keys::FOREIGN_KEY_KWARGS_KEYS.contains(&key.as_str()))
        {
            return Ok(ValidationResult::fail(format!(
                "{} :: unexpected key {key:?}",
                keys::FOREIGN_KEY_KWARGS
            )));
        }
    }

    if let Some(reason) = check_kwargs(peek::kwargs(doc, property)?) {
        return Ok(ValidationResult::fail(reason));
    }
    Ok(ValidationResult::ok())
}

/// Validate a simple (scalar column) property.
pub fn check_simple(doc: &Document, property: &Value) -> ValidationResult {
    simple(doc, property).unwrap_or_else(ValidationResult::from)
}

fn json(doc: &Document, property: &Value) -> SchemaResult<ValidationResult> {
    peek::json(doc, property)?;
    peek::nullable(doc, property)?;
    peek::description(doc, property)?;
    if let Some(reason) = check_kwargs(peek::kwargs(doc, property)?) {
        return Ok(ValidationResult::fail(reason));
    }
    Ok(ValidationResult::ok())
}

/// Validate a property stored as a JSON column.
pub fn check_json(doc: &Document, property: &Value) -> ValidationResult {
    json(doc, property).unwrap_or_else(ValidationResult::from)
}

fn simple_sub_properties(doc: &Document, object: &Value) -> SchemaResult<ValidationResult> {
    for (name, sub) in iterate::properties(doc, object, Scope::All)? {
        let sub_type = peek::schema_type(doc, sub)?;
        if !sub_type.is_simple() {
            return Ok(ValidationResult::fail(format!(
                "{name} :: {} :: expected a simple type, actual is {sub_type}.",
                keys::TYPE
            )));
        }
    }
    Ok(ValidationResult::ok())
}

fn backref_property(doc: &Document, property: &Value) -> SchemaResult<ValidationResult> {
    if peek::read_only(doc, property)? != Some(true) {
        return Ok(ValidationResult::fail("the property must be readOnly"));
    }
    match peek::schema_type(doc, property)? {
        SchemaType::Object => simple_sub_properties(doc, property),
        SchemaType::Array => {
            let Some(items) = peek::items(doc, property)? else {
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
            Ok(simple_sub_properties(doc, items)?.within(keys::ITEMS))
        }
        other => Ok(ValidationResult::fail(format!(
            "{} :: expected object or array, actual is {other}.",
            keys::TYPE
        ))),
    }
}

/// Validate a declared read-only (back-reference) property on its own.
pub fn check_backref_property(doc: &Document, property: &Value) -> ValidationResult {
    backref_property(doc, property).unwrap_or_else(ValidationResult::from)
}

/// Validate one property of a constructable schema.
pub fn check_property(
    doc: &Document,
    owner_name: &str,
    owner: &Value,
    property_name: &str,
    property: &Value,
) -> ValidationResult {
    let kind = match property_kind(doc, property) {
        Ok(kind) => kind,
        Err(err) => return err.into(),
    };
    let result = match kind {
        PropertyKind::Simple => check_simple(doc, property),
        PropertyKind::Json => check_json(doc, property),
        PropertyKind::Backref => check_backref_property(doc, property),
        PropertyKind::Relationship => {
            relationship::check_relationship(doc, owner_name, owner, property_name, property)
        }
    };
    if !result.is_valid() {
        tracing::debug!(
            schema = %owner_name,
            property = %property_name,
            kind = %kind,
            reason = %result.reason(),
            "property failed validation"
        );
    }
    result
}

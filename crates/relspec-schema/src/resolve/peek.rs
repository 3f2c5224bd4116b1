//! # Peek — Point Queries over Composed Schemas
//!
//! Computes the effective value of one key without flattening the schema.
//! The lookup checks the fragment itself, then follows `$ref`, then walks
//! the `allOf` members.
//!
//! Two member orders exist:
//!
//! - **Document order** for `type`, `format`, `maxLength`, `items`,
//!   `x-foreign-key-column`, `x-backref`, `x-secondary` and `x-uselist`.
//! - **Local first** for every other key. Members without a `$ref` are
//!   consulted before referenced ones, so a local `nullable`, `default`,
//!   `x-tablename`, `x-inherits`, ... overrides what the referenced schema
//!   declares. This is what makes joined-table children keep their own
//!   table name.
//!
//! Every accessor converts to the expected primitive or fails with
//! `SchemaError::Malformed` (`SchemaError::ExtensionProperty` for `x-*`
//! keys).

use serde_json::{Map, Value};

use relspec_core::{describe, keys, Document, SchemaError, SchemaResult, SchemaType};

use super::{follow, Inherits};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Order {
    Document,
    LocalFirst,
}

/// Effective value of `key`, walking `allOf` members in document order.
pub fn peek_key<'a>(doc: &'a Document, schema: &'a Value, key: &str) -> SchemaResult<Option<&'a Value>> {
    walk(doc, schema, key, Order::Document, &mut Vec::new())
}

/// Effective value of `key`, preferring local `allOf` members over
/// referenced ones.
pub fn prefer_local_key<'a>(
    doc: &'a Document,
    schema: &'a Value,
    key: &str,
) -> SchemaResult<Option<&'a Value>> {
    walk(doc, schema, key, Order::LocalFirst, &mut Vec::new())
}

fn walk<'a>(
    doc: &'a Document,
    schema: &'a Value,
    key: &str,
    order: Order,
    path: &mut Vec<&'a str>,
) -> SchemaResult<Option<&'a Value>> {
    if let Some(value) = schema.get(key) {
        return Ok(Some(value));
    }

    if let Some(reference) = schema.get(keys::REF) {
        let found = follow(doc, reference, path, |_, target, path| {
            walk(doc, target, key, order, path)
        })?;
        if found.is_some() {
            return Ok(found);
        }
    }

    if let Some(all_of) = schema.get(keys::ALL_OF) {
        let members = all_of_members(all_of)?;
        let ordered: Vec<&Value> = match order {
            Order::Document => members.iter().collect(),
            Order::LocalFirst => members
                .iter()
                .filter(|m| m.get(keys::REF).is_none())
                .chain(members.iter().filter(|m| m.get(keys::REF).is_some()))
                .collect(),
        };
        for member in ordered {
            if let Some(value) = walk(doc, member, key, order, path)? {
                return Ok(Some(value));
            }
        }
    }

    Ok(None)
}

/// The members of an `allOf` value, which must be a list of mappings.
pub fn all_of_members(all_of: &Value) -> SchemaResult<&[Value]> {
    let members = all_of.as_array().ok_or_else(|| {
        SchemaError::malformed(format!(
            "{} :: expected array, actual is {}",
            keys::ALL_OF,
            describe(all_of)
        ))
    })?;
    if let Some(bad) = members.iter().find(|m| !m.is_object()) {
        return Err(SchemaError::malformed(format!(
            "{} :: members must be objects, actual is {}",
            keys::ALL_OF,
            describe(bad)
        )));
    }
    Ok(members)
}

// ---------------------------------------------------------------------------
// Typed conversion
// ---------------------------------------------------------------------------

fn shape_error(key: &str, expected: &str, actual: &Value) -> SchemaError {
    let message = format!("{key} :: expected {expected}, actual is {}", describe(actual));
    if key.starts_with("x-") {
        SchemaError::extension(message)
    } else {
        SchemaError::malformed(message)
    }
}

fn as_str<'a>(value: Option<&'a Value>, key: &str) -> SchemaResult<Option<&'a str>> {
    value
        .map(|v| v.as_str().ok_or_else(|| shape_error(key, "string", v)))
        .transpose()
}

fn as_bool(value: Option<&Value>, key: &str) -> SchemaResult<Option<bool>> {
    value
        .map(|v| v.as_bool().ok_or_else(|| shape_error(key, "boolean", v)))
        .transpose()
}

fn as_object<'a>(value: Option<&'a Value>, key: &str) -> SchemaResult<Option<&'a Map<String, Value>>> {
    value
        .map(|v| v.as_object().ok_or_else(|| shape_error(key, "object", v)))
        .transpose()
}

/// A string key read from this fragment only.
pub fn own_str<'a>(node: &'a Value, key: &str) -> SchemaResult<Option<&'a str>> {
    as_str(node.get(key), key)
}

/// A boolean key read from this fragment only.
pub fn own_bool(node: &Value, key: &str) -> SchemaResult<Option<bool>> {
    as_bool(node.get(key), key)
}

/// An object key read from this fragment only.
pub fn own_object<'a>(node: &'a Value, key: &str) -> SchemaResult<Option<&'a Map<String, Value>>> {
    as_object(node.get(key), key)
}

// ---------------------------------------------------------------------------
// OpenAPI keys
// ---------------------------------------------------------------------------

/// The effective `type`, if any fragment supplies one.
pub fn maybe_type(doc: &Document, schema: &Value) -> SchemaResult<Option<SchemaType>> {
    as_str(peek_key(doc, schema, keys::TYPE)?, keys::TYPE)?
        .map(str::parse)
        .transpose()
}

/// The effective `type`.
///
/// # Errors
///
/// `SchemaError::TypeMissing` when neither the fragment, its references
/// nor its `allOf` members define a type.
pub fn schema_type(doc: &Document, schema: &Value) -> SchemaResult<SchemaType> {
    maybe_type(doc, schema)?.ok_or_else(|| {
        SchemaError::TypeMissing(
            "type :: could not find a type in the schema, its references or its allOf members"
                .to_string(),
        )
    })
}

pub fn format<'a>(doc: &'a Document, schema: &'a Value) -> SchemaResult<Option<&'a str>> {
    as_str(peek_key(doc, schema, keys::FORMAT)?, keys::FORMAT)
}

pub fn max_length(doc: &Document, schema: &Value) -> SchemaResult<Option<u64>> {
    peek_key(doc, schema, keys::MAX_LENGTH)?
        .map(|v| {
            v.as_u64()
                .ok_or_else(|| shape_error(keys::MAX_LENGTH, "non-negative integer", v))
        })
        .transpose()
}

pub fn items<'a>(doc: &'a Document, schema: &'a Value) -> SchemaResult<Option<&'a Value>> {
    let items = peek_key(doc, schema, keys::ITEMS)?;
    as_object(items, keys::ITEMS)?;
    Ok(items)
}

pub fn nullable(doc: &Document, schema: &Value) -> SchemaResult<Option<bool>> {
    as_bool(prefer_local_key(doc, schema, keys::NULLABLE)?, keys::NULLABLE)
}

pub fn description<'a>(doc: &'a Document, schema: &'a Value) -> SchemaResult<Option<&'a str>> {
    as_str(prefer_local_key(doc, schema, keys::DESCRIPTION)?, keys::DESCRIPTION)
}

/// The effective `default`. Its agreement with `type` is a validation
/// concern, not a shape one.
pub fn default<'a>(doc: &'a Document, schema: &'a Value) -> SchemaResult<Option<&'a Value>> {
    prefer_local_key(doc, schema, keys::DEFAULT)
}

pub fn read_only(doc: &Document, schema: &Value) -> SchemaResult<Option<bool>> {
    as_bool(prefer_local_key(doc, schema, keys::READ_ONLY)?, keys::READ_ONLY)
}

pub fn write_only(doc: &Document, schema: &Value) -> SchemaResult<Option<bool>> {
    as_bool(prefer_local_key(doc, schema, keys::WRITE_ONLY)?, keys::WRITE_ONLY)
}

// ---------------------------------------------------------------------------
// Extension keys
// ---------------------------------------------------------------------------

/// The effective table name, own or inherited.
pub fn tablename<'a>(doc: &'a Document, schema: &'a Value) -> SchemaResult<Option<&'a str>> {
    as_str(prefer_local_key(doc, schema, keys::TABLENAME)?, keys::TABLENAME)
}

/// The table name declared by the schema itself or its local `allOf`
/// members, without following any `$ref`.
pub fn own_tablename(schema: &Value) -> SchemaResult<Option<&str>> {
    if let Some(tablename) = own_str(schema, keys::TABLENAME)? {
        return Ok(Some(tablename));
    }
    if let Some(all_of) = schema.get(keys::ALL_OF) {
        for member in all_of_members(all_of)? {
            if member.get(keys::REF).is_some() {
                continue;
            }
            if let Some(tablename) = own_tablename(member)? {
                return Ok(Some(tablename));
            }
        }
    }
    Ok(None)
}

pub fn inherits<'a>(doc: &'a Document, schema: &'a Value) -> SchemaResult<Option<Inherits<'a>>> {
    prefer_local_key(doc, schema, keys::INHERITS)?
        .map(|v| match v {
            Value::Bool(flag) => Ok(Inherits::Flag(*flag)),
            Value::String(parent) => Ok(Inherits::Parent(parent.as_str())),
            other => Err(shape_error(keys::INHERITS, "boolean or string", other)),
        })
        .transpose()
}

pub fn primary_key(doc: &Document, schema: &Value) -> SchemaResult<Option<bool>> {
    as_bool(prefer_local_key(doc, schema, keys::PRIMARY_KEY)?, keys::PRIMARY_KEY)
}

pub fn autoincrement(doc: &Document, schema: &Value) -> SchemaResult<Option<bool>> {
    as_bool(prefer_local_key(doc, schema, keys::AUTOINCREMENT)?, keys::AUTOINCREMENT)
}

pub fn index(doc: &Document, schema: &Value) -> SchemaResult<Option<bool>> {
    as_bool(prefer_local_key(doc, schema, keys::INDEX)?, keys::INDEX)
}

pub fn unique(doc: &Document, schema: &Value) -> SchemaResult<Option<bool>> {
    as_bool(prefer_local_key(doc, schema, keys::UNIQUE)?, keys::UNIQUE)
}

pub fn json(doc: &Document, schema: &Value) -> SchemaResult<Option<bool>> {
    as_bool(prefer_local_key(doc, schema, keys::JSON)?, keys::JSON)
}

pub fn dict_ignore(doc: &Document, schema: &Value) -> SchemaResult<Option<bool>> {
    as_bool(prefer_local_key(doc, schema, keys::DICT_IGNORE)?, keys::DICT_IGNORE)
}

pub fn backref<'a>(doc: &'a Document, schema: &'a Value) -> SchemaResult<Option<&'a str>> {
    as_str(peek_key(doc, schema, keys::BACKREF)?, keys::BACKREF)
}

pub fn secondary<'a>(doc: &'a Document, schema: &'a Value) -> SchemaResult<Option<&'a str>> {
    as_str(peek_key(doc, schema, keys::SECONDARY)?, keys::SECONDARY)
}

pub fn uselist(doc: &Document, schema: &Value) -> SchemaResult<Option<bool>> {
    as_bool(peek_key(doc, schema, keys::USELIST)?, keys::USELIST)
}

pub fn foreign_key_column<'a>(doc: &'a Document, schema: &'a Value) -> SchemaResult<Option<&'a str>> {
    as_str(peek_key(doc, schema, keys::FOREIGN_KEY_COLUMN)?, keys::FOREIGN_KEY_COLUMN)
}

pub fn foreign_key<'a>(doc: &'a Document, schema: &'a Value) -> SchemaResult<Option<&'a str>> {
    as_str(prefer_local_key(doc, schema, keys::FOREIGN_KEY)?, keys::FOREIGN_KEY)
}

pub fn kwargs<'a>(
    doc: &'a Document,
    schema: &'a Value,
) -> SchemaResult<Option<&'a Map<String, Value>>> {
    as_object(prefer_local_key(doc, schema, keys::KWARGS)?, keys::KWARGS)
}

pub fn foreign_key_kwargs<'a>(
    doc: &'a Document,
    schema: &'a Value,
) -> SchemaResult<Option<&'a Map<String, Value>>> {
    as_object(
        prefer_local_key(doc, schema, keys::FOREIGN_KEY_KWARGS)?,
        keys::FOREIGN_KEY_KWARGS,
    )
}

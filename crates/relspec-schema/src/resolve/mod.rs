//! # Composition Resolver
//!
//! Resolves `$ref` indirection and `allOf` composition. Nothing here builds
//! a merged copy of a schema: [`peek`] answers point queries for a single
//! key, [`iterate`] enumerates properties within an inheritance scope, and
//! [`resolve`] folds the handful of model-level keys into an
//! [`EffectiveView`].
//!
//! ## Reference Cycles
//!
//! Every `$ref` follow goes through [`follow`], which tracks the names on
//! the current reference path. Re-entering a name on that path fails with
//! `SchemaError::CyclicReference`. Referencing the same schema twice from
//! sibling `allOf` members is not a cycle.

pub mod iterate;
pub mod peek;

use serde_json::{Map, Value};

use relspec_core::{describe, keys, Document, SchemaError, SchemaResult, SchemaType};

use iterate::Scope;

/// Value of `x-inherits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inherits<'a> {
    /// `true` inherits from the first constructable referenced schema.
    Flag(bool),
    /// Names the parent schema explicitly.
    Parent(&'a str),
}

/// The model-level keys of a schema after composition.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveView<'a> {
    pub schema_type: Option<SchemaType>,
    pub tablename: Option<&'a str>,
    pub inherits: Option<Inherits<'a>>,
    pub description: Option<&'a str>,
    pub kwargs: Option<&'a Map<String, Value>>,
    /// Every property name across the whole composition, first definition
    /// wins.
    pub properties: Vec<&'a str>,
    pub required: Vec<&'a str>,
}

impl EffectiveView<'_> {
    /// Whether the schema is backed by a table.
    pub fn is_constructable(&self) -> bool {
        self.tablename.is_some()
    }
}

/// Fold the model-level keys of `schema` into an [`EffectiveView`].
pub fn resolve<'a>(doc: &'a Document, schema: &'a Value) -> SchemaResult<EffectiveView<'a>> {
    Ok(EffectiveView {
        schema_type: peek::maybe_type(doc, schema)?,
        tablename: peek::tablename(doc, schema)?,
        inherits: peek::inherits(doc, schema)?,
        description: peek::description(doc, schema)?,
        kwargs: peek::kwargs(doc, schema)?,
        properties: iterate::property_names(doc, schema, Scope::All)?,
        required: iterate::required(doc, schema, Scope::All)?,
    })
}

/// Follow one `$ref`, guarding against cycles on the current path.
///
/// `path` holds the names already followed to reach `reference`; the
/// target name is pushed for the duration of `visit`.
pub(crate) fn follow<'a, T>(
    doc: &'a Document,
    reference: &'a Value,
    path: &mut Vec<&'a str>,
    visit: impl FnOnce(&'a str, &'a Value, &mut Vec<&'a str>) -> SchemaResult<T>,
) -> SchemaResult<T> {
    let reference = reference.as_str().ok_or_else(|| {
        SchemaError::malformed(format!(
            "{} :: expected string, actual is {}",
            keys::REF,
            describe(reference)
        ))
    })?;
    let (name, target) = doc.resolve_ref(reference)?;
    if path.contains(&name) {
        return Err(SchemaError::CyclicReference(reference.to_string()));
    }
    path.push(name);
    let result = visit(name, target, path);
    path.pop();
    result
}

/// Whether the schema has an effective `x-tablename`.
pub fn is_constructable(doc: &Document, schema: &Value) -> SchemaResult<bool> {
    Ok(peek::tablename(doc, schema)?.is_some())
}

/// Every schema reachable through `$ref` from `schema`, in document order,
/// nearest first along each branch.
pub fn referenced<'a>(doc: &'a Document, schema: &'a Value) -> SchemaResult<Vec<(&'a str, &'a Value)>> {
    fn visit<'a>(
        doc: &'a Document,
        node: &'a Value,
        path: &mut Vec<&'a str>,
        out: &mut Vec<(&'a str, &'a Value)>,
    ) -> SchemaResult<()> {
        if let Some(reference) = node.get(keys::REF) {
            follow(doc, reference, path, |name, target, path| {
                out.push((name, target));
                visit(doc, target, path, out)
            })?;
        }
        if let Some(all_of) = node.get(keys::ALL_OF) {
            for member in peek::all_of_members(all_of)? {
                visit(doc, member, path, out)?;
            }
        }
        Ok(())
    }

    let mut out = Vec::new();
    visit(doc, schema, &mut Vec::new(), &mut out)?;
    Ok(out)
}

/// Name of the schema `schema` inherits from, if it inherits at all.
///
/// `x-inherits: true` selects the first constructable referenced schema;
/// a string must name a constructable schema in the reference chain.
pub fn parent_name<'a>(doc: &'a Document, schema: &'a Value) -> SchemaResult<Option<&'a str>> {
    let inherits = match peek::inherits(doc, schema)? {
        None | Some(Inherits::Flag(false)) => return Ok(None),
        Some(inherits) => inherits,
    };

    for (name, target) in referenced(doc, schema)? {
        let wanted = match inherits {
            Inherits::Parent(parent) => name == parent,
            _ => true,
        };
        if wanted && is_constructable(doc, target)? {
            return Ok(Some(name));
        }
    }

    let message = match inherits {
        Inherits::Parent(parent) => format!(
            "{} :: the parent {parent:?} is not a constructable schema referenced by the schema",
            keys::INHERITS
        ),
        _ => format!(
            "{} :: the schema does not reference a constructable parent",
            keys::INHERITS
        ),
    };
    Err(SchemaError::malformed(message))
}

/// Whether the schema shares its parent's table: it inherits but does not
/// declare a table name of its own.
pub fn is_single_table_child(doc: &Document, schema: &Value) -> SchemaResult<bool> {
    Ok(peek::own_tablename(schema)?.is_none() && parent_name(doc, schema)?.is_some())
}

/// The fragments that belong to the schema itself: the schema and its
/// `allOf` members that carry no `$ref`, recursively.
pub fn local_fragments(schema: &Value) -> SchemaResult<Vec<&Value>> {
    let mut out = vec![schema];
    if let Some(all_of) = schema.get(keys::ALL_OF) {
        for member in peek::all_of_members(all_of)? {
            if member.get(keys::REF).is_none() {
                out.extend(local_fragments(member)?);
            }
        }
    }
    Ok(out)
}

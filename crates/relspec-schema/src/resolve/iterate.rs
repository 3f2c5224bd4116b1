//! # Property Iteration
//!
//! Enumerates `properties` and `required` across a composed schema. A
//! [`Scope`] decides how far the walk follows nested `$ref`s:
//!
//! | Scope   | Stops at a nested `$ref` whose target...                     |
//! |---------|--------------------------------------------------------------|
//! | `All`   | never                                                        |
//! | `Model` | is constructable (the next inheritance level)                 |
//! | `Table` | is constructable under a different table name (joined table) |
//!
//! A schema that is itself only a `$ref` is always followed, since the
//! target is the same model.
//!
//! Within one fragment, own `properties` come first, then local `allOf`
//! members, then referenced ones. The first definition of a name wins, so
//! local redefinitions override inherited ones.

use std::collections::HashSet;

use serde_json::Value;

use relspec_core::{describe, keys, Document, SchemaError, SchemaResult};

use super::{follow, peek};

/// How far property iteration descends through nested references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Model,
    Table,
}

struct Walker<'a> {
    doc: &'a Document,
    scope: Scope,
    tablename: Option<&'a str>,
}

impl<'a> Walker<'a> {
    fn new(doc: &'a Document, schema: &'a Value, scope: Scope) -> SchemaResult<Self> {
        let tablename = match scope {
            Scope::Table => peek::tablename(doc, schema)?,
            _ => None,
        };
        Ok(Self {
            doc,
            scope,
            tablename,
        })
    }

    fn enters(&self, target: &'a Value) -> SchemaResult<bool> {
        let target_table = match self.scope {
            Scope::All => return Ok(true),
            _ => peek::tablename(self.doc, target)?,
        };
        Ok(match (self.scope, target_table) {
            (_, None) => true,
            (Scope::Table, Some(table)) => Some(table) == self.tablename,
            _ => false,
        })
    }

    /// Visit every fragment in scope, own fragment first.
    fn walk(
        &self,
        node: &'a Value,
        root_chain: bool,
        path: &mut Vec<&'a str>,
        visit: &mut dyn FnMut(&'a Value) -> SchemaResult<()>,
    ) -> SchemaResult<()> {
        visit(node)?;

        if let Some(all_of) = node.get(keys::ALL_OF) {
            let members = peek::all_of_members(all_of)?;
            let local = members.iter().filter(|m| m.get(keys::REF).is_none());
            let referenced = members.iter().filter(|m| m.get(keys::REF).is_some());
            for member in local.chain(referenced) {
                self.walk(member, false, path, visit)?;
            }
        }

        if let Some(reference) = node.get(keys::REF) {
            follow(self.doc, reference, path, |_, target, path| {
                if root_chain || self.enters(target)? {
                    self.walk(target, root_chain, path, visit)?;
                }
                Ok(())
            })?;
        }
        Ok(())
    }
}

fn walk<'a>(
    doc: &'a Document,
    schema: &'a Value,
    scope: Scope,
    visit: &mut dyn FnMut(&'a Value) -> SchemaResult<()>,
) -> SchemaResult<()> {
    let walker = Walker::new(doc, schema, scope)?;
    walker.walk(schema, true, &mut Vec::new(), visit)
}

/// Every `(name, schema)` property pair in scope, first definition wins.
pub fn properties<'a>(
    doc: &'a Document,
    schema: &'a Value,
    scope: Scope,
) -> SchemaResult<Vec<(&'a str, &'a Value)>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    walk(doc, schema, scope, &mut |node| {
        let Some(properties) = node.get(keys::PROPERTIES) else {
            return Ok(());
        };
        let properties = properties.as_object().ok_or_else(|| {
            SchemaError::malformed(format!(
                "{} :: expected object, actual is {}",
                keys::PROPERTIES,
                describe(properties)
            ))
        })?;
        for (name, property) in properties {
            if !property.is_object() {
                return Err(SchemaError::malformed(format!(
                    "{} :: {name} :: expected object, actual is {}",
                    keys::PROPERTIES,
                    describe(property)
                )));
            }
            if seen.insert(name.as_str()) {
                out.push((name.as_str(), property));
            }
        }
        Ok(())
    })?;
    Ok(out)
}

/// Property names in scope.
pub fn property_names<'a>(doc: &'a Document, schema: &'a Value, scope: Scope) -> SchemaResult<Vec<&'a str>> {
    Ok(properties(doc, schema, scope)?
        .into_iter()
        .map(|(name, _)| name)
        .collect())
}

/// A single property by name.
pub fn property<'a>(
    doc: &'a Document,
    schema: &'a Value,
    name: &str,
    scope: Scope,
) -> SchemaResult<Option<&'a Value>> {
    Ok(properties(doc, schema, scope)?
        .into_iter()
        .find(|(n, _)| *n == name)
        .map(|(_, property)| property))
}

/// Names listed in `required` in scope, deduplicated.
pub fn required<'a>(doc: &'a Document, schema: &'a Value, scope: Scope) -> SchemaResult<Vec<&'a str>> {
    let mut out: Vec<&'a str> = Vec::new();
    walk(doc, schema, scope, &mut |node| {
        let Some(required) = node.get(keys::REQUIRED) else {
            return Ok(());
        };
        let names = required
            .as_array()
            .ok_or_else(|| required_error(required))?;
        for name in names {
            let name = name.as_str().ok_or_else(|| required_error(name))?;
            if !out.contains(&name) {
                out.push(name);
            }
        }
        Ok(())
    })?;
    Ok(out)
}

fn required_error(actual: &Value) -> SchemaError {
    SchemaError::malformed(format!(
        "{} :: expected array of strings, found {}",
        keys::REQUIRED,
        describe(actual)
    ))
}

/// Properties flagged `x-primary-key: true`, in scope.
pub fn primary_keys<'a>(
    doc: &'a Document,
    schema: &'a Value,
    scope: Scope,
) -> SchemaResult<Vec<(&'a str, &'a Value)>> {
    let mut out = Vec::new();
    for (name, property) in properties(doc, schema, scope)? {
        if peek::primary_key(doc, property)? == Some(true) {
            out.push((name, property));
        }
    }
    Ok(out)
}

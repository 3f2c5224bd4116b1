//! # Relationship Classifier
//!
//! Decides what a property is ([`PropertyKind`]) and, for relationships,
//! which [`RelationshipKind`] its shape implies.
//!
//! ## Gathering
//!
//! A relationship property is a `$ref` to a constructable schema (or an
//! array whose `items` is one), optionally decorated with modifiers placed
//! next to the reference:
//!
//! ```yaml
//! owner:
//!   allOf:
//!     - $ref: "#/components/schemas/Employee"
//!     - x-backref: pets
//!       nullable: false
//! ```
//!
//! Modifiers are folded from the property node, the `items` node, their
//! local `allOf` members and any wrapper schema the reference passes
//! through. A wrapper is a referenced schema that declares neither its own
//! `x-tablename` nor `x-inherits`; the first schema that does is the
//! target. Setting the same modifier twice, or reaching two targets, is
//! rejected with `"multiple <key> defined in allOf"`.

use serde_json::{Map, Value};

use relspec_core::{keys, Document, RelationshipKind, SchemaError, SchemaResult, SchemaType};

use crate::resolve::{follow, is_constructable, local_fragments, peek};

/// What a property is realized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// A plain column.
    Simple,
    /// A column stored as JSON, whatever its shape.
    Json,
    /// A reference to another constructable schema.
    Relationship,
    /// A read-only mirror of a relationship declared on another schema.
    Backref,
}

impl PropertyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Json => "json",
            Self::Relationship => "relationship",
            Self::Backref => "backref",
        }
    }
}

impl std::fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Determine the kind of a property.
pub fn property_kind(doc: &Document, property: &Value) -> SchemaResult<PropertyKind> {
    if peek::read_only(doc, property)? == Some(true) {
        return Ok(PropertyKind::Backref);
    }
    if peek::json(doc, property)? == Some(true) {
        return Ok(PropertyKind::Json);
    }
    Ok(match peek::schema_type(doc, property)? {
        SchemaType::Object | SchemaType::Array => PropertyKind::Relationship,
        _ => PropertyKind::Simple,
    })
}

/// Whether the property is realized as a relationship.
pub fn is_relationship(doc: &Document, property: &Value) -> SchemaResult<bool> {
    Ok(property_kind(doc, property)? == PropertyKind::Relationship)
}

// ---------------------------------------------------------------------------
// Modifiers
// ---------------------------------------------------------------------------

/// Relationship-local modifiers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Modifiers<'a> {
    pub backref: Option<&'a str>,
    pub secondary: Option<&'a str>,
    pub uselist: Option<bool>,
    pub nullable: Option<bool>,
    pub description: Option<&'a str>,
    pub foreign_key_column: Option<&'a str>,
    pub kwargs: Option<&'a Map<String, Value>>,
}

fn set_once<T>(slot: &mut Option<T>, key: &str, value: Option<T>) -> SchemaResult<()> {
    match (slot.is_some(), value) {
        (true, Some(_)) => Err(SchemaError::malformed(format!("multiple {key} defined in allOf"))),
        (false, Some(value)) => {
            *slot = Some(value);
            Ok(())
        }
        (_, None) => Ok(()),
    }
}

impl<'a> Modifiers<'a> {
    fn absorb(&mut self, node: &'a Value) -> SchemaResult<()> {
        set_once(&mut self.backref, keys::BACKREF, peek::own_str(node, keys::BACKREF)?)?;
        set_once(&mut self.secondary, keys::SECONDARY, peek::own_str(node, keys::SECONDARY)?)?;
        set_once(&mut self.uselist, keys::USELIST, peek::own_bool(node, keys::USELIST)?)?;
        set_once(&mut self.nullable, keys::NULLABLE, peek::own_bool(node, keys::NULLABLE)?)?;
        set_once(
            &mut self.description,
            keys::DESCRIPTION,
            peek::own_str(node, keys::DESCRIPTION)?,
        )?;
        set_once(
            &mut self.foreign_key_column,
            keys::FOREIGN_KEY_COLUMN,
            peek::own_str(node, keys::FOREIGN_KEY_COLUMN)?,
        )?;
        set_once(&mut self.kwargs, keys::KWARGS, peek::own_object(node, keys::KWARGS)?)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Gathering
// ---------------------------------------------------------------------------

/// A classified relationship property.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship<'a> {
    pub kind: RelationshipKind,
    /// Name of the referenced schema.
    pub target_name: &'a str,
    pub target: &'a Value,
    pub modifiers: Modifiers<'a>,
}

/// Whether a referenced schema is a model of its own rather than a wrapper
/// decorating the reference it carries.
fn starts_model(doc: &Document, schema: &Value) -> SchemaResult<bool> {
    if !is_constructable(doc, schema)? {
        return Ok(false);
    }
    if peek::own_tablename(schema)?.is_some() {
        return Ok(true);
    }
    for fragment in local_fragments(schema)? {
        match fragment.get(keys::INHERITS) {
            None | Some(Value::Bool(false)) => {}
            Some(_) => return Ok(true),
        }
    }
    Ok(false)
}

#[derive(Default)]
struct Fold<'a> {
    modifiers: Modifiers<'a>,
    target: Option<(&'a str, &'a Value)>,
    fallback: Option<(&'a str, &'a Value)>,
}

impl<'a> Fold<'a> {
    fn visit(&mut self, doc: &'a Document, node: &'a Value, path: &mut Vec<&'a str>) -> SchemaResult<()> {
        self.modifiers.absorb(node)?;

        if let Some(reference) = node.get(keys::REF) {
            follow(doc, reference, path, |name, target, path| {
                if starts_model(doc, target)? {
                    if self.target.is_some() {
                        return Err(SchemaError::malformed(format!(
                            "multiple {} defined in allOf",
                            keys::REF
                        )));
                    }
                    self.target = Some((name, target));
                    Ok(())
                } else {
                    self.fallback.get_or_insert((name, target));
                    self.visit(doc, target, path)
                }
            })?;
        }

        if let Some(all_of) = node.get(keys::ALL_OF) {
            for member in peek::all_of_members(all_of)? {
                self.visit(doc, member, path)?;
            }
        }
        Ok(())
    }
}

/// Gather a relationship property: its target, modifiers and kind.
pub fn gather<'a>(doc: &'a Document, property: &'a Value) -> SchemaResult<Relationship<'a>> {
    let is_array = peek::schema_type(doc, property)? == SchemaType::Array;
    let mut fold = Fold::default();
    let mut path = Vec::new();

    if is_array {
        // The array node contributes modifiers only.
        fold.modifiers.absorb(property)?;
        let items = peek::items(doc, property)?.ok_or_else(|| {
            SchemaError::malformed(format!("{} :: not defined for an array relationship", keys::ITEMS))
        })?;
        fold.visit(doc, items, &mut path)?;
    } else {
        fold.visit(doc, property, &mut path)?;
    }

    let (target_name, target) = fold.target.or(fold.fallback).ok_or_else(|| {
        SchemaError::malformed(format!(
            "{} :: a relationship must reference another schema",
            keys::REF
        ))
    })?;

    let modifiers = fold.modifiers;
    Ok(Relationship {
        kind: RelationshipKind::from_shape(is_array, modifiers.secondary.is_some(), modifiers.uselist),
        target_name,
        target,
        modifiers,
    })
}

/// Classify a relationship property.
pub fn classify(doc: &Document, property: &Value) -> SchemaResult<RelationshipKind> {
    Ok(gather(doc, property)?.kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Document {
        Document::from_value(json!({
            "Employee": {
                "type": "object",
                "x-tablename": "employee",
                "properties": {"id": {"type": "integer", "x-primary-key": true}}
            },
            "EmployeeWrapper": {"allOf": [
                {"$ref": "#/components/schemas/Employee"},
                {"x-backref": "pets"}
            ]},
            "Plain": {"type": "object", "properties": {"a": {"type": "integer"}}},
            "Division": {
                "type": "object",
                "x-tablename": "division",
                "properties": {"id": {"type": "integer"}}
            }
        }))
        .unwrap()
    }

    fn reference(name: &str) -> Value {
        json!({"$ref": format!("#/components/schemas/{name}")})
    }

    #[test]
    fn test_property_kind() {
        let d = doc();
        assert_eq!(property_kind(&d, &json!({"type": "integer"})).unwrap(), PropertyKind::Simple);
        assert_eq!(
            property_kind(&d, &json!({"type": "object", "x-json": true})).unwrap(),
            PropertyKind::Json
        );
        assert_eq!(property_kind(&d, &reference("Employee")).unwrap(), PropertyKind::Relationship);
        assert_eq!(
            property_kind(&d, &json!({"type": "array", "readOnly": true})).unwrap(),
            PropertyKind::Backref
        );
    }

    #[test]
    fn test_classify_decision_table() {
        let d = doc();
        let m2o = reference("Employee");
        let o2o = json!({"allOf": [reference("Employee"), {"x-uselist": false, "x-backref": "pet"}]});
        let o2m = json!({"type": "array", "items": reference("Employee")});
        let m2m = json!({"type": "array", "items": {"allOf": [reference("Employee"), {"x-secondary": "assoc"}]}});
        assert_eq!(classify(&d, &m2o).unwrap(), RelationshipKind::ManyToOne);
        assert_eq!(classify(&d, &o2o).unwrap(), RelationshipKind::OneToOne);
        assert_eq!(classify(&d, &o2m).unwrap(), RelationshipKind::OneToMany);
        assert_eq!(classify(&d, &m2m).unwrap(), RelationshipKind::ManyToMany);
    }

    #[test]
    fn test_uselist_ignored_for_arrays() {
        let d = doc();
        let o2m = json!({"type": "array", "x-uselist": false, "items": reference("Employee")});
        assert_eq!(classify(&d, &o2m).unwrap(), RelationshipKind::OneToMany);
    }

    #[test]
    fn test_gather_through_wrapper() {
        let d = doc();
        let property = reference("EmployeeWrapper");
        let relationship = gather(&d, &property).unwrap();
        assert_eq!(relationship.target_name, "Employee");
        assert_eq!(relationship.modifiers.backref, Some("pets"));
    }

    #[test]
    fn test_gather_duplicate_modifier() {
        let d = doc();
        let property = json!({"allOf": [reference("EmployeeWrapper"), {"x-backref": "other"}]});
        let err = gather(&d, &property).unwrap_err();
        assert_eq!(err.to_string(), "malformed schema :: multiple x-backref defined in allOf");
    }

    #[test]
    fn test_gather_duplicate_reference() {
        let d = doc();
        let property = json!({"allOf": [reference("Employee"), reference("Division")]});
        let err = gather(&d, &property).unwrap_err();
        assert_eq!(err.to_string(), "malformed schema :: multiple $ref defined in allOf");
    }

    #[test]
    fn test_gather_non_constructable_target_falls_back() {
        let d = doc();
        let property = reference("Plain");
        let relationship = gather(&d, &property).unwrap();
        assert_eq!(relationship.target_name, "Plain");
    }

    #[test]
    fn test_gather_without_reference() {
        let d = doc();
        let err = gather(&d, &json!({"type": "object"})).unwrap_err();
        assert!(err.to_string().contains("must reference another schema"));
    }

    #[test]
    fn test_gather_array_without_items() {
        let d = doc();
        let err = gather(&d, &json!({"type": "array"})).unwrap_err();
        assert!(err.to_string().contains("items :: not defined"));
    }

    #[test]
    fn test_gather_modifier_wrong_shape() {
        let d = doc();
        let property = json!({"allOf": [reference("Employee"), {"x-backref": 1}]});
        let err = gather(&d, &property).unwrap_err();
        assert!(matches!(err, SchemaError::ExtensionProperty(_)));
    }

    #[test]
    fn test_missing_reference() {
        let d = doc();
        let err = gather(&d, &reference("Missing")).unwrap_err();
        assert!(matches!(err, SchemaError::ReferenceNotFound(_)));
    }
}

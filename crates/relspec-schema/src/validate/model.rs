//! # Model Validation
//!
//! Checks that a schema can back a table. In order, stopping at the first
//! failure:
//!
//! 1. the schema resolves;
//! 2. it has a table name, own or inherited through `x-inherits`;
//! 3. its type is `object`;
//! 4. it adds at least one property at its own inheritance level;
//! 5. `required` only names existing properties;
//! 6. `x-kwargs` only holds `__dunder__` keys, never `__table_args__`;
//! 7. no property-only extension key sits on the model itself;
//! 8. `x-composite-index` / `x-composite-unique` only name columns of the
//!    table.

use serde_json::Value;

use relspec_core::{describe, keys, Document, SchemaError, SchemaResult, SchemaType, ValidationResult};

use crate::resolve::iterate::{self, Scope};
use crate::resolve::{local_fragments, parent_name, peek, resolve};

fn composite_error(key: &str, actual: &Value) -> SchemaError {
    SchemaError::extension(format!(
        "{key} :: expected a list of column names, a list of such lists, an object or a list of objects, actual is {}",
        describe(actual)
    ))
}

fn column_names<'a>(key: &str, value: &'a Value) -> SchemaResult<Vec<&'a str>> {
    let names = value
        .as_array()
        .filter(|names| !names.is_empty())
        .ok_or_else(|| composite_error(key, value))?;
    names
        .iter()
        .map(|name| name.as_str().ok_or_else(|| composite_error(key, value)))
        .collect()
}

fn composite_object<'a>(key: &str, value: &'a Value) -> SchemaResult<Vec<&'a str>> {
    let columns_key = if key == keys::COMPOSITE_UNIQUE {
        "columns"
    } else {
        "expressions"
    };
    let columns = value
        .get(columns_key)
        .ok_or_else(|| SchemaError::extension(format!("{key} :: {columns_key} :: not defined")))?;
    if let Some(name) = value.get("name") {
        if !name.is_string() {
            return Err(SchemaError::extension(format!(
                "{key} :: name :: expected string, actual is {}",
                describe(name)
            )));
        }
    }
    column_names(key, columns)
}

/// Parse a composite index or unique constraint into its column groups.
///
/// Accepted shapes: `[a, b]`, `[[a, b], [c]]`, `{expressions|columns:
/// [a, b], name?}` and a list of such objects.
pub fn composite_columns<'a>(key: &str, value: &'a Value) -> SchemaResult<Vec<Vec<&'a str>>> {
    match value {
        Value::Object(_) => Ok(vec![composite_object(key, value)?]),
        Value::Array(entries) => match entries.first() {
            Some(Value::String(_)) => Ok(vec![column_names(key, value)?]),
            Some(Value::Array(_)) => entries.iter().map(|e| column_names(key, e)).collect(),
            Some(Value::Object(_)) => entries.iter().map(|e| composite_object(key, e)).collect(),
            _ => Err(composite_error(key, value)),
        },
        _ => Err(composite_error(key, value)),
    }
}

fn model(doc: &Document, schema: &Value) -> SchemaResult<ValidationResult> {
    let view = resolve(doc, schema)?;

    let Some(tablename) = view.tablename else {
        return Ok(ValidationResult::fail(format!(
            "{} :: every model must define x-tablename",
            keys::TABLENAME
        )));
    };
    let parent = parent_name(doc, schema)?;
    if parent.is_none() && peek::own_tablename(schema)?.is_none() {
        return Ok(ValidationResult::fail(format!(
            "{} :: {tablename:?} is only defined on a referenced schema, use {} to inherit it",
            keys::TABLENAME,
            keys::INHERITS
        )));
    }

    let schema_type = peek::schema_type(doc, schema)?;
    if schema_type != SchemaType::Object {
        return Ok(ValidationResult::fail(format!(
            "{} :: expected object, actual is {schema_type}.",
            keys::TYPE
        )));
    }

    if iterate::properties(doc, schema, Scope::Model)?.is_empty() {
        let reason = match parent {
            Some(_) => "models with x-inherits must have at least 1 property themself",
            None => "models must have at least 1 property",
        };
        return Ok(ValidationResult::fail(format!("{} :: {reason}", keys::PROPERTIES)));
    }

    let required = iterate::required(doc, schema, Scope::Model)?;
    if let Some(missing) = required.iter().find(|name| !view.properties.contains(*name)) {
        return Ok(ValidationResult::fail(format!(
            "{} :: could not find {missing} in the model properties",
            keys::REQUIRED
        )));
    }

    if let Some(kwargs) = view.kwargs {
        for key in kwargs.keys() {
            if key == keys::TABLE_ARGS {
                return Ok(ValidationResult::fail(format!(
                    "{} :: {} is not allowed, use {} and {} instead",
                    keys::KWARGS,
                    keys::TABLE_ARGS,
                    keys::COMPOSITE_INDEX,
                    keys::COMPOSITE_UNIQUE
                )));
            }
            let dunder = key.len() > 4 && key.starts_with("__") && key.ends_with("__");
            if !dunder {
                return Ok(ValidationResult::fail(format!(
                    "{} :: {key} :: keys must start and end with __",
                    keys::KWARGS
                )));
            }
        }
    }

    for fragment in local_fragments(schema)? {
        if let Some(key) = keys::MODEL_FORBIDDEN_KEYS
            .iter()
            .find(|key| fragment.get(**key).is_some())
        {
            return Ok(ValidationResult::fail(format!(
                "{key} :: not supported on a model, define it on a property"
            )));
        }
    }

    let columns = iterate::property_names(doc, schema, Scope::Table)?;
    for key in [keys::COMPOSITE_INDEX, keys::COMPOSITE_UNIQUE] {
        let Some(value) = peek::prefer_local_key(doc, schema, key)? else {
            continue;
        };
        for group in composite_columns(key, value)? {
            if let Some(missing) = group.iter().find(|name| !columns.contains(*name)) {
                return Ok(ValidationResult::fail(format!(
                    "{key} :: could not find {missing} in the columns of {tablename:?}"
                )));
            }
        }
    }

    Ok(ValidationResult::ok())
}

/// Validate that a schema can back a table.
pub fn check_model(doc: &Document, schema: &Value) -> ValidationResult {
    model(doc, schema).unwrap_or_else(ValidationResult::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(extra: Value) -> Document {
        let mut schemas = json!({
            "Employee": {
                "type": "object",
                "x-tablename": "employee",
                "properties": {
                    "id": {"type": "integer", "x-primary-key": true},
                    "name": {"type": "string"}
                }
            }
        });
        if let (Some(base), Value::Object(extra)) = (schemas.as_object_mut(), extra) {
            base.extend(extra);
        }
        Document::from_value(schemas).unwrap()
    }

    fn check(d: &Document, name: &str) -> ValidationResult {
        check_model(d, d.get(name).unwrap())
    }

    #[test]
    fn test_valid_model() {
        let d = doc(json!({}));
        assert!(check(&d, "Employee").is_valid());
    }

    #[test]
    fn test_missing_tablename() {
        let d = doc(json!({"Plain": {"type": "object", "properties": {"a": {"type": "integer"}}}}));
        assert_eq!(check(&d, "Plain").reason(), "x-tablename :: every model must define x-tablename");
    }

    #[test]
    fn test_tablename_only_referenced() {
        let d = doc(json!({"Alias": {"$ref": "#/components/schemas/Employee"}}));
        assert!(check(&d, "Alias").reason().contains("use x-inherits to inherit it"));
    }

    #[test]
    fn test_type_must_be_object() {
        let d = doc(json!({"Bad": {"type": "array", "x-tablename": "bad", "items": {}}}));
        assert_eq!(check(&d, "Bad").reason(), "type :: expected object, actual is array.");
    }

    #[test]
    fn test_type_missing() {
        let d = doc(json!({"Bad": {"x-tablename": "bad", "properties": {"a": {"type": "integer"}}}}));
        assert!(check(&d, "Bad").reason().starts_with("type missing"));
    }

    #[test]
    fn test_inheriting_model_needs_own_property() {
        let d = doc(json!({
            "Manager": {"allOf": [
                {"$ref": "#/components/schemas/Employee"},
                {"x-inherits": true}
            ]},
            "Engineer": {"allOf": [
                {"$ref": "#/components/schemas/Employee"},
                {"x-inherits": true, "properties": {"skill": {"type": "string"}}}
            ]}
        }));
        assert_eq!(
            check(&d, "Manager").reason(),
            "properties :: models with x-inherits must have at least 1 property themself"
        );
        assert!(check(&d, "Engineer").is_valid());
    }

    #[test]
    fn test_empty_properties() {
        let d = doc(json!({"Empty": {"type": "object", "x-tablename": "empty", "properties": {}}}));
        assert_eq!(check(&d, "Empty").reason(), "properties :: models must have at least 1 property");
    }

    #[test]
    fn test_required_may_name_inherited_property() {
        let d = doc(json!({
            "Engineer": {"allOf": [
                {"$ref": "#/components/schemas/Employee"},
                {"x-inherits": true, "required": ["name", "skill"], "properties": {"skill": {"type": "string"}}}
            ]},
            "Broken": {
                "type": "object", "x-tablename": "broken", "required": ["missing"],
                "properties": {"id": {"type": "integer"}}
            }
        }));
        assert!(check(&d, "Engineer").is_valid());
        assert_eq!(check(&d, "Broken").reason(), "required :: could not find missing in the model properties");
    }

    #[test]
    fn test_kwargs_rules() {
        let d = doc(json!({
            "TableArgs": {
                "type": "object", "x-tablename": "a", "x-kwargs": {"__table_args__": []},
                "properties": {"id": {"type": "integer"}}
            },
            "NotDunder": {
                "type": "object", "x-tablename": "b", "x-kwargs": {"mapper_args": {}},
                "properties": {"id": {"type": "integer"}}
            },
            "Fine": {
                "type": "object", "x-tablename": "c", "x-kwargs": {"__mapper_args__": {}},
                "properties": {"id": {"type": "integer"}}
            }
        }));
        assert!(check(&d, "TableArgs").reason().starts_with("x-kwargs :: __table_args__ is not allowed"));
        assert_eq!(check(&d, "NotDunder").reason(), "x-kwargs :: mapper_args :: keys must start and end with __");
        assert!(check(&d, "Fine").is_valid());
    }

    #[test]
    fn test_forbidden_model_keys() {
        let d = doc(json!({
            "Keyed": {"allOf": [{
                "type": "object", "x-tablename": "keyed", "x-primary-key": true,
                "properties": {"id": {"type": "integer"}}
            }]}
        }));
        assert_eq!(
            check(&d, "Keyed").reason(),
            "x-primary-key :: not supported on a model, define it on a property"
        );
    }

    #[test]
    fn test_composite_index_shapes() {
        let names = json!(["a", "b"]);
        assert_eq!(composite_columns(keys::COMPOSITE_INDEX, &names).unwrap(), vec![vec!["a", "b"]]);
        let lists = json!([["a"], ["b", "c"]]);
        assert_eq!(composite_columns(keys::COMPOSITE_INDEX, &lists).unwrap().len(), 2);
        let object = json!({"expressions": ["a"], "name": "ix", "unique": true});
        assert_eq!(composite_columns(keys::COMPOSITE_INDEX, &object).unwrap(), vec![vec!["a"]]);
        let unique = json!([{"columns": ["a", "b"]}]);
        assert_eq!(composite_columns(keys::COMPOSITE_UNIQUE, &unique).unwrap(), vec![vec!["a", "b"]]);
        assert!(composite_columns(keys::COMPOSITE_INDEX, &json!([])).is_err());
        assert!(composite_columns(keys::COMPOSITE_INDEX, &json!([1])).is_err());
        assert!(composite_columns(keys::COMPOSITE_UNIQUE, &json!({"expressions": ["a"]})).is_err());
    }

    #[test]
    fn test_composite_columns_must_exist() {
        let d = doc(json!({
            "Indexed": {
                "type": "object", "x-tablename": "indexed",
                "x-composite-index": ["id", "name"],
                "x-composite-unique": [["id"]],
                "properties": {"id": {"type": "integer"}, "name": {"type": "string"}}
            },
            "BadIndex": {
                "type": "object", "x-tablename": "bad_index",
                "x-composite-unique": {"columns": ["id", "other"]},
                "properties": {"id": {"type": "integer"}}
            }
        }));
        assert!(check(&d, "Indexed").is_valid());
        assert_eq!(
            check(&d, "BadIndex").reason(),
            "x-composite-unique :: could not find other in the columns of \"bad_index\""
        );
    }

    #[test]
    fn test_malformed_composite_is_extension_error() {
        let d = doc(json!({
            "Bad": {
                "type": "object", "x-tablename": "bad", "x-composite-index": true,
                "properties": {"id": {"type": "integer"}}
            }
        }));
        assert!(check(&d, "Bad").reason().starts_with("extension property :: x-composite-index"));
    }
}

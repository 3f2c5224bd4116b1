//! # Schema Document
//!
//! The `components.schemas` mapping of an OpenAPI document: schema name →
//! schema fragment. Fragments refer to each other by name through
//! `#/components/schemas/<Name>` references, never by pointer.
//!
//! ## Shape Invariant
//!
//! A [`Document`] built through [`Document::from_value`] or
//! [`Document::from_openapi`] is a mapping whose every value is a mapping.
//! Deeper shape problems are left to the resolver and validators, which
//! report them per schema.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{SchemaError, SchemaResult, SpecError};
use crate::keys;

/// Prefix of every supported `$ref` value.
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Extract the schema name from a `$ref` value.
///
/// Only local component references are supported.
pub fn ref_name(reference: &str) -> SchemaResult<&str> {
    match reference.strip_prefix(SCHEMA_REF_PREFIX) {
        Some(name) if !name.is_empty() && !name.contains('/') => Ok(name),
        _ => Err(SchemaError::malformed(format!(
            "{} :: {reference:?} is not a reference of the form {SCHEMA_REF_PREFIX}<name>",
            keys::REF
        ))),
    }
}

/// Name → schema mapping the engine reads and, during pre-processing,
/// extends with synthesized foreign-key properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Document {
    schemas: Map<String, Value>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from a parsed `components.schemas` value.
    ///
    /// # Errors
    ///
    /// Returns `SpecError::MalformedSpecification` if the value is not a
    /// mapping or any schema is not a mapping.
    pub fn from_value(value: Value) -> Result<Self, SpecError> {
        let Value::Object(schemas) = value else {
            return Err(SpecError::MalformedSpecification(format!(
                "schemas must be a mapping, actual is {}",
                describe(&value)
            )));
        };
        for (name, schema) in &schemas {
            if !schema.is_object() {
                return Err(SpecError::MalformedSpecification(format!(
                    "{name} :: schemas must be mappings, actual is {}",
                    describe(schema)
                )));
            }
        }
        Ok(Self { schemas })
    }

    /// Build a document from a full OpenAPI specification by extracting
    /// `components.schemas`.
    pub fn from_openapi(spec: &Value) -> Result<Self, SpecError> {
        let schemas = components_schemas(spec)?;
        Self::from_value(schemas.clone())
    }

    /// Look up a schema by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schemas.get(name)
    }

    /// Mutable lookup, used by the foreign-key application pass.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.schemas.get_mut(name)
    }

    /// Insert or replace a schema, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, schema: Value) -> Option<Value> {
        self.schemas.insert(name.into(), schema)
    }

    /// Whether a schema with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Iterate `(name, schema)` pairs in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.schemas.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Returns true if the document holds no schema.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Resolve a `$ref` value to `(name, schema)`.
    ///
    /// # Errors
    ///
    /// `SchemaError::Malformed` for unsupported reference forms,
    /// `SchemaError::ReferenceNotFound` for unknown names.
    pub fn resolve_ref(&self, reference: &str) -> SchemaResult<(&str, &Value)> {
        let name = ref_name(reference)?;
        self.schemas
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| {
                SchemaError::ReferenceNotFound(format!("{name} was not found in the schemas"))
            })
    }

    /// Consume the document and return the raw schemas mapping.
    pub fn into_value(self) -> Value {
        Value::Object(self.schemas)
    }
}

/// Locate `components.schemas` inside an OpenAPI specification.
pub fn components_schemas(spec: &Value) -> Result<&Value, SpecError> {
    if !spec.is_object() {
        return Err(SpecError::MalformedSpecification(format!(
            "the specification must be a mapping, actual is {}",
            describe(spec)
        )));
    }
    spec.get("components")
        .and_then(|c| c.get("schemas"))
        .ok_or_else(|| {
            SpecError::MalformedSpecification(
                "the specification must define components.schemas".to_string(),
            )
        })
}

/// Mutable counterpart of [`components_schemas`].
pub fn components_schemas_mut(spec: &mut Value) -> Result<&mut Value, SpecError> {
    spec.get_mut("components")
        .and_then(|c| c.get_mut("schemas"))
        .ok_or_else(|| {
            SpecError::MalformedSpecification(
                "the specification must define components.schemas".to_string(),
            )
        })
}

/// Human-readable JSON kind of a value, used in `actual is ...` messages.
pub fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ref_name_valid() {
        assert_eq!(ref_name("#/components/schemas/RefSchema").unwrap(), "RefSchema");
    }

    #[test]
    fn test_ref_name_rejects_remote_and_empty() {
        assert!(ref_name("other.yaml#/components/schemas/A").is_err());
        assert!(ref_name("#/components/schemas/").is_err());
        assert!(ref_name("#/definitions/A").is_err());
    }

    #[test]
    fn test_from_value_not_mapping() {
        let err = Document::from_value(json!(["a"])).unwrap_err();
        assert!(matches!(err, SpecError::MalformedSpecification(_)));
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_from_value_schema_not_mapping() {
        let err = Document::from_value(json!({"Schema": "not a schema"})).unwrap_err();
        assert!(err.to_string().contains("Schema"));
    }

    #[test]
    fn test_from_openapi_missing_components() {
        let err = Document::from_openapi(&json!({"openapi": "3.0.0"})).unwrap_err();
        assert!(err.to_string().contains("components.schemas"));
    }

    #[test]
    fn test_from_openapi_extracts_schemas() {
        let doc = Document::from_openapi(&json!({
            "components": {"schemas": {"A": {"type": "object"}}}
        }))
        .unwrap();
        assert_eq!(doc.len(), 1);
        assert!(doc.contains("A"));
    }

    #[test]
    fn test_resolve_ref_not_found() {
        let doc = Document::from_value(json!({"A": {}})).unwrap();
        let err = doc.resolve_ref("#/components/schemas/B").unwrap_err();
        assert!(matches!(err, SchemaError::ReferenceNotFound(_)));
        let (name, _) = doc.resolve_ref("#/components/schemas/A").unwrap();
        assert_eq!(name, "A");
    }

    #[test]
    fn test_iter_preserves_document_order() {
        let doc = Document::from_value(json!({"Zeta": {}, "Alpha": {}, "Mid": {}})).unwrap();
        let names: Vec<&str> = doc.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(&json!(1)), "integer");
        assert_eq!(describe(&json!(1.5)), "number");
        assert_eq!(describe(&json!(null)), "null");
    }
}

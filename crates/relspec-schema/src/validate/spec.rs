//! # Specification Check
//!
//! Validates a whole document and produces a [`SpecReport`]:
//!
//! 1. at least one constructable schema (when configured);
//! 2. document consistency (table and association name uniqueness);
//! 3. every constructable schema: the model, then each property at the
//!    model's own inheritance level. The first failure becomes the report
//!    reason, framed as `"<schema> :: <property> :: ..."`.
//!
//! Schemas without a table are not errors. They get an entry in the
//! `models` breakdown explaining why they were not treated as tables, and
//! how their properties would fare.

use std::collections::BTreeMap;

use serde_json::Value;

use relspec_core::{
    Document, ModelReport, PropertyReport, SpecError, SpecReport, ValidationResult,
};

use crate::classify::{gather, property_kind, PropertyKind};
use crate::config::EngineConfig;
use crate::resolve::iterate::{self, Scope};
use crate::resolve::peek;

use super::document::check_document;
use super::model::check_model;
use super::property::{check_backref_property, check_json, check_property, check_simple};

/// Fail unless the document holds at least one constructable schema.
pub fn ensure_constructable(doc: &Document) -> Result<(), SpecError> {
    let found = doc
        .iter()
        .any(|(_, schema)| matches!(peek::tablename(doc, schema), Ok(Some(_))));
    if found {
        Ok(())
    } else {
        Err(SpecError::MalformedSpecification(
            "no schema defines x-tablename, at least one constructable schema is required".to_string(),
        ))
    }
}

fn check_constructable(doc: &Document, name: &str, schema: &Value) -> ValidationResult {
    let model = check_model(doc, schema);
    if !model.is_valid() {
        return model.within(name);
    }
    let properties = match iterate::properties(doc, schema, Scope::Model) {
        Ok(properties) => properties,
        Err(err) => return ValidationResult::from(err).within(name),
    };
    for (property_name, property) in properties {
        let result = check_property(doc, name, schema, property_name, property);
        if !result.is_valid() {
            return result.within(property_name).within(name);
        }
    }
    ValidationResult::ok()
}

fn check_unmanaged_property(doc: &Document, property: &Value) -> ValidationResult {
    let kind = match property_kind(doc, property) {
        Ok(kind) => kind,
        Err(err) => return err.into(),
    };
    match kind {
        PropertyKind::Simple => check_simple(doc, property),
        PropertyKind::Json => check_json(doc, property),
        PropertyKind::Backref => check_backref_property(doc, property),
        PropertyKind::Relationship => match gather(doc, property) {
            Ok(relationship) => check_model(doc, relationship.target)
                .within(relationship.target_name)
                .within("referenced schema"),
            Err(err) => err.into(),
        },
    }
}

fn unmanaged_report(doc: &Document, schema: &Value) -> ModelReport {
    let properties = iterate::properties(doc, schema, Scope::All).ok().map(|properties| {
        properties
            .into_iter()
            .map(|(name, property)| {
                let result = check_unmanaged_property(doc, property);
                (name.to_string(), PropertyReport { result })
            })
            .collect()
    });
    ModelReport {
        result: check_model(doc, schema),
        properties,
    }
}

/// Validate a whole document.
pub fn check(doc: &Document, config: &EngineConfig) -> SpecReport {
    if config.require_constructable {
        if let Err(err) = ensure_constructable(doc) {
            return SpecReport::top_level(ValidationResult::fail(err.to_string()));
        }
    }

    let mut result = check_document(doc);
    let mut models = BTreeMap::new();

    for (name, schema) in doc.iter() {
        match peek::tablename(doc, schema) {
            Ok(Some(_)) => {
                if result.is_valid() {
                    result = check_constructable(doc, name, schema);
                }
            }
            Ok(None) => {
                if config.include_unmanaged_report {
                    models.insert(name.to_string(), unmanaged_report(doc, schema));
                }
            }
            Err(err) => {
                if result.is_valid() {
                    result = ValidationResult::from(err).within(name);
                }
            }
        }
    }

    if !result.is_valid() {
        tracing::debug!(reason = %result.reason(), "specification failed validation");
    }
    SpecReport {
        result,
        models: (!models.is_empty()).then_some(models),
    }
}

/// Validate a parsed `components.schemas` value.
pub fn check_value(value: &Value, config: &EngineConfig) -> SpecReport {
    match Document::from_value(value.clone()) {
        Ok(doc) => check(&doc, config),
        Err(err) => SpecReport::top_level(ValidationResult::fail(err.to_string())),
    }
}

/// Validate a full OpenAPI specification.
pub fn check_openapi(spec: &Value, config: &EngineConfig) -> SpecReport {
    match Document::from_openapi(spec) {
        Ok(doc) => check(&doc, config),
        Err(err) => SpecReport::top_level(ValidationResult::fail(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strict() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn test_not_a_mapping() {
        let report = check_value(&json!(["Schema"]), &strict());
        assert!(!report.is_valid());
        assert!(report.result.reason().starts_with("malformed specification"));
        assert!(report.models.is_none());
    }

    #[test]
    fn test_requires_constructable() {
        let value = json!({"Plain": {"type": "object", "properties": {"a": {"type": "integer"}}}});
        let report = check_value(&value, &strict());
        assert!(report.result.reason().contains("at least one constructable schema"));
        assert!(report.models.is_none());

        let relaxed = EngineConfig {
            require_constructable: false,
            ..EngineConfig::default()
        };
        let report = check_value(&value, &relaxed);
        assert!(report.is_valid());
        assert!(report.models.unwrap().contains_key("Plain"));
    }

    #[test]
    fn test_valid_document_with_unmanaged_report() {
        let value = json!({
            "Employee": {
                "type": "object",
                "x-tablename": "employee",
                "properties": {
                    "id": {"type": "integer", "x-primary-key": true},
                    "address": {"$ref": "#/components/schemas/Address"}
                }
            },
            "Address": {"type": "object", "properties": {"street": {"type": "string"}}}
        });
        let report = check_value(&value, &strict());
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({
                "result": {"valid": false, "reason": "Employee :: address :: referenced schema :: Address :: x-tablename :: every model must define x-tablename"},
                "models": {
                    "Address": {
                        "result": {"valid": false, "reason": "x-tablename :: every model must define x-tablename"},
                        "properties": {"street": {"result": {"valid": true}}}
                    }
                }
            })
        );
    }

    #[test]
    fn test_report_disabled() {
        let value = json!({
            "Employee": {"type": "object", "x-tablename": "employee", "properties": {"id": {"type": "integer"}}},
            "Address": {"type": "object", "properties": {"street": {"type": "string"}}}
        });
        let config = EngineConfig {
            include_unmanaged_report: false,
            ..EngineConfig::default()
        };
        let report = check_value(&value, &config);
        assert!(report.is_valid());
        assert!(report.models.is_none());
    }

    #[test]
    fn test_first_failure_framed_by_schema_and_property() {
        let value = json!({
            "Schema": {
                "type": "object",
                "x-tablename": "schema",
                "properties": {"prop_1": {"type": "integer", "default": "one"}}
            }
        });
        let report = check_value(&value, &strict());
        assert_eq!(
            report.result.reason(),
            "Schema :: prop_1 :: default :: expected integer, actual is string."
        );
    }

    #[test]
    fn test_document_consistency_runs_first() {
        let value = json!({
            "A": {"type": "object", "x-tablename": "t", "properties": {"id": {"type": "integer"}}},
            "B": {"type": "object", "x-tablename": "t", "properties": {"id": {"type": "integer", "default": "x"}}}
        });
        let report = check_value(&value, &strict());
        assert!(report.result.reason().contains("already used by A"));
    }

    #[test]
    fn test_check_openapi() {
        let spec = json!({
            "openapi": "3.0.0",
            "components": {"schemas": {
                "Employee": {"type": "object", "x-tablename": "employee", "properties": {"id": {"type": "integer"}}}
            }}
        });
        assert!(check_openapi(&spec, &strict()).is_valid());
        assert!(!check_openapi(&json!({"openapi": "3.0.0"}), &strict()).is_valid());
    }

    #[test]
    fn test_malformed_tablename_is_reported() {
        let value = json!({
            "Employee": {"type": "object", "x-tablename": "employee", "properties": {"id": {"type": "integer"}}},
            "Broken": {"type": "object", "x-tablename": 1}
        });
        let report = check_value(&value, &strict());
        assert_eq!(
            report.result.reason(),
            "Broken :: extension property :: x-tablename :: expected string, actual is integer"
        );
    }
}

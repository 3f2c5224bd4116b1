//! # End-to-End Scenarios
//!
//! Documents are written in YAML under `tests/fixtures/` and parsed with
//! `serde_yaml`, the way an external loader would hand them to the engine.

use serde_json::{json, Value};

use relspec_core::{Document, RelationshipKind, SpecError, SpecReport};
use relspec_schema::{
    apply, check, check_document, check_relationship, classify, preprocess, synthesize,
    EngineConfig,
};

fn load(yaml: &str) -> Document {
    let value: Value = serde_yaml::from_str(yaml).expect("fixture must be valid YAML");
    Document::from_value(value).expect("fixture must be a schemas mapping")
}

fn property<'a>(doc: &'a Document, schema: &str, name: &str) -> &'a Value {
    &doc.get(schema).expect("schema exists")["properties"][name]
}

// -- Scenario 1: many-to-one with a model-level column override ---------------

#[test]
fn test_many_to_one_synthesizes_column_on_owner() {
    let mut doc = load(include_str!("fixtures/many_to_one.yaml"));
    let owner = doc.get("Schema1").unwrap();
    let artifact = synthesize(&doc, "Schema1", owner, "ref", property(&doc, "Schema1", "ref"))
        .unwrap()
        .unwrap();

    assert_eq!(artifact.owner_schema_name, "Schema1");
    assert_eq!(artifact.property_name, "ref_schema_1_prop_1");
    assert_eq!(
        artifact.property_schema,
        json!({"type": "integer", "x-foreign-key": "ref_schema_1.prop_1", "nullable": true})
    );

    apply(&mut doc, &[artifact]).unwrap();
    let injected = &doc.get("Schema1").unwrap()["allOf"][0]["properties"]["ref_schema_1_prop_1"];
    assert_eq!(injected["x-foreign-key"], json!("ref_schema_1.prop_1"));
}

// -- Scenario 2: one-to-many attaches the column to the items schema ----------

#[test]
fn test_one_to_many_synthesizes_column_on_referenced_schema() {
    let mut doc = load(include_str!("fixtures/one_to_many.yaml"));
    let owner = doc.get("Schema").unwrap();
    let items = property(&doc, "Schema", "items");
    assert_eq!(classify(&doc, items).unwrap(), RelationshipKind::OneToMany);

    let artifact = synthesize(&doc, "Schema", owner, "items", items).unwrap().unwrap();
    assert_eq!(artifact.owner_schema_name, "RefSchema");
    assert_eq!(artifact.property_name, "schema_items_id");
    assert_eq!(artifact.property_schema["nullable"], json!(true));

    apply(&mut doc, &[artifact]).unwrap();
    assert!(doc.get("RefSchema").unwrap()["allOf"][0]["properties"]["schema_items_id"].is_object());
    assert!(doc.get("Schema").unwrap().get("allOf").is_none());
}

// -- Scenario 3: shared association table -------------------------------------

#[test]
fn test_duplicate_secondary_is_invalid() {
    let doc = load(include_str!("fixtures/duplicate_secondary.yaml"));
    let result = check_document(&doc);
    assert!(!result.is_valid());
    let reason = result.reason();
    assert!(reason.contains("Project"), "{reason}");
    assert!(reason.contains("Team"), "{reason}");
    assert!(reason.contains("assoc"), "{reason}");
}

// -- Scenario 4: back-reference must be read-only -----------------------------

#[test]
fn test_backref_not_read_only_is_invalid() {
    let doc = load(include_str!("fixtures/backref_not_read_only.yaml"));
    let owner = doc.get("Pet").unwrap();
    let result = check_relationship(&doc, "Pet", owner, "owner", property(&doc, "Pet", "owner"));
    assert!(!result.is_valid());
    assert!(result.reason().contains("the property must be readOnly"));
}

// -- Scenario 5: duplicate table names ----------------------------------------

#[test]
fn test_duplicate_tablename_names_both_schemas_in_order() {
    let doc = load(include_str!("fixtures/duplicate_tablename.yaml"));
    let result = check_document(&doc);
    let reason = result.reason();
    assert!(reason.contains("table_1"));
    assert!(reason.contains("already"));
    let first = reason.find("Schema1").expect("first schema named");
    let second = reason.find("Schema2").expect("second schema named");
    assert!(first < second);
}

// -- Full pipeline ------------------------------------------------------------

#[test]
fn test_employees_document_is_valid() {
    let doc = load(include_str!("fixtures/employees.yaml"));
    let report = check(&doc, &EngineConfig::default());
    assert!(report.is_valid(), "{}", report.result.reason());

    let models = report.models.expect("unmanaged schemas are reported");
    assert_eq!(models.len(), 1);
    let address = &models["Address"];
    assert!(!address.result.is_valid());
    assert!(address.properties.as_ref().unwrap()["street"].result.is_valid());
}

#[test]
fn test_employees_preprocess() {
    let mut doc = load(include_str!("fixtures/employees.yaml"));
    let artifacts = preprocess(&mut doc, &EngineConfig::default()).unwrap();

    let names: Vec<&str> = artifacts.iter().map(|a| a.property_name.as_str()).collect();
    assert_eq!(names, vec!["division_id", "badge_code"]);
    assert!(artifacts.iter().all(|a| a.owner_schema_name == "Employee"));

    let employee = doc.get("Employee").unwrap();
    let synthesized = &employee["allOf"][0]["properties"];
    assert_eq!(
        synthesized["badge_code"],
        json!({"type": "string", "maxLength": 16, "nullable": true, "x-foreign-key": "badge.code"})
    );

    // Inheritance levels are untouched.
    assert_eq!(doc.get("Manager").unwrap()["allOf"].as_array().unwrap().len(), 2);

    // A second pass finds everything declared.
    let snapshot = doc.clone();
    assert!(preprocess(&mut doc, &EngineConfig::default()).unwrap().is_empty());
    assert_eq!(doc, snapshot);
}

#[test]
fn test_preprocess_rejects_invalid_document_with_report() {
    let mut doc = load(include_str!("fixtures/duplicate_tablename.yaml"));
    match preprocess(&mut doc, &EngineConfig::default()) {
        Err(SpecError::Invalid { reason, report }) => {
            assert!(reason.contains("table_1"));
            let report: &SpecReport = &report;
            assert_eq!(report.result.reason(), reason);
        }
        other => panic!("expected an invalid specification, got {other:?}"),
    }
}

#[test]
fn test_engine_types_are_thread_safe() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Document>();
    assert_send_sync::<EngineConfig>();
    assert_send_sync::<SpecReport>();
    assert_send_sync::<SpecError>();
}

#[test]
fn test_documents_processed_on_separate_threads() {
    let fixtures = [
        include_str!("fixtures/employees.yaml"),
        include_str!("fixtures/one_to_many.yaml"),
    ];
    let handles: Vec<_> = fixtures
        .into_iter()
        .map(|yaml| {
            let mut doc = load(yaml);
            std::thread::spawn(move || {
                let config = EngineConfig {
                    require_constructable: true,
                    include_unmanaged_report: false,
                };
                (check(&doc, &config).is_valid(), preprocess(&mut doc, &config).is_ok())
            })
        })
        .collect();
    let outcomes: Vec<(bool, bool)> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(outcomes[0], (true, true));
    // RefSchema in this fixture has no type and no properties.
    assert_eq!(outcomes[1], (false, false));
}

//! # Pre-processing Pipeline
//!
//! Runs strictly in this order, aborting on the first failure:
//!
//! 1. **ensure**: at least one constructable schema (when configured);
//! 2. **validate**: the declared document must pass [`check`];
//! 3. **collect**: compute every foreign-key artifact (read-only);
//! 4. **apply**: inject the artifacts into a staged copy;
//! 5. **re-validate**: the staged copy must pass [`check`] as well;
//! 6. **commit**: the staged copy replaces the caller's document.
//!
//! The caller's document is only written in the last step, so a failure
//! never exposes partially applied foreign keys.

use serde_json::Value;

use relspec_core::{components_schemas_mut, Document, ForeignKeyArtifact, SchemaResult, SpecError, SpecReport};

use crate::classify::is_relationship;
use crate::config::EngineConfig;
use crate::foreign_key::{apply, synthesize, unique_per_table};
use crate::resolve::iterate::{self, Scope};
use crate::resolve::peek;
use crate::validate::spec::{check, ensure_constructable};

/// Every foreign-key artifact the document implies and does not already
/// declare, in document order, one per table column.
pub fn collect_artifacts(doc: &Document) -> SchemaResult<Vec<ForeignKeyArtifact>> {
    let mut artifacts = Vec::new();
    for (name, schema) in doc.iter() {
        if peek::tablename(doc, schema)?.is_none() {
            continue;
        }
        for (property_name, property) in iterate::properties(doc, schema, Scope::Model)? {
            if !is_relationship(doc, property)? {
                continue;
            }
            if let Some(artifact) = synthesize(doc, name, schema, property_name, property)? {
                artifacts.push(artifact);
            }
        }
    }

    let unique = unique_per_table(doc, &artifacts)?;
    for artifact in &unique {
        tracing::debug!(
            schema = %artifact.owner_schema_name,
            property = %artifact.property_name,
            "foreign key synthesized"
        );
    }
    Ok(unique.into_iter().cloned().collect())
}

fn invalid(report: SpecReport) -> SpecError {
    SpecError::Invalid {
        reason: report.result.reason().to_string(),
        report: Box::new(report),
    }
}

/// Validate the document and inject the foreign keys its relationships
/// imply. Returns the artifacts that were applied.
///
/// # Errors
///
/// - `SpecError::MalformedSpecification` when no schema is constructable.
/// - `SpecError::Invalid` when the declared document, or the document with
///   the synthesized foreign keys, fails validation; the error carries the
///   full report.
/// - `SpecError::Schema` when an artifact cannot be computed or applied.
pub fn preprocess(doc: &mut Document, config: &EngineConfig) -> Result<Vec<ForeignKeyArtifact>, SpecError> {
    if config.require_constructable {
        ensure_constructable(doc)?;
    }

    let report = check(doc, config);
    if !report.is_valid() {
        return Err(invalid(report));
    }

    let artifacts = collect_artifacts(doc)?;
    let mut staged = doc.clone();
    let added = apply(&mut staged, &artifacts)?;
    let report = check(&staged, config);
    if !report.is_valid() {
        tracing::warn!(reason = %report.result.reason(), "synthesized foreign keys failed validation");
        return Err(invalid(report));
    }
    *doc = staged;

    tracing::info!(
        schemas = doc.len(),
        artifacts = artifacts.len(),
        added,
        "pre-processing complete"
    );
    Ok(artifacts)
}

/// [`preprocess`] applied to the `components.schemas` of a full OpenAPI
/// specification, in place.
pub fn preprocess_openapi(spec: &mut Value, config: &EngineConfig) -> Result<Vec<ForeignKeyArtifact>, SpecError> {
    let mut doc = Document::from_openapi(spec)?;
    let artifacts = preprocess(&mut doc, config)?;
    *components_schemas_mut(spec)? = doc.into_value();
    Ok(artifacts)
}

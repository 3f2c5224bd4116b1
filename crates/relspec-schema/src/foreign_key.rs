//! # Foreign Key Synthesizer
//!
//! Computes the foreign-key column a relationship implies and injects it
//! into the document.
//!
//! ## Two Phases
//!
//! 1. [`calculate`] / [`synthesize`] are pure: they read the document and
//!    return a [`ForeignKeyArtifact`].
//! 2. [`apply`] batches artifacts per receiving schema and mutates each
//!    schema once, appending a single `allOf` member that carries every new
//!    column for that schema.
//!
//! ## Naming
//!
//! | Kind                      | Attached to     | Property name                      |
//! |---------------------------|-----------------|------------------------------------|
//! | many-to-one, one-to-one   | owner           | `<target table>_<target column>`   |
//! | one-to-many               | referenced item | `<owner table>_<property>_<column>` |
//! | many-to-many              | none            | association table instead          |

use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value};

use relspec_core::{keys, Document, ForeignKeyArtifact, RelationshipKind, SchemaError, SchemaResult};

use crate::classify::{gather, Relationship};
use crate::resolve::iterate::{self, Scope};
use crate::resolve::{is_single_table_child, peek};

/// Column a foreign key targets when nothing else says otherwise.
pub const DEFAULT_COLUMN: &str = "id";

/// The column name a foreign key into `model` targets.
///
/// The relationship-local `x-foreign-key-column` wins, then the model's
/// own, then its single primary key, then [`DEFAULT_COLUMN`].
pub fn target_column<'a>(
    doc: &'a Document,
    local: Option<&'a str>,
    model: &'a Value,
) -> SchemaResult<&'a str> {
    if let Some(column) = local {
        return Ok(column);
    }
    if let Some(column) = peek::foreign_key_column(doc, model)? {
        return Ok(column);
    }
    match iterate::primary_keys(doc, model, Scope::All)?.as_slice() {
        [(name, _)] => Ok(*name),
        _ => Ok(DEFAULT_COLUMN),
    }
}

fn tablename_of<'a>(doc: &'a Document, name: &str, schema: &'a Value) -> SchemaResult<&'a str> {
    peek::tablename(doc, schema)?.ok_or_else(|| {
        SchemaError::malformed(format!(
            "{} :: {name} is not constructable",
            keys::TABLENAME
        ))
    })
}

fn column_of<'a>(
    doc: &'a Document,
    model_name: &str,
    model: &'a Value,
    column: &str,
) -> SchemaResult<&'a Value> {
    let schema = iterate::property(doc, model, column, Scope::All)?.ok_or_else(|| {
        SchemaError::malformed(format!(
            "{} :: the column {column:?} is not a property of {model_name}",
            keys::FOREIGN_KEY_COLUMN
        ))
    })?;
    let schema_type = peek::schema_type(doc, schema)?;
    if !schema_type.is_simple() {
        return Err(SchemaError::malformed(format!(
            "{} :: {column} :: the column must have a simple type, actual is {schema_type}",
            keys::FOREIGN_KEY_COLUMN
        )));
    }
    Ok(schema)
}

/// Property schema of a foreign-key column mirroring `column`.
fn column_schema(
    doc: &Document,
    column: &Value,
    nullable: bool,
    foreign_key: String,
) -> SchemaResult<Value> {
    let mut schema = Map::new();
    schema.insert(
        keys::TYPE.to_string(),
        Value::from(peek::schema_type(doc, column)?.as_str()),
    );
    if let Some(format) = peek::format(doc, column)? {
        schema.insert(keys::FORMAT.to_string(), Value::from(format));
    }
    if let Some(max_length) = peek::max_length(doc, column)? {
        schema.insert(keys::MAX_LENGTH.to_string(), Value::from(max_length));
    }
    if let Some(default) = peek::default(doc, column)?.filter(|v| !v.is_null()) {
        schema.insert(keys::DEFAULT.to_string(), default.clone());
    }
    schema.insert(keys::NULLABLE.to_string(), Value::Bool(nullable));
    schema.insert(keys::FOREIGN_KEY.to_string(), Value::String(foreign_key));
    Ok(Value::Object(schema))
}

/// Compute the foreign-key artifact of a relationship property without
/// looking at what is already declared. Many-to-many yields `None`.
pub fn calculate(
    doc: &Document,
    owner_name: &str,
    owner: &Value,
    property_name: &str,
    property: &Value,
) -> SchemaResult<Option<ForeignKeyArtifact>> {
    let relationship = gather(doc, property)?;
    calculate_gathered(doc, owner_name, owner, property_name, &relationship)
}

pub(crate) fn calculate_gathered(
    doc: &Document,
    owner_name: &str,
    owner: &Value,
    property_name: &str,
    relationship: &Relationship<'_>,
) -> SchemaResult<Option<ForeignKeyArtifact>> {
    let Relationship {
        kind,
        target_name,
        target,
        modifiers,
    } = relationship;

    match kind {
        RelationshipKind::ManyToOne | RelationshipKind::OneToOne => {
            let target_table = tablename_of(doc, target_name, target)?;
            let column_name = target_column(doc, modifiers.foreign_key_column, target)?;
            let column = column_of(doc, target_name, target, column_name)?;

            let required = iterate::required(doc, owner, Scope::All)?.contains(&property_name);
            let has_default = peek::default(doc, column)?.is_some_and(|v| !v.is_null());
            let nullable = modifiers.nullable.unwrap_or(!(required || has_default));

            Ok(Some(ForeignKeyArtifact {
                owner_schema_name: owner_name.to_string(),
                property_name: format!("{target_table}_{column_name}"),
                property_schema: column_schema(
                    doc,
                    column,
                    nullable,
                    format!("{target_table}.{column_name}"),
                )?,
            }))
        }
        RelationshipKind::OneToMany => {
            let owner_table = tablename_of(doc, owner_name, owner)?;
            let column_name = target_column(doc, modifiers.foreign_key_column, owner)?;
            let column = column_of(doc, owner_name, owner, column_name)?;

            let mut property_schema =
                column_schema(doc, column, true, format!("{owner_table}.{column_name}"))?;
            if let Some(schema) = property_schema.as_object_mut() {
                schema.insert(keys::DICT_IGNORE.to_string(), Value::Bool(true));
            }

            Ok(Some(ForeignKeyArtifact {
                owner_schema_name: target_name.to_string(),
                property_name: format!("{owner_table}_{property_name}_{column_name}"),
                property_schema,
            }))
        }
        RelationshipKind::ManyToMany => Ok(None),
    }
}

/// Compute the artifact unless its column is already declared on the
/// receiving schema, in which case agreement is left to validation.
pub fn synthesize(
    doc: &Document,
    owner_name: &str,
    owner: &Value,
    property_name: &str,
    property: &Value,
) -> SchemaResult<Option<ForeignKeyArtifact>> {
    let Some(artifact) = calculate(doc, owner_name, owner, property_name, property)? else {
        return Ok(None);
    };
    if is_declared(doc, &artifact)? {
        tracing::debug!(
            schema = %artifact.owner_schema_name,
            property = %artifact.property_name,
            "foreign key already declared, skipping"
        );
        return Ok(None);
    }
    Ok(Some(artifact))
}

fn receiving_schema<'a>(doc: &'a Document, name: &str) -> SchemaResult<&'a Value> {
    doc.get(name)
        .ok_or_else(|| SchemaError::ReferenceNotFound(format!("{name} was not found in the schemas")))
}

/// Whether the column already exists in the receiving schema's table. A
/// single-table child sees the columns of the parents sharing its table.
fn is_declared(doc: &Document, artifact: &ForeignKeyArtifact) -> SchemaResult<bool> {
    let schema = receiving_schema(doc, &artifact.owner_schema_name)?;
    Ok(iterate::property(doc, schema, &artifact.property_name, Scope::Table)?.is_some())
}

/// Keep one artifact per table column. Single-table children share their
/// parent's table, so a column both would receive goes to the schema that
/// owns the table.
pub(crate) fn unique_per_table<'a>(
    doc: &Document,
    artifacts: impl IntoIterator<Item = &'a ForeignKeyArtifact>,
) -> SchemaResult<Vec<&'a ForeignKeyArtifact>> {
    let mut kept: Vec<(&'a ForeignKeyArtifact, bool)> = Vec::new();
    let mut columns: HashMap<(String, &'a str), usize> = HashMap::new();

    for artifact in artifacts {
        let name = artifact.owner_schema_name.as_str();
        let schema = receiving_schema(doc, name)?;
        let table = peek::tablename(doc, schema)?.unwrap_or(name).to_string();
        let is_child = is_single_table_child(doc, schema)?;

        let key = (table, artifact.property_name.as_str());
        match columns.get(&key).copied() {
            None => {
                columns.insert(key, kept.len());
                kept.push((artifact, is_child));
            }
            Some(index) => {
                let (existing, existing_is_child) = kept[index];
                if existing.property_schema != artifact.property_schema {
                    tracing::warn!(
                        table = %key.0,
                        property = %artifact.property_name,
                        first = %existing.owner_schema_name,
                        second = %name,
                        "conflicting foreign key synthesized twice for one table"
                    );
                }
                if existing_is_child && !is_child {
                    kept[index] = (artifact, is_child);
                }
            }
        }
    }
    Ok(kept.into_iter().map(|(artifact, _)| artifact).collect())
}

/// Inject artifacts into the document, one new `allOf` member per
/// receiving schema. Columns that already exist in the receiving table are
/// skipped. Returns the number of columns added.
pub fn apply(doc: &mut Document, artifacts: &[ForeignKeyArtifact]) -> SchemaResult<usize> {
    let mut pending = Vec::new();
    for artifact in artifacts {
        if !is_declared(doc, artifact)? {
            pending.push(artifact);
        }
    }

    let mut batches: BTreeMap<&str, Map<String, Value>> = BTreeMap::new();
    for artifact in unique_per_table(doc, pending)? {
        batches
            .entry(artifact.owner_schema_name.as_str())
            .or_default()
            .insert(artifact.property_name.clone(), artifact.property_schema.clone());
    }

    let mut added = 0;
    for (name, properties) in batches {
        added += properties.len();
        let schema = doc
            .get_mut(name)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| {
                SchemaError::ReferenceNotFound(format!("{name} was not found in the schemas"))
            })?;
        let all_of = schema
            .entry(keys::ALL_OF)
            .or_insert_with(|| Value::Array(Vec::new()))
            .as_array_mut()
            .ok_or_else(|| {
                SchemaError::malformed(format!("{} :: expected array on {name}", keys::ALL_OF))
            })?;

        let mut member = Map::new();
        member.insert(keys::TYPE.to_string(), Value::from("object"));
        member.insert(keys::PROPERTIES.to_string(), Value::Object(properties));
        all_of.push(Value::Object(member));
        tracing::debug!(schema = %name, "foreign keys applied");
    }
    Ok(added)
}

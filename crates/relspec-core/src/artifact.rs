//! # Foreign-Key Artifacts
//!
//! A synthesized foreign-key column: which schema receives it, under which
//! property name, with which property schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::keys;

/// A foreign-key column the engine will inject into the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyArtifact {
    /// Name of the schema that receives the column.
    pub owner_schema_name: String,
    /// Synthesized property name.
    pub property_name: String,
    /// Property schema of the column.
    pub property_schema: Value,
}

impl ForeignKeyArtifact {
    /// The `x-foreign-key` target of the column, if set.
    pub fn foreign_key(&self) -> Option<&str> {
        self.property_schema.get(keys::FOREIGN_KEY).and_then(Value::as_str)
    }
}

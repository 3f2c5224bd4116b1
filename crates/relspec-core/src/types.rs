//! # Schema Types
//!
//! The closed set of OpenAPI `type` values the engine reasons about.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::SchemaError;

/// The effective `type` of a schema fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    Object,
    Array,
    Integer,
    Number,
    String,
    Boolean,
}

impl SchemaType {
    /// Returns all schema types in declaration order.
    pub fn all() -> &'static [SchemaType] {
        &[
            Self::Object,
            Self::Array,
            Self::Integer,
            Self::Number,
            Self::String,
            Self::Boolean,
        ]
    }

    /// Returns the OpenAPI keyword for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
        }
    }

    /// Whether a column of this type can be stored directly in a table.
    pub fn is_simple(&self) -> bool {
        !matches!(self, Self::Object | Self::Array)
    }

    /// Whether `value` is an acceptable literal (e.g. a `default`) for
    /// this type.
    pub fn accepts(&self, value: &serde_json::Value) -> bool {
        match self {
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::String => value.is_string(),
            Self::Boolean => value.is_boolean(),
        }
    }
}

impl std::fmt::Display for SchemaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "object" => Ok(Self::Object),
            "array" => Ok(Self::Array),
            "integer" => Ok(Self::Integer),
            "number" => Ok(Self::Number),
            "string" => Ok(Self::String),
            "boolean" => Ok(Self::Boolean),
            other => Err(SchemaError::malformed(format!(
                "type :: {other:?} is not a supported type"
            ))),
        }
    }
}

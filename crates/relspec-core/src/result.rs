//! # Validation Results and Reports
//!
//! [`ValidationResult`] is what every validator returns. Its `reason` is a
//! path of context frames joined by [`FRAME_SEPARATOR`], accumulated while
//! validation descends, e.g.
//! `"prop_1 :: type :: expected integer, actual is string."`.
//!
//! The report types serialize to the external report shape:
//!
//! ```text
//! { "result": { "valid": bool, "reason"?: string },
//!   "models"?: { <schema>: { "result": {...},
//!                            "properties"?: { <prop>: { "result": {...} } } } } }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Joiner between the frames of a reason string.
pub const FRAME_SEPARATOR: &str = " :: ";

/// Outcome of a single validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the checked item is valid.
    pub valid: bool,
    /// Framed reason, present only when invalid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ValidationResult {
    /// Create a successful result.
    pub fn ok() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    /// Create a failed result with the given reason.
    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
        }
    }

    /// Whether the result is valid.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The reason, or an empty string for valid results.
    pub fn reason(&self) -> &str {
        self.reason.as_deref().unwrap_or_default()
    }

    /// Prefix the reason with an outer frame. Valid results pass through.
    pub fn within(self, frame: &str) -> Self {
        match self.reason {
            Some(reason) if !self.valid => Self::fail(format!("{frame}{FRAME_SEPARATOR}{reason}")),
            _ => self,
        }
    }
}

impl From<SchemaError> for ValidationResult {
    fn from(err: SchemaError) -> Self {
        Self::fail(err.to_string())
    }
}

impl<T> From<Result<T, SchemaError>> for ValidationResult {
    fn from(result: Result<T, SchemaError>) -> Self {
        match result {
            Ok(_) => Self::ok(),
            Err(err) => err.into(),
        }
    }
}

/// Report entry for one property of a non-constructable schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyReport {
    pub result: ValidationResult,
}

/// Report entry for one non-constructable schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelReport {
    /// Why the schema was not treated as a table.
    pub result: ValidationResult,
    /// Per-property results, when the properties could be enumerated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, PropertyReport>>,
}

/// Report of a whole-specification check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecReport {
    /// Overall result; the reason is the first failure found.
    pub result: ValidationResult,
    /// Breakdown of the schemas that are not constructable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<BTreeMap<String, ModelReport>>,
}

impl SpecReport {
    /// A report carrying only a top-level result.
    pub fn top_level(result: ValidationResult) -> Self {
        Self {
            result,
            models: None,
        }
    }

    /// Whether the specification is valid.
    pub fn is_valid(&self) -> bool {
        self.result.valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ok_and_fail() {
        assert!(ValidationResult::ok().is_valid());
        let r = ValidationResult::fail("boom");
        assert!(!r.is_valid());
        assert_eq!(r.reason(), "boom");
    }

    #[test]
    fn test_within_prefixes_failures_only() {
        let r = ValidationResult::fail("type :: expected integer, actual is string.").within("prop_1");
        assert_eq!(r.reason(), "prop_1 :: type :: expected integer, actual is string.");
        assert_eq!(ValidationResult::ok().within("prop_1"), ValidationResult::ok());
    }

    #[test]
    fn test_from_schema_error() {
        let r: ValidationResult = SchemaError::ReferenceNotFound("Missing".into()).into();
        assert!(!r.valid);
        assert_eq!(r.reason(), "reference :: Missing");
    }

    #[test]
    fn test_serialized_shape_omits_reason_when_valid() {
        let report = SpecReport::top_level(ValidationResult::ok());
        assert_eq!(serde_json::to_value(&report).unwrap(), json!({"result": {"valid": true}}));
    }

    #[test]
    fn test_serialized_shape_with_models() {
        let mut properties = BTreeMap::new();
        properties.insert(
            "prop".to_string(),
            PropertyReport {
                result: ValidationResult::ok(),
            },
        );
        let mut models = BTreeMap::new();
        models.insert(
            "Plain".to_string(),
            ModelReport {
                result: ValidationResult::fail("x-tablename :: not defined"),
                properties: Some(properties),
            },
        );
        let report = SpecReport {
            result: ValidationResult::ok(),
            models: Some(models),
        };
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({
                "result": {"valid": true},
                "models": {
                    "Plain": {
                        "result": {"valid": false, "reason": "x-tablename :: not defined"},
                        "properties": {"prop": {"result": {"valid": true}}}
                    }
                }
            })
        );
    }
}

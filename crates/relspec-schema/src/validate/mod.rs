//! # Validators
//!
//! Every validator returns a [`ValidationResult`](relspec_core::ValidationResult)
//! and never an error: resolver failures are caught at the validator
//! boundary and become the failure reason. Validators stop at the first
//! failure they find.
//!
//! | Module           | Checks                                               |
//! |------------------|------------------------------------------------------|
//! | [`model`]        | one schema as a table                                |
//! | [`property`]     | one property, dispatched on its kind                 |
//! | [`relationship`] | target, foreign key agreement, many-to-many keys     |
//! | [`backref`]      | the declared reverse side of a relationship          |
//! | [`document`]     | table and association name uniqueness                |
//! | [`spec`]         | the whole document, with the unmanaged-schema report |

pub mod backref;
pub mod document;
pub mod model;
pub mod property;
pub mod relationship;
pub mod spec;

use serde_json::Value;

use relspec_core::{keys, Document, SchemaResult};

use crate::resolve::peek;

fn field_mismatch<T: PartialEq + ToString>(field: &str, expected: Option<T>, actual: Option<T>) -> Option<String> {
    if expected == actual {
        return None;
    }
    let show = |value: Option<T>| value.map_or_else(|| "not defined".to_string(), |v| v.to_string());
    Some(format!(
        "{field} :: expected {}, actual is {}.",
        show(expected),
        show(actual)
    ))
}

/// A column default, with `default: null` counting as no default.
fn column_default<'a>(doc: &'a Document, column: &'a Value) -> SchemaResult<Option<&'a Value>> {
    Ok(peek::default(doc, column)?.filter(|v| !v.is_null()))
}

/// Compare the column-defining keys of `actual` against `expected`.
///
/// Returns the first differing field as
/// `"<field> :: expected <x>, actual is <y>."`.
pub(crate) fn column_mismatch(doc: &Document, expected: &Value, actual: &Value) -> SchemaResult<Option<String>> {
    let mismatch = field_mismatch(
        keys::TYPE,
        peek::maybe_type(doc, expected)?,
        peek::maybe_type(doc, actual)?,
    )
    .or(field_mismatch(
        keys::FORMAT,
        peek::format(doc, expected)?,
        peek::format(doc, actual)?,
    ))
    .or(field_mismatch(
        keys::MAX_LENGTH,
        peek::max_length(doc, expected)?,
        peek::max_length(doc, actual)?,
    ))
    .or(field_mismatch(
        keys::DEFAULT,
        column_default(doc, expected)?,
        column_default(doc, actual)?,
    ));
    Ok(mismatch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_column_mismatch_type() {
        let doc = Document::new();
        let mismatch = column_mismatch(&doc, &json!({"type": "integer"}), &json!({"type": "string"})).unwrap();
        assert_eq!(mismatch.as_deref(), Some("type :: expected integer, actual is string."));
    }

    #[test]
    fn test_column_mismatch_missing_format() {
        let doc = Document::new();
        let mismatch = column_mismatch(
            &doc,
            &json!({"type": "integer", "format": "int64"}),
            &json!({"type": "integer"}),
        )
        .unwrap();
        assert_eq!(mismatch.as_deref(), Some("format :: expected int64, actual is not defined."));
    }

    #[test]
    fn test_column_mismatch_default_and_max_length() {
        let doc = Document::new();
        let expected = json!({"type": "string", "maxLength": 5, "default": "a"});
        let mismatch = column_mismatch(&doc, &expected, &json!({"type": "string", "maxLength": 6, "default": "a"})).unwrap();
        assert_eq!(mismatch.as_deref(), Some("maxLength :: expected 5, actual is 6."));
        let mismatch = column_mismatch(&doc, &expected, &json!({"type": "string", "maxLength": 5, "default": "b"})).unwrap();
        assert_eq!(mismatch.as_deref(), Some("default :: expected \"a\", actual is \"b\"."));
    }

    #[test]
    fn test_column_mismatch_null_default_is_no_default() {
        let doc = Document::new();
        let mismatch = column_mismatch(
            &doc,
            &json!({"type": "integer", "nullable": true, "default": null}),
            &json!({"type": "integer"}),
        )
        .unwrap();
        assert_eq!(mismatch, None);
    }

    #[test]
    fn test_column_mismatch_ignores_other_keys() {
        let doc = Document::new();
        let mismatch = column_mismatch(
            &doc,
            &json!({"type": "integer", "nullable": true}),
            &json!({"type": "integer", "x-foreign-key": "a.b", "description": "d"}),
        )
        .unwrap();
        assert_eq!(mismatch, None);
    }
}

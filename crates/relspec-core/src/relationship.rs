//! # Relationship Kinds
//!
//! The four relational shapes a property pointing at another constructable
//! schema can take. Derived from the property shape, never stored in the
//! document.
//!
//! | Shape | `x-secondary` | `x-uselist: false` | Kind |
//! |-------|---------------|--------------------|------|
//! | object | n/a | yes | [`RelationshipKind::OneToOne`] |
//! | object | n/a | no/absent | [`RelationshipKind::ManyToOne`] |
//! | array | yes | n/a | [`RelationshipKind::ManyToMany`] |
//! | array | no/absent | n/a | [`RelationshipKind::OneToMany`] |

use serde::{Deserialize, Serialize};

use crate::types::SchemaType;

/// Relational kind of a relationship property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipKind {
    /// The declaring schema holds a foreign key to a single target row.
    ManyToOne,
    /// Like many-to-one, but the target refers back to at most one row.
    OneToOne,
    /// The target rows hold a foreign key back to the declaring schema.
    OneToMany,
    /// Both sides are joined through an association table.
    ManyToMany,
}

/// Shape a back-reference property must have on the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackrefShape {
    /// A single object.
    Object,
    /// An array of objects.
    Array,
}

impl BackrefShape {
    /// The schema type the back-reference property must declare.
    pub fn schema_type(&self) -> SchemaType {
        match self {
            Self::Object => SchemaType::Object,
            Self::Array => SchemaType::Array,
        }
    }
}

impl RelationshipKind {
    /// Returns all kinds in declaration order.
    pub fn all() -> &'static [RelationshipKind] {
        &[
            Self::ManyToOne,
            Self::OneToOne,
            Self::OneToMany,
            Self::ManyToMany,
        ]
    }

    /// Classify a relationship from its resolved shape.
    ///
    /// `is_array` is the property (not the target) shape. `uselist` only
    /// matters for single references and `has_secondary` only for arrays.
    pub fn from_shape(is_array: bool, has_secondary: bool, uselist: Option<bool>) -> Self {
        match (is_array, has_secondary, uselist) {
            (false, _, Some(false)) => Self::OneToOne,
            (false, _, _) => Self::ManyToOne,
            (true, true, _) => Self::ManyToMany,
            (true, false, _) => Self::OneToMany,
        }
    }

    /// Returns the kebab-case name used in reasons and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ManyToOne => "many-to-one",
            Self::OneToOne => "one-to-one",
            Self::OneToMany => "one-to-many",
            Self::ManyToMany => "many-to-many",
        }
    }

    /// Whether the relationship is realized through an owned foreign-key
    /// column rather than an association table.
    pub fn has_foreign_key(&self) -> bool {
        !matches!(self, Self::ManyToMany)
    }

    /// Shape of the back-reference seen from the target.
    pub fn backref_shape(&self) -> BackrefShape {
        match self {
            Self::ManyToOne | Self::ManyToMany => BackrefShape::Array,
            Self::OneToOne | Self::OneToMany => BackrefShape::Object,
        }
    }
}

impl std::fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error taxonomy of the inference engine. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - [`SchemaError`] is raised by the composition resolver and everything
//!   built on it. Validators catch it at their boundary and turn it into a
//!   failed [`ValidationResult`](crate::ValidationResult), so its `Display`
//!   is already the `" :: "`-framed reason string.
//! - [`SpecError`] is only raised by the outermost entry points, when the
//!   document cannot be reasoned about at all or when pre-processing is
//!   refused because the declared document is invalid.

use thiserror::Error;

use crate::result::SpecReport;

/// Convenience alias for results carrying a [`SchemaError`].
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Error raised while resolving or interpreting a schema fragment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A key exists but has the wrong primitive type or value shape.
    #[error("malformed schema :: {0}")]
    Malformed(String),

    /// A `$ref` (or a foreign-key-implied target) does not exist.
    #[error("reference :: {0}")]
    ReferenceNotFound(String),

    /// Neither the fragment nor anything it composes supplies a `type`.
    #[error("type missing :: {0}")]
    TypeMissing(String),

    /// An `x-*` extension value fails its own shape rules.
    #[error("extension property :: {0}")]
    ExtensionProperty(String),

    /// A whole-graph invariant is violated.
    #[error("constraint :: {0}")]
    ConstraintViolation(String),

    /// Following `$ref`s re-entered a schema already on the current path.
    #[error("malformed schema :: cyclic reference detected at {0}")]
    CyclicReference(String),
}

impl SchemaError {
    /// Build a [`SchemaError::Malformed`] from any message.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Build a [`SchemaError::ExtensionProperty`] from any message.
    pub fn extension(message: impl Into<String>) -> Self {
        Self::ExtensionProperty(message.into())
    }
}

/// Error raised by whole-document entry points.
#[derive(Error, Debug)]
pub enum SpecError {
    /// The input is not a name → schema mapping, lacks `components.schemas`,
    /// or contains no constructable schema.
    #[error("malformed specification :: {0}")]
    MalformedSpecification(String),

    /// The declared document failed validation; nothing was synthesized.
    #[error("invalid specification :: {reason}")]
    Invalid {
        /// First failure reason, `" :: "`-framed.
        reason: String,
        /// Full report, including the breakdown of non-constructable schemas.
        report: Box<SpecReport>,
    },

    /// A resolver error surfaced outside a validator boundary.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

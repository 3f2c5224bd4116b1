//! # relspec-core — Foundational Types for relspec
//!
//! This crate defines the vocabulary shared by the relationship inference
//! engine: the schema document, the closed set of schema types and
//! relationship kinds, the foreign-key artifact produced by synthesis, the
//! validation result/report shapes, and the error taxonomy.
//!
//! ## Key Design Principles
//!
//! 1. **Explicit name → schema map.** Schemas never hold live pointers to each
//!    other. Every `$ref` is a name looked up in the [`Document`], so cyclic
//!    reference graphs carry no ownership problems.
//!
//! 2. **`serde_json::Value` is the schema value.** It is already a closed sum
//!    type (null, bool, number, string, array, object). Typed access is done
//!    by the resolver in `relspec-schema`, which fails with
//!    [`SchemaError::Malformed`] when the author put the wrong type.
//!
//! 3. **Single `RelationshipKind` enum.** Classification output and all
//!    downstream branching is an exhaustive `match`, never a string compare.
//!
//! 4. **Errors carry their frame label.** [`SchemaError`]'s `Display` already
//!    starts with `"malformed schema :: "`, `"reference :: "`, ... so mapping
//!    an error into a [`ValidationResult`] never loses context.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `relspec-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod artifact;
pub mod document;
pub mod error;
pub mod keys;
pub mod relationship;
pub mod result;
pub mod types;

// Re-export primary types for ergonomic imports.
pub use artifact::ForeignKeyArtifact;
pub use document::{
    components_schemas, components_schemas_mut, describe, ref_name, Document, SCHEMA_REF_PREFIX,
};
pub use error::{SchemaError, SchemaResult, SpecError};
pub use relationship::{BackrefShape, RelationshipKind};
pub use result::{ModelReport, PropertyReport, SpecReport, ValidationResult, FRAME_SEPARATOR};
pub use types::SchemaType;

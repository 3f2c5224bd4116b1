//! # relspec-schema — Relationship Inference and Validation
//!
//! Reads the `components.schemas` of an OpenAPI document, decides how each
//! table-backed schema's relationship properties become relational
//! associations, validates the graph, and injects the foreign-key columns
//! the relationships imply.
//!
//! ## Architecture
//!
//! ```text
//!   resolve ──► classify ──► foreign_key
//!      │            │             │
//!      └────────────┴──► validate ┴──► preprocess
//! ```
//!
//! - [`resolve`]: `$ref` / `allOf` composition, point queries ([`peek`]),
//!   scoped property iteration ([`iterate`]) and inheritance.
//! - [`classify`]: property kinds and relationship kinds.
//! - [`foreign_key`]: pure artifact computation, then batched application.
//! - [`validate`]: model, property, relationship, back-reference, document
//!   and whole-specification checks.
//! - [`preprocess`]: validate, synthesize, apply and commit.
//!
//! ## Usage
//!
//! ```
//! use relspec_core::Document;
//! use relspec_schema::{preprocess, EngineConfig};
//! use serde_json::json;
//!
//! let mut doc = Document::from_value(json!({
//!     "Schema": {
//!         "type": "object",
//!         "x-tablename": "schema",
//!         "properties": {
//!             "id": {"type": "integer", "x-primary-key": true},
//!             "ref": {"$ref": "#/components/schemas/RefSchema"}
//!         }
//!     },
//!     "RefSchema": {
//!         "type": "object",
//!         "x-tablename": "ref_schema",
//!         "properties": {"id": {"type": "integer", "x-primary-key": true}}
//!     }
//! }))?;
//!
//! let artifacts = preprocess(&mut doc, &EngineConfig::default())?;
//! assert_eq!(artifacts[0].property_name, "ref_schema_id");
//! # Ok::<(), relspec_core::SpecError>(())
//! ```
//!
//! ## Concurrency
//!
//! Every operation is synchronous and works on a document passed in by the
//! caller; there is no shared state. Distinct documents can be processed on
//! distinct threads.

pub mod classify;
pub mod config;
pub mod foreign_key;
pub mod preprocess;
pub mod resolve;
pub mod validate;

pub use classify::{classify, gather, is_relationship, property_kind, Modifiers, PropertyKind, Relationship};
pub use config::EngineConfig;
pub use foreign_key::{apply, calculate, synthesize};
pub use preprocess::{collect_artifacts, preprocess, preprocess_openapi};
pub use resolve::iterate::{self, Scope};
pub use resolve::peek;
pub use resolve::{parent_name, resolve, EffectiveView, Inherits};
pub use validate::backref::check_backref;
pub use validate::document::check_document;
pub use validate::model::check_model;
pub use validate::property::{check_backref_property, check_json, check_property, check_simple};
pub use validate::relationship::check_relationship;
pub use validate::spec::{check, check_openapi, check_value, ensure_constructable};

//! Form Schema Compiler
//!
//! Compiles a declarative form description into a runtime validator and
//! a visibility map.
//!
//! A [`FormMetadata`] document declares an ordered list of typed fields
//! with optional per-field validation, default values, and visibility
//! conditions. Compilation produces a validator that accepts or rejects
//! submitted data with localized, field-level error messages; the
//! visibility engine evaluates each field's condition against the
//! current values to decide which fields should be shown.
//!
//! # Example
//!
//! ```
//! use form_schema::{compute_visibility, FormCompiler, FormMetadata};
//! use serde_json::{json, Map};
//!
//! let metadata: FormMetadata = serde_json::from_value(json!({
//!     "version": "1.0",
//!     "fields": [
//!         { "id": "f1", "name": "email", "type": "text",
//!           "label": "Email", "required": true },
//!         { "id": "f2", "name": "state", "type": "text",
//!           "label": "State", "required": true,
//!           "condition": { "fieldId": "f1", "operator": "not_empty" } }
//!     ]
//! }))
//! .unwrap();
//!
//! let compiler = FormCompiler::new();
//! let compiled = compiler.compile(&metadata);
//! assert!(compiled.success);
//!
//! let mut values = Map::new();
//! values.insert("email".to_string(), json!("a@example.com"));
//! values.insert("state".to_string(), json!("CA"));
//!
//! let outcome = compiler.validate(&values, &metadata);
//! assert!(outcome.success);
//!
//! // The conditioned field is visible once email is filled in.
//! let visibility = compute_visibility(&metadata.fields, &values);
//! assert_eq!(visibility.get("f2"), Some(&true));
//! ```
//!
//! # Error model
//!
//! [`FormCompiler::compile`] and [`FormCompiler::validate`] never return
//! `Err`: all compile-time violations (duplicate ids, unknown types,
//! missing options, condition cycles) and all field-level validation
//! failures are collected into [`CompilationResult`] and
//! [`ValidationResult`]. The designer converter is the only hard-failing
//! boundary.

mod cache;
mod compiler;
mod designer;
mod error;
mod graph;
mod localize;
mod metadata;
mod schema;
mod types;
mod visibility;

pub use cache::{SchemaCache, DEFAULT_CACHE_CAPACITY};
pub use compiler::{compile, validate, CompilationResult, FormCompiler, ValidationResult};
pub use designer::{
    designer_to_metadata, designer_type_to_field_type, field_type_to_designer,
    metadata_to_designer, validate_designer_json, DesignerCheck,
};
pub use error::DesignerError;
pub use graph::check_cycles;
pub use localize::{localize, most_important_errors, Locale};
pub use metadata::{parse_metadata, validate_metadata};
pub use schema::{
    build_validator, CompiledField, CompiledValidator, FieldMeta, FieldValidator, Issue, IssueCode,
};
pub use types::{
    CompilationError, CompilationErrorKind, ConditionOperator, FieldCondition, FieldType,
    FormField, FormMetadata, SelectOption, ValidationError, VisibilityMap, MAX_FIELDS,
};
pub use visibility::compute_visibility;

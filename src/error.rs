//! Error types for the designer format converter.
//!
//! Compilation and validation never surface these; the public `compile`
//! and `validate` paths collect structured error lists instead. The
//! converter is the crate's only hard-failing boundary, since a designer
//! document that is not even array-shaped has no per-field errors to
//! report.

use thiserror::Error;

/// Errors while converting designer JSON to form metadata.
#[derive(Debug, Error)]
pub enum DesignerError {
    #[error("designer document must be an array, got {actual}")]
    NotAnArray { actual: &'static str },

    #[error("component {index} must be an object, got {actual}")]
    NotAnObject { index: usize, actual: &'static str },

    #[error("component {index} is missing a \"field\" name")]
    MissingField { index: usize },

    #[error("component {index}: {message}")]
    InvalidComponent { index: usize, message: String },
}

//! Core types for form metadata compilation and validation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Valid field type names in metadata documents.
pub const VALID_FIELD_TYPES: &[&str] =
    &["text", "textarea", "number", "select", "date", "checkbox"];

/// Upper bound on fields per form. Metadata is untrusted input, so
/// compilation and cycle detection cost must stay bounded.
pub const MAX_FIELDS: usize = 256;

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Canonical declarative description of a form.
///
/// Immutable once compiled; its identity for caching purposes is the
/// order-preserving JSON serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormMetadata {
    pub version: String,
    pub fields: Vec<FormField>,
}

/// A single typed field in a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    /// Unique field id, referenced by visibility conditions.
    pub id: String,
    /// Unique machine name, used as the data key on submission.
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SelectOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<FieldCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    /// Column span from the visual designer. Carried only so a designer
    /// round trip preserves layout; the compiler ignores it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<u32>,
}

/// Declared type of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Textarea,
    Number,
    Select,
    Date,
    Checkbox,
}

impl FieldType {
    /// Parse a field type from its metadata name.
    ///
    /// Returns `None` for unknown values (caller should error).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(FieldType::Text),
            "textarea" => Some(FieldType::Textarea),
            "number" => Some(FieldType::Number),
            "select" => Some(FieldType::Select),
            "date" => Some(FieldType::Date),
            "checkbox" => Some(FieldType::Checkbox),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Number => "number",
            FieldType::Select => "select",
            FieldType::Date => "date",
            FieldType::Checkbox => "checkbox",
        }
    }
}

/// One selectable option of a `select` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: Value,
}

/// A rule making one field's visibility depend on another field's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldCondition {
    /// Id of the field whose current value is inspected.
    pub field_id: String,
    pub operator: ConditionOperator,
    #[serde(default)]
    pub value: Value,
}

/// Comparison operator of a visibility condition.
///
/// Unrecognized operator names deserialize to `Unknown` and always
/// evaluate to hidden rather than failing the whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    Contains,
    NotEmpty,
    #[serde(other)]
    Unknown,
}

/// Category of a compilation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompilationErrorKind {
    /// Malformed metadata: duplicate ids or names, unknown types,
    /// dangling condition references.
    Validation,
    /// The condition graph contains a cycle.
    CircularReference,
    /// A `select` field declares no options.
    MissingOption,
    /// Internal failure wrapped rather than propagated raw.
    Unknown,
}

impl CompilationErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompilationErrorKind::Validation => "VALIDATION",
            CompilationErrorKind::CircularReference => "CIRCULAR_REFERENCE",
            CompilationErrorKind::MissingOption => "MISSING_OPTION",
            CompilationErrorKind::Unknown => "UNKNOWN",
        }
    }
}

/// Single compile-time error with field context.
#[derive(Debug, Clone, Serialize)]
pub struct CompilationError {
    /// Id of the offending field, when one is identifiable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
    pub kind: CompilationErrorKind,
}

impl std::fmt::Display for CompilationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.field {
            Some(field) => write!(f, "[{}] {}: {}", self.kind.as_str(), field, self.message),
            None => write!(f, "[{}] {}", self.kind.as_str(), self.message),
        }
    }
}

/// Single field-level validation error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    /// Machine name of the field, or `"unknown"` when compilation failed
    /// before a field could be identified.
    pub field: String,
    /// Localized human-readable message.
    pub message: String,
    /// Machine category, e.g. `invalid_type` or `required`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Per-field boolean visibility, keyed by field id.
///
/// Only conditioned fields are entered; absent fields are visible by
/// convention.
pub type VisibilityMap = std::collections::HashMap<String, bool>;

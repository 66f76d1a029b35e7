//! Metadata validation - structural checks on a form document.
//!
//! Checks that a `FormMetadata` document is internally well-formed:
//! - unique field ids and machine names
//! - known field types
//! - non-empty option lists on `select` fields
//! - condition references that point at existing fields
//!
//! All violations are collected and reported together, each annotated
//! with a `fields[i].attr` locator.

use std::collections::HashSet;

use serde_json::Value;

use crate::types::{
    json_type_name, CompilationError, CompilationErrorKind, FieldType, FormMetadata, MAX_FIELDS,
    VALID_FIELD_TYPES,
};

/// Parse an untrusted JSON document into `FormMetadata`.
///
/// Unknown field types are reported per field rather than as one opaque
/// deserialization failure, so a designer UI can highlight the exact
/// offending entries.
pub fn parse_metadata(value: &Value) -> Result<FormMetadata, Vec<CompilationError>> {
    let Some(root) = value.as_object() else {
        return Err(vec![CompilationError {
            field: None,
            message: format!("metadata must be an object, got {}", json_type_name(value)),
            kind: CompilationErrorKind::Validation,
        }]);
    };

    let Some(fields) = root.get("fields").and_then(Value::as_array) else {
        return Err(vec![CompilationError {
            field: None,
            message: "metadata.fields must be an array".to_string(),
            kind: CompilationErrorKind::Validation,
        }]);
    };

    let mut errors = Vec::new();
    for (i, field) in fields.iter().enumerate() {
        let declared = field.get("type").and_then(Value::as_str);
        match declared {
            Some(t) if FieldType::parse(t).is_some() => {}
            Some(t) => errors.push(CompilationError {
                field: field_id_of(field),
                message: format!(
                    "fields[{}].type: unknown field type \"{}\": expected {}",
                    i,
                    t,
                    VALID_FIELD_TYPES.join(", ")
                ),
                kind: CompilationErrorKind::Validation,
            }),
            None => errors.push(CompilationError {
                field: field_id_of(field),
                message: format!("fields[{}].type: missing field type", i),
                kind: CompilationErrorKind::Validation,
            }),
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    serde_json::from_value(value.clone()).map_err(|e| {
        vec![CompilationError {
            field: None,
            message: format!("invalid metadata: {}", e),
            kind: CompilationErrorKind::Validation,
        }]
    })
}

/// Validate an already-parsed metadata document.
///
/// Returns the full list of violations; empty means well-formed. The
/// field-count ceiling is the only short-circuiting check, since
/// everything past it is unbounded untrusted input.
pub fn validate_metadata(metadata: &FormMetadata) -> Vec<CompilationError> {
    if metadata.fields.len() > MAX_FIELDS {
        return vec![CompilationError {
            field: None,
            message: format!(
                "form declares {} fields, maximum is {}",
                metadata.fields.len(),
                MAX_FIELDS
            ),
            kind: CompilationErrorKind::Validation,
        }];
    }

    let mut errors = Vec::new();

    let mut seen_ids = HashSet::new();
    for (i, field) in metadata.fields.iter().enumerate() {
        if !seen_ids.insert(field.id.as_str()) {
            errors.push(CompilationError {
                field: Some(field.id.clone()),
                message: format!("fields[{}].id: duplicate field id \"{}\"", i, field.id),
                kind: CompilationErrorKind::Validation,
            });
        }
    }

    let mut seen_names = HashSet::new();
    for (i, field) in metadata.fields.iter().enumerate() {
        if !seen_names.insert(field.name.as_str()) {
            errors.push(CompilationError {
                field: Some(field.id.clone()),
                message: format!("fields[{}].name: duplicate field name \"{}\"", i, field.name),
                kind: CompilationErrorKind::Validation,
            });
        }
    }

    for (i, field) in metadata.fields.iter().enumerate() {
        if field.field_type == FieldType::Select {
            let empty = field.options.as_ref().map(Vec::is_empty).unwrap_or(true);
            if empty {
                errors.push(CompilationError {
                    field: Some(field.id.clone()),
                    message: format!(
                        "fields[{}].options: select field \"{}\" has no options",
                        i, field.name
                    ),
                    kind: CompilationErrorKind::MissingOption,
                });
            }
        }
    }

    let ids: HashSet<&str> = metadata.fields.iter().map(|f| f.id.as_str()).collect();
    for (i, field) in metadata.fields.iter().enumerate() {
        if let Some(cond) = &field.condition {
            if !ids.contains(cond.field_id.as_str()) {
                errors.push(CompilationError {
                    field: Some(field.id.clone()),
                    message: format!(
                        "fields[{}].condition: references unknown field id \"{}\"",
                        i, cond.field_id
                    ),
                    kind: CompilationErrorKind::Validation,
                });
            }
        }
    }

    errors
}

fn field_id_of(field: &Value) -> Option<String> {
    field
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
}

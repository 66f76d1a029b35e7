//! Designer format conversion - bridges the visual designer's JSON
//! dialect and canonical form metadata.
//!
//! The designer serializes a form as an array of components, each with a
//! component `type`, a data-binding `field`, a display `title`, and
//! presentation props. Conversion is lossy by design: `field`, `name`,
//! `type`, `title`, `$required`, options, default value, and `col.span`
//! survive a round trip; upload/radio/multi-select groupings and styling
//! props are designer-only and are dropped or downgraded on the way in.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::DesignerError;
use crate::types::{json_type_name, FieldType, FormField, FormMetadata, SelectOption};

/// Designer component types that require a non-empty option list.
const OPTION_TYPES: &[&str] = &["select", "radio"];

/// Map a designer component type to a canonical field type.
///
/// Unmapped component types degrade to `text` rather than failing, so a
/// designer document with exotic widgets still produces a usable form.
pub fn designer_type_to_field_type(component: &str) -> FieldType {
    match component {
        "input" => FieldType::Text,
        "textarea" => FieldType::Textarea,
        "inputNumber" => FieldType::Number,
        "select" => FieldType::Select,
        "radio" => FieldType::Select,
        "datePicker" => FieldType::Date,
        "switch" => FieldType::Checkbox,
        "checkbox" => FieldType::Checkbox,
        _ => FieldType::Text,
    }
}

/// Map a canonical field type back to its designer component type.
///
/// This is the declared reverse mapping; designer types without one
/// (`radio`, `switch`, uploads) do not round-trip.
pub fn field_type_to_designer(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Text => "input",
        FieldType::Textarea => "textarea",
        FieldType::Number => "inputNumber",
        FieldType::Select => "select",
        FieldType::Date => "datePicker",
        FieldType::Checkbox => "checkbox",
    }
}

/// Convert a designer JSON array into canonical form metadata.
pub fn designer_to_metadata(document: &Value) -> Result<FormMetadata, DesignerError> {
    let Some(components) = document.as_array() else {
        return Err(DesignerError::NotAnArray {
            actual: json_type_name(document),
        });
    };

    let mut fields = Vec::with_capacity(components.len());
    for (index, component) in components.iter().enumerate() {
        fields.push(convert_component(index, component)?);
    }

    Ok(FormMetadata {
        version: "1.0".to_string(),
        fields,
    })
}

/// Convert canonical metadata back into a designer JSON array.
pub fn metadata_to_designer(metadata: &FormMetadata) -> Vec<Value> {
    metadata.fields.iter().map(render_component).collect()
}

/// Result of checking a designer document without converting it.
#[derive(Debug, Clone, Serialize)]
pub struct DesignerCheck {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Check a designer document for convertibility.
///
/// Collects every problem instead of stopping at the first, so a
/// designer UI can show them all at once.
pub fn validate_designer_json(document: &Value) -> DesignerCheck {
    let Some(components) = document.as_array() else {
        return DesignerCheck {
            valid: false,
            errors: vec![format!(
                "designer document must be an array, got {}",
                json_type_name(document)
            )],
        };
    };

    let mut errors = Vec::new();
    let mut seen_fields: Vec<&str> = Vec::new();

    for (index, component) in components.iter().enumerate() {
        let Some(map) = component.as_object() else {
            errors.push(format!(
                "component {}: must be an object, got {}",
                index,
                json_type_name(component)
            ));
            continue;
        };

        match map.get("field").and_then(Value::as_str) {
            Some(field) if !field.is_empty() => {
                if seen_fields.contains(&field) {
                    errors.push(format!(
                        "component {}: duplicate field name \"{}\"",
                        index, field
                    ));
                }
                seen_fields.push(field);
            }
            _ => errors.push(format!("component {}: missing \"field\" name", index)),
        }

        let component_type = map.get("type").and_then(Value::as_str).unwrap_or("input");
        if OPTION_TYPES.contains(&component_type) && extract_options(map).is_empty() {
            errors.push(format!(
                "component {}: \"{}\" requires a non-empty options list",
                index, component_type
            ));
        }
    }

    DesignerCheck {
        valid: errors.is_empty(),
        errors,
    }
}

fn convert_component(index: usize, component: &Value) -> Result<FormField, DesignerError> {
    let Some(map) = component.as_object() else {
        return Err(DesignerError::NotAnObject {
            index,
            actual: json_type_name(component),
        });
    };

    let field = map
        .get("field")
        .and_then(Value::as_str)
        .filter(|f| !f.is_empty())
        .ok_or(DesignerError::MissingField { index })?;

    let component_type = map.get("type").and_then(Value::as_str).unwrap_or("input");
    let field_type = designer_type_to_field_type(component_type);

    let title = map
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or(field)
        .to_string();

    let options = match field_type {
        FieldType::Select => {
            let options = extract_options(map);
            if options.is_empty() {
                return Err(DesignerError::InvalidComponent {
                    index,
                    message: format!(
                        "\"{}\" requires a non-empty options list",
                        component_type
                    ),
                });
            }
            Some(options)
        }
        _ => None,
    };

    Ok(FormField {
        id: field.to_string(),
        name: field.to_string(),
        field_type,
        label: title,
        placeholder: map
            .get("props")
            .and_then(|p| p.get("placeholder"))
            .and_then(Value::as_str)
            .map(str::to_string),
        required: is_required(map),
        options,
        condition: None,
        default_value: map.get("value").cloned().filter(|v| !v.is_null()),
        span: map
            .get("col")
            .and_then(|c| c.get("span"))
            .and_then(Value::as_u64)
            .map(|s| s as u32),
    })
}

fn render_component(field: &FormField) -> Value {
    let mut component = Map::new();
    component.insert(
        "type".to_string(),
        json!(field_type_to_designer(field.field_type)),
    );
    component.insert("field".to_string(), json!(field.name));
    component.insert("title".to_string(), json!(field.label));
    component.insert("$required".to_string(), json!(field.required));

    if let Some(options) = &field.options {
        let rendered: Vec<Value> = options
            .iter()
            .map(|o| json!({ "label": o.label, "value": o.value }))
            .collect();
        component.insert("options".to_string(), Value::Array(rendered));
    }
    if let Some(placeholder) = &field.placeholder {
        component.insert("props".to_string(), json!({ "placeholder": placeholder }));
    }
    if let Some(value) = &field.default_value {
        component.insert("value".to_string(), value.clone());
    }
    if let Some(span) = field.span {
        component.insert("col".to_string(), json!({ "span": span }));
    }

    Value::Object(component)
}

/// The designer stores options either at the component root or under
/// `props.options`, as `{label, value}` objects or bare scalars.
fn extract_options(map: &Map<String, Value>) -> Vec<SelectOption> {
    let options = map
        .get("options")
        .or_else(|| map.get("props").and_then(|p| p.get("options")))
        .and_then(Value::as_array);

    let Some(options) = options else {
        return Vec::new();
    };

    options
        .iter()
        .filter_map(|entry| match entry {
            Value::Object(o) => {
                let value = o.get("value")?.clone();
                let label = o
                    .get("label")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| scalar_label(&value));
                Some(SelectOption { label, value })
            }
            scalar @ (Value::String(_) | Value::Number(_) | Value::Bool(_)) => {
                Some(SelectOption {
                    label: scalar_label(scalar),
                    value: scalar.clone(),
                })
            }
            _ => None,
        })
        .collect()
}

/// `$required` is a bool in most documents, but some designers emit the
/// error message string instead; a non-empty string means required.
fn is_required(map: &Map<String, Value>) -> bool {
    match map.get("$required").or_else(|| map.get("required")) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        _ => false,
    }
}

fn scalar_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

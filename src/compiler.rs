//! Form compilation and submission validation.
//!
//! [`FormCompiler`] is the public entry point: it owns the schema cache
//! and the active locale, and turns metadata documents into compiled
//! validators. `compile` and `validate` never return `Err` or panic;
//! every failure is collected into the structured result types.

use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};

use crate::cache::{SchemaCache, DEFAULT_CACHE_CAPACITY};
use crate::graph::check_cycles;
use crate::localize::{localize, most_important_errors, Locale};
use crate::metadata::{parse_metadata, validate_metadata};
use crate::schema::CompiledValidator;
use crate::types::{
    CompilationError, CompilationErrorKind, FormMetadata, ValidationError, MAX_FIELDS,
};
use crate::visibility::compute_visibility;

/// Outcome of compiling a metadata document.
#[derive(Debug, Clone)]
pub struct CompilationResult {
    pub success: bool,
    pub validator: Option<Arc<CompiledValidator>>,
    pub errors: Vec<CompilationError>,
}

impl CompilationResult {
    fn ok(validator: Arc<CompiledValidator>) -> Self {
        CompilationResult {
            success: true,
            validator: Some(validator),
            errors: Vec::new(),
        }
    }

    fn failed(errors: Vec<CompilationError>) -> Self {
        CompilationResult {
            success: false,
            validator: None,
            errors,
        }
    }
}

/// Outcome of validating submitted data.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub success: bool,
    /// Coerced, typed values keyed by field name; present only on success.
    pub data: Option<Map<String, Value>>,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// One summary error per field, highest-priority issue first.
    pub fn summarized(&self) -> Vec<ValidationError> {
        most_important_errors(&self.errors)
    }
}

/// Compiles form metadata into validators and validates submissions.
///
/// The cache and locale are interior state behind locks, so one handle
/// can be shared across threads.
pub struct FormCompiler {
    cache: SchemaCache,
    locale: Mutex<Locale>,
}

impl FormCompiler {
    pub fn new() -> Self {
        FormCompiler::with_cache_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// Capacity 0 disables memoization without changing behavior.
    pub fn with_cache_capacity(capacity: usize) -> Self {
        FormCompiler {
            cache: SchemaCache::new(capacity),
            locale: Mutex::new(Locale::default()),
        }
    }

    /// Set the locale for validation messages.
    ///
    /// Unknown tags fall back to `zh-CN` with a warning.
    pub fn set_locale(&self, tag: &str) {
        *self.lock_locale() = Locale::parse_or_default(tag);
    }

    pub fn get_locale(&self) -> &'static str {
        self.lock_locale().as_str()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Compile a metadata document into a validator.
    ///
    /// Always returns a result: structural violations, cycles, and
    /// internal failures all land in `errors` rather than being thrown.
    pub fn compile(&self, metadata: &FormMetadata) -> CompilationResult {
        let key = match serde_json::to_string(metadata) {
            Ok(key) => key,
            Err(e) => {
                return CompilationResult::failed(vec![CompilationError {
                    field: None,
                    message: format!("failed to canonicalize metadata: {}", e),
                    kind: CompilationErrorKind::Unknown,
                }])
            }
        };

        if let Some(hit) = self.cache.get(&key) {
            return CompilationResult::ok(hit);
        }

        let mut errors = Vec::new();
        // Cycles are structural defects and must surface even alongside
        // other validation errors. Skip the walk past the field ceiling,
        // the ceiling error covers that case.
        if metadata.fields.len() <= MAX_FIELDS {
            if let Some(cycle) = check_cycles(&metadata.fields) {
                errors.push(cycle);
            }
        }
        errors.extend(validate_metadata(metadata));
        if !errors.is_empty() {
            return CompilationResult::failed(errors);
        }

        let compiled = Arc::new(CompiledValidator::build(metadata));
        self.cache.insert(key, Arc::clone(&compiled));
        CompilationResult::ok(compiled)
    }

    /// Compile an untrusted JSON document.
    ///
    /// Front door for metadata arriving as raw JSON; parse failures are
    /// reported per field where possible.
    pub fn compile_value(&self, value: &Value) -> CompilationResult {
        match parse_metadata(value) {
            Ok(metadata) => self.compile(&metadata),
            Err(errors) => CompilationResult::failed(errors),
        }
    }

    /// Validate submitted data against a metadata document.
    ///
    /// Hidden fields are skipped entirely: a conditioned field that is
    /// currently invisible is neither validated nor returned. Errors for
    /// all visible fields are collected, not short-circuited.
    pub fn validate(&self, data: &Map<String, Value>, metadata: &FormMetadata) -> ValidationResult {
        let compiled = self.compile(metadata);
        let Some(validator) = compiled.validator else {
            let errors = compiled
                .errors
                .iter()
                .map(|e| ValidationError {
                    field: e.field.clone().unwrap_or_else(|| "unknown".to_string()),
                    message: e.message.clone(),
                    code: Some(e.kind.as_str().to_ascii_lowercase()),
                })
                .collect();
            return ValidationResult {
                success: false,
                data: None,
                errors,
            };
        };

        let locale = *self.lock_locale();
        let visibility = compute_visibility(&metadata.fields, data);

        let mut parsed = Map::new();
        let mut errors = Vec::new();
        for field in &validator.fields {
            if visibility.get(&field.meta.id) == Some(&false) {
                continue;
            }
            match field.validator.validate(data.get(&field.name)) {
                // Optional absent values stay out of the parsed map.
                Ok(Value::Null) => {}
                Ok(value) => {
                    parsed.insert(field.name.clone(), value);
                }
                Err(issues) => {
                    for issue in issues {
                        errors.push(ValidationError {
                            field: field.name.clone(),
                            message: localize(&issue, Some(&field.meta), locale),
                            code: Some(issue.code.as_str().to_string()),
                        });
                    }
                }
            }
        }

        if errors.is_empty() {
            ValidationResult {
                success: true,
                data: Some(parsed),
                errors,
            }
        } else {
            ValidationResult {
                success: false,
                data: None,
                errors,
            }
        }
    }

    fn lock_locale(&self) -> std::sync::MutexGuard<'_, Locale> {
        match self.locale.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for FormCompiler {
    fn default() -> Self {
        FormCompiler::new()
    }
}

/// One-shot compile with a fresh, cache-less compiler.
pub fn compile(metadata: &FormMetadata) -> CompilationResult {
    FormCompiler::with_cache_capacity(0).compile(metadata)
}

/// One-shot validate with a fresh, cache-less compiler.
pub fn validate(data: &Map<String, Value>, metadata: &FormMetadata) -> ValidationResult {
    FormCompiler::with_cache_capacity(0).validate(data, metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ConditionOperator, FieldCondition, FieldType, FormField, SelectOption,
    };
    use serde_json::json;

    fn text_field(id: &str, name: &str, required: bool) -> FormField {
        FormField {
            id: id.into(),
            name: name.into(),
            field_type: FieldType::Text,
            label: name.into(),
            placeholder: None,
            required,
            options: None,
            condition: None,
            default_value: None,
            span: None,
        }
    }

    fn metadata(fields: Vec<FormField>) -> FormMetadata {
        FormMetadata {
            version: "1.0".into(),
            fields,
        }
    }

    fn data(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn compile_well_formed_metadata() {
        let compiler = FormCompiler::new();
        let result = compiler.compile(&metadata(vec![text_field("f1", "name", true)]));
        assert!(result.success);
        assert!(result.errors.is_empty());
        assert_eq!(result.validator.unwrap().fields.len(), 1);
    }

    #[test]
    fn compile_is_idempotent() {
        let compiler = FormCompiler::new();
        let m = metadata(vec![text_field("f1", "name", true)]);
        let a = compiler.compile(&m).validator.unwrap();
        let b = compiler.compile(&m).validator.unwrap();
        assert_eq!(*a, *b);
        // Second compile is a cache hit on the same allocation.
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn cycle_reported_alongside_other_errors() {
        let mut a = text_field("a", "a", false);
        a.condition = Some(FieldCondition {
            field_id: "b".into(),
            operator: ConditionOperator::Equals,
            value: json!("x"),
        });
        let mut b = text_field("b", "b", false);
        b.condition = Some(FieldCondition {
            field_id: "a".into(),
            operator: ConditionOperator::Equals,
            value: json!("y"),
        });
        // Duplicate name "a" adds a plain validation error on top.
        let dup = text_field("c", "a", false);

        let result = compile(&metadata(vec![a, b, dup]));
        assert!(!result.success);
        assert_eq!(
            result.errors[0].kind,
            CompilationErrorKind::CircularReference
        );
        assert!(result
            .errors
            .iter()
            .any(|e| e.kind == CompilationErrorKind::Validation));
    }

    #[test]
    fn compile_value_reports_unknown_types() {
        let compiler = FormCompiler::new();
        let result = compiler.compile_value(&json!({
            "version": "1.0",
            "fields": [
                { "id": "f1", "name": "x", "type": "upload", "label": "X" }
            ]
        }));
        assert!(!result.success);
        assert_eq!(result.errors[0].kind, CompilationErrorKind::Validation);
        assert!(result.errors[0].message.contains("unknown field type"));
    }

    #[test]
    fn validate_returns_coerced_data() {
        let compiler = FormCompiler::new();
        let mut age = text_field("f2", "age", false);
        age.field_type = FieldType::Number;
        let m = metadata(vec![text_field("f1", "name", true), age]);

        let result = compiler.validate(&data(&[("name", json!("Al")), ("age", json!("30"))]), &m);
        assert!(result.success);
        let parsed = result.data.unwrap();
        assert_eq!(parsed["name"], json!("Al"));
        assert_eq!(parsed["age"], json!(30));
    }

    #[test]
    fn validate_collects_errors_per_field() {
        let compiler = FormCompiler::new();
        compiler.set_locale("en-US");
        let m = metadata(vec![
            text_field("f1", "name", true),
            text_field("f2", "city", true),
        ]);

        let result = compiler.validate(&data(&[("name", json!(""))]), &m);
        assert!(!result.success);
        assert!(result.data.is_none());
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors[0].field, "name");
        assert_eq!(result.errors[0].message, "name is required");
        assert_eq!(result.errors[1].field, "city");
    }

    #[test]
    fn validate_translates_compile_failures() {
        let compiler = FormCompiler::new();
        let mut select = text_field("f1", "country", true);
        select.field_type = FieldType::Select;
        let m = metadata(vec![select]);

        let result = compiler.validate(&data(&[]), &m);
        assert!(!result.success);
        assert_eq!(result.errors[0].field, "f1");
        assert_eq!(result.errors[0].code.as_deref(), Some("missing_option"));
    }

    #[test]
    fn hidden_fields_are_not_validated() {
        let mut state = text_field("state", "state", true);
        state.condition = Some(FieldCondition {
            field_id: "country".into(),
            operator: ConditionOperator::Equals,
            value: json!("US"),
        });
        let country = FormField {
            options: Some(vec![
                SelectOption {
                    label: "US".into(),
                    value: json!("US"),
                },
                SelectOption {
                    label: "CA".into(),
                    value: json!("CA"),
                },
            ]),
            field_type: FieldType::Select,
            ..text_field("country", "country", true)
        };
        let m = metadata(vec![country, state]);

        // state hidden: required but not validated
        let result = validate(&data(&[("country", json!("CA"))]), &m);
        assert!(result.success);

        // state visible: required error fires
        let result = validate(&data(&[("country", json!("US"))]), &m);
        assert!(!result.success);
        assert_eq!(result.errors[0].field, "state");
    }

    #[test]
    fn locale_switching_changes_messages() {
        let compiler = FormCompiler::new();
        let m = metadata(vec![text_field("f1", "name", true)]);

        assert_eq!(compiler.get_locale(), "zh-CN");
        let zh = compiler.validate(&data(&[]), &m);
        assert_eq!(zh.errors[0].message, "name为必填项");

        compiler.set_locale("en-US");
        assert_eq!(compiler.get_locale(), "en-US");
        let en = compiler.validate(&data(&[]), &m);
        assert_eq!(en.errors[0].message, "name is required");

        // Unknown locale falls back to the default.
        compiler.set_locale("fr-FR");
        assert_eq!(compiler.get_locale(), "zh-CN");
    }

    #[test]
    fn clear_cache_forces_recompile() {
        let compiler = FormCompiler::new();
        let m = metadata(vec![text_field("f1", "name", true)]);
        let a = compiler.compile(&m).validator.unwrap();
        compiler.clear_cache();
        let b = compiler.compile(&m).validator.unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(*a, *b);
    }
}

//! Integration tests for compilation, validation, and visibility.

use serde_json::{json, Map, Value};

use form_schema::{
    compute_visibility, CompilationErrorKind, FormCompiler, FormMetadata,
};

fn metadata(doc: Value) -> FormMetadata {
    serde_json::from_value(doc).expect("test metadata must deserialize")
}

fn data(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Metadata for the name/country/state scenario: `state` is required but
/// only visible when `country` equals `"US"`.
fn scenario_metadata() -> FormMetadata {
    metadata(json!({
        "version": "1.0",
        "fields": [
            { "id": "name", "name": "name", "type": "text",
              "label": "Name", "required": true },
            { "id": "country", "name": "country", "type": "select",
              "label": "Country", "required": true,
              "options": [
                  { "label": "US", "value": "US" },
                  { "label": "CA", "value": "CA" }
              ] },
            { "id": "state", "name": "state", "type": "text",
              "label": "State", "required": true,
              "condition": { "fieldId": "country", "operator": "equals", "value": "US" } }
        ]
    }))
}

// === Compilation ===

mod compilation {
    use super::*;

    #[test]
    fn compile_succeeds_on_well_formed_metadata() {
        let result = FormCompiler::new().compile(&scenario_metadata());
        assert!(result.success);
        assert!(result.errors.is_empty());
        assert_eq!(result.validator.unwrap().fields.len(), 3);
    }

    #[test]
    fn compile_is_idempotent() {
        let compiler = FormCompiler::new();
        let m = scenario_metadata();
        let first = compiler.compile(&m).validator.unwrap();
        let second = compiler.compile(&m).validator.unwrap();
        assert_eq!(*first, *second);
    }

    #[test]
    fn three_field_cycle_fails_compilation() {
        let m = metadata(json!({
            "version": "1.0",
            "fields": [
                { "id": "a", "name": "a", "type": "text", "label": "A",
                  "condition": { "fieldId": "b", "operator": "equals", "value": 1 } },
                { "id": "b", "name": "b", "type": "text", "label": "B",
                  "condition": { "fieldId": "c", "operator": "equals", "value": 1 } },
                { "id": "c", "name": "c", "type": "text", "label": "C",
                  "condition": { "fieldId": "a", "operator": "equals", "value": 1 } }
            ]
        }));
        let result = FormCompiler::new().compile(&m);
        assert!(!result.success);
        let cycles: Vec<_> = result
            .errors
            .iter()
            .filter(|e| e.kind == CompilationErrorKind::CircularReference)
            .collect();
        assert_eq!(cycles.len(), 1, "only the first cycle is reported");
    }

    #[test]
    fn acyclic_condition_graph_has_no_cycle_error() {
        let result = FormCompiler::new().compile(&scenario_metadata());
        assert!(result
            .errors
            .iter()
            .all(|e| e.kind != CompilationErrorKind::CircularReference));
    }

    #[test]
    fn select_without_options_is_missing_option() {
        let m = metadata(json!({
            "version": "1.0",
            "fields": [
                { "id": "f1", "name": "country", "type": "select",
                  "label": "Country", "options": [] }
            ]
        }));
        let result = FormCompiler::new().compile(&m);
        assert!(!result.success);
        assert_eq!(result.errors[0].kind, CompilationErrorKind::MissingOption);
        assert_eq!(result.errors[0].field.as_deref(), Some("f1"));
    }

    #[test]
    fn all_metadata_violations_reported_together() {
        let m = metadata(json!({
            "version": "1.0",
            "fields": [
                { "id": "f1", "name": "x", "type": "text", "label": "X" },
                { "id": "f1", "name": "x", "type": "text", "label": "X again" },
                { "id": "f3", "name": "y", "type": "text", "label": "Y",
                  "condition": { "fieldId": "ghost", "operator": "equals", "value": 1 } }
            ]
        }));
        let result = FormCompiler::new().compile(&m);
        assert!(!result.success);
        assert_eq!(result.errors.len(), 3);
    }
}

// === Cache behavior ===

mod cache_behavior {
    use super::*;

    #[test]
    fn cached_and_uncached_validation_agree() {
        let cached = FormCompiler::new();
        let uncached = FormCompiler::with_cache_capacity(0);
        cached.set_locale("en-US");
        uncached.set_locale("en-US");
        let m = scenario_metadata();

        let inputs = [
            data(&[("name", json!("")), ("country", json!("US"))]),
            data(&[("name", json!("Al")), ("country", json!("CA"))]),
            data(&[("name", json!("Al")), ("country", json!("MX"))]),
            data(&[]),
        ];

        for input in &inputs {
            // Validate twice against the caching compiler so the second
            // pass is a guaranteed cache hit.
            let warm = cached.validate(input, &m);
            let hit = cached.validate(input, &m);
            let cold = uncached.validate(input, &m);

            assert_eq!(warm.success, cold.success);
            assert_eq!(warm.errors, cold.errors);
            assert_eq!(warm.data, cold.data);
            assert_eq!(hit.errors, cold.errors);
            assert_eq!(hit.data, cold.data);
        }
    }

    #[test]
    fn clear_cache_does_not_change_results() {
        let compiler = FormCompiler::new();
        let m = scenario_metadata();
        let input = data(&[("name", json!("Al")), ("country", json!("CA"))]);

        let before = compiler.validate(&input, &m);
        compiler.clear_cache();
        let after = compiler.validate(&input, &m);
        assert_eq!(before.success, after.success);
        assert_eq!(before.data, after.data);
    }
}

// === Checkbox coercion ===

mod checkbox_coercion {
    use super::*;

    fn checkbox_metadata() -> FormMetadata {
        metadata(json!({
            "version": "1.0",
            "fields": [
                { "id": "agree", "name": "agree", "type": "checkbox",
                  "label": "Agree", "required": false }
            ]
        }))
    }

    #[test]
    fn coercion_table() {
        let compiler = FormCompiler::new();
        let m = checkbox_metadata();
        let cases = [
            (json!(true), true),
            (json!(false), false),
            (json!(1), true),
            (json!(0), false),
            (json!(2), false),
            (json!("true"), true),
            (json!("FALSE"), false),
            (json!("yes"), true),
            (json!(""), false),
        ];

        for (input, expected) in cases {
            let result = compiler.validate(&data(&[("agree", input.clone())]), &m);
            assert!(result.success, "input {:?} should validate", input);
            assert_eq!(result.data.unwrap()["agree"], json!(expected));
        }
    }

    #[test]
    fn unrecognized_string_is_rejected() {
        let compiler = FormCompiler::new();
        let result = compiler.validate(&data(&[("agree", json!("maybe"))]), &checkbox_metadata());
        assert!(!result.success);
        assert_eq!(result.errors[0].field, "agree");
        assert_eq!(result.errors[0].code.as_deref(), Some("invalid_type"));
    }
}

// === Visibility ===

mod visibility {
    use super::*;

    #[test]
    fn fail_closed_when_referenced_value_absent() {
        let m = scenario_metadata();
        let map = compute_visibility(&m.fields, &data(&[("name", json!("Al"))]));
        assert_eq!(map.get("state"), Some(&false));
    }

    #[test]
    fn only_conditioned_fields_are_entered() {
        let m = scenario_metadata();
        let map = compute_visibility(&m.fields, &data(&[("country", json!("US"))]));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("state"), Some(&true));
        assert!(!map.contains_key("name"));
        assert!(!map.contains_key("country"));
    }

    #[test]
    fn recomputes_from_scratch_on_each_change() {
        let m = scenario_metadata();
        let shown = compute_visibility(&m.fields, &data(&[("country", json!("US"))]));
        assert_eq!(shown.get("state"), Some(&true));
        let hidden = compute_visibility(&m.fields, &data(&[("country", json!("CA"))]));
        assert_eq!(hidden.get("state"), Some(&false));
    }
}

// === End-to-end scenario ===

mod end_to_end {
    use super::*;

    #[test]
    fn empty_name_with_visible_state_yields_two_errors() {
        let compiler = FormCompiler::new();
        let m = scenario_metadata();

        let result = compiler.validate(&data(&[("name", json!("")), ("country", json!("US"))]), &m);
        assert!(!result.success);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors[0].field, "name");
        assert_eq!(result.errors[1].field, "state");
        assert_eq!(result.errors[0].code.as_deref(), Some("required"));
        assert_eq!(result.errors[1].code.as_deref(), Some("required"));
    }

    #[test]
    fn hidden_state_is_not_required() {
        let compiler = FormCompiler::new();
        let m = scenario_metadata();

        let result =
            compiler.validate(&data(&[("name", json!("Al")), ("country", json!("CA"))]), &m);
        assert!(result.success, "errors: {:?}", result.errors);
        assert!(result.errors.is_empty());

        let map = compute_visibility(
            &m.fields,
            &data(&[("name", json!("Al")), ("country", json!("CA"))]),
        );
        assert_eq!(map.get("state"), Some(&false));
    }

    #[test]
    fn localized_messages_follow_the_active_locale() {
        let compiler = FormCompiler::new();
        let m = scenario_metadata();
        let input = data(&[("country", json!("US"))]);

        let zh = compiler.validate(&input, &m);
        assert!(zh.errors.iter().any(|e| e.message == "Name为必填项"));

        compiler.set_locale("en-US");
        let en = compiler.validate(&input, &m);
        assert!(en.errors.iter().any(|e| e.message == "Name is required"));
    }

    #[test]
    fn summarized_yields_one_error_per_field() {
        let compiler = FormCompiler::new();
        compiler.set_locale("en-US");
        let m = metadata(json!({
            "version": "1.0",
            "fields": [
                { "id": "f1", "name": "contact_email", "type": "text",
                  "label": "Email", "required": true }
            ]
        }));

        let result = compiler.validate(&data(&[("contact_email", json!(42))]), &m);
        assert!(!result.success);
        let summary = result.summarized();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].code.as_deref(), Some("invalid_type"));
    }

    #[test]
    fn compilation_failure_surfaces_as_validation_errors() {
        let compiler = FormCompiler::new();
        let m = metadata(json!({
            "version": "1.0",
            "fields": [
                { "id": "f1", "name": "country", "type": "select",
                  "label": "Country", "options": [] }
            ]
        }));

        let result = compiler.validate(&data(&[]), &m);
        assert!(!result.success);
        assert!(result.data.is_none());
        assert_eq!(result.errors[0].field, "f1");
        assert_eq!(result.errors[0].code.as_deref(), Some("missing_option"));
    }
}

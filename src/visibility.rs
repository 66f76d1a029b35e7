//! Visibility evaluation - which fields should currently be shown.
//!
//! Pure function over the field list and the current values; re-run on
//! every value change, never memoized. Only conditioned fields appear
//! in the resulting map, unconditioned fields are visible by convention.
//! When the referenced value is absent the field is hidden (fail closed).

use serde_json::{Map, Value};

use crate::types::{ConditionOperator, FormField, VisibilityMap};

/// Compute the visibility map for the current values.
///
/// Conditions reference the target field by id; the target's current
/// value is looked up under its machine name in `values`.
pub fn compute_visibility(fields: &[FormField], values: &Map<String, Value>) -> VisibilityMap {
    let mut map = VisibilityMap::new();

    for field in fields {
        let Some(cond) = &field.condition else {
            continue;
        };

        let referenced = fields
            .iter()
            .find(|f| f.id == cond.field_id)
            .and_then(|target| values.get(&target.name));

        let visible = match referenced {
            // Absent or null reference hides the field regardless of operator.
            None | Some(Value::Null) => false,
            Some(current) => apply_operator(cond.operator, current, &cond.value),
        };
        map.insert(field.id.clone(), visible);
    }

    map
}

fn apply_operator(operator: ConditionOperator, current: &Value, expected: &Value) -> bool {
    match operator {
        ConditionOperator::Equals => values_equal(current, expected),
        ConditionOperator::NotEquals => !values_equal(current, expected),
        ConditionOperator::GreaterThan => compare(current, expected, |a, b| a > b),
        ConditionOperator::LessThan => compare(current, expected, |a, b| a < b),
        ConditionOperator::GreaterOrEqual => compare(current, expected, |a, b| a >= b),
        ConditionOperator::LessOrEqual => compare(current, expected, |a, b| a <= b),
        ConditionOperator::Contains => {
            coerce_string(current).contains(coerce_string(expected).as_str())
        }
        ConditionOperator::NotEmpty => match current {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        },
        ConditionOperator::Unknown => false,
    }
}

/// Value equality with numeric normalization, so `3` equals `3.0`.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (coerce_number_strict(a), coerce_number_strict(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn compare(current: &Value, expected: &Value, op: impl Fn(f64, f64) -> bool) -> bool {
    match (coerce_number(current), coerce_number(expected)) {
        (Some(a), Some(b)) => op(a, b),
        _ => false,
    }
}

/// Numeric coercion for ordering comparisons: numbers and numeric strings.
fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Equality only normalizes actual JSON numbers, never strings, so
/// `"01"` stays distinct from `1`.
fn coerce_number_strict(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

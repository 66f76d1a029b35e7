//! Field schema building - maps declared field types to primitive validators.
//!
//! Each field compiles to a [`FieldValidator`]: a base variant per field
//! type plus an ordered list of naming-derived extra checks (email, url,
//! phone, age, non-negative amounts). The extra checks are best-effort
//! UX sugar and never override an explicit `required` or `options`
//! constraint.

use serde_json::{json, Value};

use crate::types::{json_type_name, FieldType, FormField, FormMetadata};

/// Machine category of a single validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueCode {
    InvalidType,
    TooSmall,
    TooBig,
    InvalidString,
    InvalidEnumValue,
    Required,
    InvalidUnion,
    Custom,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::InvalidType => "invalid_type",
            IssueCode::TooSmall => "too_small",
            IssueCode::TooBig => "too_big",
            IssueCode::InvalidString => "invalid_string",
            IssueCode::InvalidEnumValue => "invalid_enum_value",
            IssueCode::Required => "required",
            IssueCode::InvalidUnion => "invalid_union",
            IssueCode::Custom => "custom",
        }
    }

    /// Lower value means more important when summarizing per-field issues.
    pub fn priority(&self) -> u8 {
        match self {
            IssueCode::InvalidType => 0,
            IssueCode::Required => 1,
            IssueCode::InvalidString => 2,
            IssueCode::InvalidUnion => 3,
            _ => 4,
        }
    }
}

/// A single structured validation issue, before localization.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub code: IssueCode,
    /// Untranslated machine message, used as a fallback by the localizer.
    pub message: String,
}

impl Issue {
    fn new(code: IssueCode, message: impl Into<String>) -> Self {
        Issue {
            code,
            message: message.into(),
        }
    }
}

/// Base validator variant, one per field type.
#[derive(Debug, Clone, PartialEq)]
enum BaseKind {
    /// `text` and `textarea`.
    Text,
    Number,
    Date,
    Select { allowed: Vec<Value> },
    Checkbox,
}

/// Naming-derived constraint layered on top of a base variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtraCheck {
    Email,
    Url,
    Phone,
    AgeRange,
    NonNegative,
}

/// Compiled validator for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValidator {
    base: BaseKind,
    required: bool,
    extras: Vec<ExtraCheck>,
}

/// Display metadata carried alongside a compiled validator.
///
/// Kept in an explicit side table rather than smuggled through the
/// validator itself, so the localizer can interpolate labels without
/// the validator knowing about presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMeta {
    pub id: String,
    pub label: String,
    pub field_type: FieldType,
    pub required: bool,
}

/// One field of a compiled form: machine name, display metadata, validator.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledField {
    pub name: String,
    pub meta: FieldMeta,
    pub validator: FieldValidator,
}

/// The compiled form of a whole metadata document.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledValidator {
    pub fields: Vec<CompiledField>,
}

impl CompiledValidator {
    /// Build validators for every field of a well-formed document.
    ///
    /// Assumes the metadata already passed structural validation; the
    /// public compile path enforces that before calling in here.
    pub fn build(metadata: &FormMetadata) -> CompiledValidator {
        let fields = metadata
            .fields
            .iter()
            .map(|field| CompiledField {
                name: field.name.clone(),
                meta: FieldMeta {
                    id: field.id.clone(),
                    label: field.label.clone(),
                    field_type: field.field_type,
                    required: field.required,
                },
                validator: build_validator(field),
            })
            .collect();
        CompiledValidator { fields }
    }

    pub fn field(&self, name: &str) -> Option<&CompiledField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Build the primitive validator for a single field.
pub fn build_validator(field: &FormField) -> FieldValidator {
    let base = match field.field_type {
        FieldType::Text | FieldType::Textarea => BaseKind::Text,
        FieldType::Number => BaseKind::Number,
        FieldType::Date => BaseKind::Date,
        FieldType::Select => BaseKind::Select {
            allowed: field
                .options
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|o| o.value.clone())
                .collect(),
        },
        FieldType::Checkbox => BaseKind::Checkbox,
    };

    FieldValidator {
        extras: derive_extras(field, &base),
        required: field.required,
        base,
    }
}

/// Derive extra checks from the field's machine name and label.
fn derive_extras(field: &FormField, base: &BaseKind) -> Vec<ExtraCheck> {
    let haystack = format!("{} {}", field.name, field.label).to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| haystack.contains(n));

    let mut extras = Vec::new();
    match base {
        BaseKind::Text => {
            if has(&["email"]) {
                extras.push(ExtraCheck::Email);
            }
            if has(&["url", "website"]) {
                extras.push(ExtraCheck::Url);
            }
            if has(&["phone", "tel"]) {
                extras.push(ExtraCheck::Phone);
            }
        }
        BaseKind::Number => {
            if has(&["age"]) {
                extras.push(ExtraCheck::AgeRange);
            }
            if has(&["quantity", "count", "price", "amount"]) {
                extras.push(ExtraCheck::NonNegative);
            }
        }
        _ => {}
    }
    extras
}

impl FieldValidator {
    /// Validate a submitted value.
    ///
    /// `None` and JSON `null` both mean "absent". On success the returned
    /// value is the coerced, typed form; optional absent values come back
    /// as `null` (checkbox as `false`).
    pub fn validate(&self, value: Option<&Value>) -> Result<Value, Vec<Issue>> {
        let value = match value {
            Some(v) if !v.is_null() => v,
            _ => return self.validate_absent(),
        };

        match &self.base {
            BaseKind::Text => self.validate_text(value),
            BaseKind::Number => self.validate_number(value),
            BaseKind::Date => self.validate_date(value),
            BaseKind::Select { allowed } => self.validate_select(value, allowed),
            BaseKind::Checkbox => validate_checkbox(value),
        }
    }

    fn validate_absent(&self) -> Result<Value, Vec<Issue>> {
        match self.base {
            // Unchecked checkboxes are simply not submitted.
            BaseKind::Checkbox => Ok(Value::Bool(false)),
            _ if self.required => Err(vec![Issue::new(IssueCode::Required, "value is required")]),
            _ => Ok(Value::Null),
        }
    }

    fn validate_text(&self, value: &Value) -> Result<Value, Vec<Issue>> {
        let Value::String(s) = value else {
            return Err(vec![Issue::new(
                IssueCode::InvalidType,
                format!("expected string, got {}", json_type_name(value)),
            )]);
        };

        if s.trim().is_empty() {
            return if self.required {
                Err(vec![Issue::new(IssueCode::Required, "must not be empty")])
            } else {
                Ok(Value::Null)
            };
        }

        let issues: Vec<Issue> = self
            .extras
            .iter()
            .filter_map(|check| check_string(*check, s))
            .collect();
        if issues.is_empty() {
            Ok(Value::String(s.clone()))
        } else {
            Err(issues)
        }
    }

    fn validate_number(&self, value: &Value) -> Result<Value, Vec<Issue>> {
        let (n, coerced) = match value {
            Value::Number(n) => match n.as_f64() {
                Some(f) => (f, value.clone()),
                None => {
                    return Err(vec![Issue::new(
                        IssueCode::InvalidType,
                        "number out of range",
                    )])
                }
            },
            // HTML-like inputs submit numbers as strings; coerce them.
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return self.validate_absent();
                }
                match parse_number(trimmed) {
                    Some(pair) => pair,
                    None => {
                        return Err(vec![Issue::new(
                            IssueCode::InvalidType,
                            format!("expected number, got non-numeric string \"{}\"", s),
                        )])
                    }
                }
            }
            other => {
                return Err(vec![Issue::new(
                    IssueCode::InvalidType,
                    format!("expected number, got {}", json_type_name(other)),
                )])
            }
        };

        let issues: Vec<Issue> = self
            .extras
            .iter()
            .filter_map(|check| check_number(*check, n))
            .collect();
        if issues.is_empty() {
            Ok(coerced)
        } else {
            Err(issues)
        }
    }

    fn validate_date(&self, value: &Value) -> Result<Value, Vec<Issue>> {
        let Value::String(s) = value else {
            return Err(vec![Issue::new(
                IssueCode::InvalidType,
                format!("expected date string, got {}", json_type_name(value)),
            )]);
        };

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return self.validate_absent();
        }
        if is_date_like(trimmed) {
            Ok(Value::String(trimmed.to_string()))
        } else {
            Err(vec![Issue::new(
                IssueCode::InvalidString,
                format!("\"{}\" is not a valid date", s),
            )])
        }
    }

    fn validate_select(&self, value: &Value, allowed: &[Value]) -> Result<Value, Vec<Issue>> {
        if let Value::String(s) = value {
            if s.is_empty() {
                return self.validate_absent();
            }
        }

        if allowed.contains(value) {
            Ok(value.clone())
        } else {
            let choices: Vec<String> = allowed.iter().map(value_display).collect();
            Err(vec![Issue::new(
                IssueCode::InvalidEnumValue,
                format!("must be one of: {}", choices.join(", ")),
            )])
        }
    }
}

fn validate_checkbox(value: &Value) -> Result<Value, Vec<Issue>> {
    match coerce_bool(value) {
        Some(b) => Ok(Value::Bool(b)),
        None => Err(vec![Issue::new(
            IssueCode::InvalidType,
            format!("cannot interpret {} as a boolean", value_display(value)),
        )]),
    }
}

/// Smart boolean coercion for checkbox values.
///
/// Booleans pass through. Numbers map exactly `1` to true and everything
/// else to false. Strings are matched case-insensitively against a fixed
/// vocabulary; anything outside it returns `None` and the caller rejects
/// the value instead of defaulting it.
pub fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(n.as_f64() == Some(1.0)),
        Value::String(s) => match s.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" | "y" => Some(true),
            "false" | "0" | "no" | "off" | "n" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn check_string(check: ExtraCheck, s: &str) -> Option<Issue> {
    match check {
        ExtraCheck::Email if !is_email(s) => Some(Issue::new(
            IssueCode::InvalidString,
            "must be a valid email address",
        )),
        ExtraCheck::Url if !is_url(s) => {
            Some(Issue::new(IssueCode::InvalidString, "must be a valid URL"))
        }
        ExtraCheck::Phone if !is_phone(s) => Some(Issue::new(
            IssueCode::InvalidString,
            "must be a valid phone number",
        )),
        _ => None,
    }
}

fn check_number(check: ExtraCheck, n: f64) -> Option<Issue> {
    match check {
        ExtraCheck::AgeRange if n < 0.0 => {
            Some(Issue::new(IssueCode::TooSmall, "must be at least 0"))
        }
        ExtraCheck::AgeRange if n > 150.0 => {
            Some(Issue::new(IssueCode::TooBig, "must be at most 150"))
        }
        ExtraCheck::NonNegative if n < 0.0 => {
            Some(Issue::new(IssueCode::TooSmall, "must not be negative"))
        }
        _ => None,
    }
}

fn parse_number(s: &str) -> Option<(f64, Value)> {
    if let Ok(i) = s.parse::<i64>() {
        return Some((i as f64, json!(i)));
    }
    let f = s.parse::<f64>().ok().filter(|f| f.is_finite())?;
    Some((f, json!(f)))
}

fn is_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !s.contains(char::is_whitespace)
}

fn is_url(s: &str) -> bool {
    let rest = s
        .strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"));
    matches!(rest, Some(r) if !r.is_empty() && !r.contains(char::is_whitespace))
}

/// Permissive: digits plus common separators, at least three digits.
fn is_phone(s: &str) -> bool {
    let valid_chars = s
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | '.' | ' '));
    valid_chars && s.chars().filter(char::is_ascii_digit).count() >= 3
}

/// Structural check for `YYYY-MM-DD` with an optional `THH:MM[:SS][Z]`
/// suffix. Calendar-exact day counts are not enforced.
fn is_date_like(s: &str) -> bool {
    let b = s.as_bytes();
    if b.len() < 10 {
        return false;
    }
    let all_digits = |r: &[u8]| r.iter().all(u8::is_ascii_digit);
    if !(all_digits(&b[0..4])
        && b[4] == b'-'
        && all_digits(&b[5..7])
        && b[7] == b'-'
        && all_digits(&b[8..10]))
    {
        return false;
    }
    let month: u32 = s[5..7].parse().unwrap_or(0);
    let day: u32 = s[8..10].parse().unwrap_or(0);
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return false;
    }
    if b.len() == 10 {
        return true;
    }
    if b[10] != b'T' && b[10] != b' ' {
        return false;
    }
    let time = s[11..].strip_suffix('Z').unwrap_or(&s[11..]);
    let tb = time.as_bytes();
    match tb.len() {
        5 => all_digits(&tb[0..2]) && tb[2] == b':' && all_digits(&tb[3..5]),
        8 => {
            all_digits(&tb[0..2])
                && tb[2] == b':'
                && all_digits(&tb[3..5])
                && tb[5] == b':'
                && all_digits(&tb[6..8])
        }
        _ => false,
    }
}

fn value_display(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        other => other.to_string(),
    }
}

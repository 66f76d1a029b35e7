//! Error localization - maps machine issue categories to human messages.
//!
//! Supports `zh-CN` and `en-US`; unknown locales fall back to `zh-CN`
//! with a warning. When the field's display label is known, messages
//! interpolate it, otherwise a generic template is used.

use tracing::warn;

use crate::schema::{FieldMeta, Issue, IssueCode};
use crate::types::ValidationError;

/// Supported message locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    ZhCn,
    EnUs,
}

impl Locale {
    /// Parse a locale tag. Returns `None` for unsupported tags.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "zh-CN" | "zh_CN" | "zh" => Some(Locale::ZhCn),
            "en-US" | "en_US" | "en" => Some(Locale::EnUs),
            _ => None,
        }
    }

    /// Parse a locale tag, falling back to the default with a warning.
    pub fn parse_or_default(s: &str) -> Self {
        Locale::parse(s).unwrap_or_else(|| {
            warn!(locale = %s, "unknown locale, falling back to zh-CN");
            Locale::default()
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::ZhCn => "zh-CN",
            Locale::EnUs => "en-US",
        }
    }
}

/// Render a localized message for one issue.
///
/// Prefers a field-label-interpolated template when the label is known
/// and non-empty; `Custom` issues fall back to their machine message.
pub fn localize(issue: &Issue, meta: Option<&FieldMeta>, locale: Locale) -> String {
    if issue.code == IssueCode::Custom {
        return issue.message.clone();
    }

    let label = meta.map(|m| m.label.as_str()).filter(|l| !l.is_empty());
    match locale {
        Locale::ZhCn => zh_cn_message(issue.code, label),
        Locale::EnUs => en_us_message(issue.code, label),
    }
}

fn zh_cn_message(code: IssueCode, label: Option<&str>) -> String {
    match (code, label) {
        (IssueCode::InvalidType, Some(l)) => format!("{}的格式不正确", l),
        (IssueCode::InvalidType, None) => "字段格式不正确".to_string(),
        (IssueCode::Required, Some(l)) => format!("{}为必填项", l),
        (IssueCode::Required, None) => "此字段为必填项".to_string(),
        (IssueCode::TooSmall, Some(l)) => format!("{}的值过小", l),
        (IssueCode::TooSmall, None) => "数值过小".to_string(),
        (IssueCode::TooBig, Some(l)) => format!("{}的值过大", l),
        (IssueCode::TooBig, None) => "数值过大".to_string(),
        (IssueCode::InvalidString, Some(l)) => format!("{}格式无效", l),
        (IssueCode::InvalidString, None) => "字符串格式无效".to_string(),
        (IssueCode::InvalidEnumValue, Some(l)) => format!("{}的值不在可选范围内", l),
        (IssueCode::InvalidEnumValue, None) => "值不在可选范围内".to_string(),
        (IssueCode::InvalidUnion, Some(l)) => format!("{}不匹配任何允许的类型", l),
        (IssueCode::InvalidUnion, None) => "不匹配任何允许的类型".to_string(),
        // Custom issues short-circuit in localize; keep a safe fallback.
        (IssueCode::Custom, Some(l)) => format!("{}无效", l),
        (IssueCode::Custom, None) => "字段无效".to_string(),
    }
}

fn en_us_message(code: IssueCode, label: Option<&str>) -> String {
    match (code, label) {
        (IssueCode::InvalidType, Some(l)) => format!("{} has an invalid type", l),
        (IssueCode::InvalidType, None) => "Invalid field type".to_string(),
        (IssueCode::Required, Some(l)) => format!("{} is required", l),
        (IssueCode::Required, None) => "This field is required".to_string(),
        (IssueCode::TooSmall, Some(l)) => format!("{} is too small", l),
        (IssueCode::TooSmall, None) => "Value is too small".to_string(),
        (IssueCode::TooBig, Some(l)) => format!("{} is too large", l),
        (IssueCode::TooBig, None) => "Value is too large".to_string(),
        (IssueCode::InvalidString, Some(l)) => format!("{} has an invalid format", l),
        (IssueCode::InvalidString, None) => "Invalid string format".to_string(),
        (IssueCode::InvalidEnumValue, Some(l)) => format!("{} is not an allowed option", l),
        (IssueCode::InvalidEnumValue, None) => "Value is not an allowed option".to_string(),
        (IssueCode::InvalidUnion, Some(l)) => format!("{} matches no allowed shape", l),
        (IssueCode::InvalidUnion, None) => "Value matches no allowed shape".to_string(),
        // Custom issues short-circuit in localize; keep a safe fallback.
        (IssueCode::Custom, Some(l)) => format!("{} is invalid", l),
        (IssueCode::Custom, None) => "Invalid field".to_string(),
    }
}

/// Collapse a flat error list to one summary error per field.
///
/// Priority order: `invalid_type` > `required` > `invalid_string` >
/// `invalid_union` > everything else; ties keep the earliest error.
/// Field order follows first appearance in the input.
pub fn most_important_errors(errors: &[ValidationError]) -> Vec<ValidationError> {
    let mut order: Vec<&str> = Vec::new();
    for err in errors {
        if !order.contains(&err.field.as_str()) {
            order.push(&err.field);
        }
    }

    order
        .into_iter()
        .filter_map(|field| {
            errors
                .iter()
                .filter(|e| e.field == field)
                .min_by_key(|e| code_priority(e.code.as_deref()))
                .cloned()
        })
        .collect()
}

fn code_priority(code: Option<&str>) -> u8 {
    match code {
        Some("invalid_type") => 0,
        Some("required") => 1,
        Some("invalid_string") => 2,
        Some("invalid_union") => 3,
        _ => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldType;

    fn issue(code: IssueCode) -> Issue {
        Issue {
            code,
            message: "machine message".into(),
        }
    }

    fn meta(label: &str) -> FieldMeta {
        FieldMeta {
            id: "f1".into(),
            label: label.into(),
            field_type: FieldType::Text,
            required: true,
        }
    }

    fn error(field: &str, code: &str) -> ValidationError {
        ValidationError {
            field: field.into(),
            message: code.into(),
            code: Some(code.into()),
        }
    }

    #[test]
    fn locale_parse() {
        assert_eq!(Locale::parse("zh-CN"), Some(Locale::ZhCn));
        assert_eq!(Locale::parse("en-US"), Some(Locale::EnUs));
        assert_eq!(Locale::parse("en"), Some(Locale::EnUs));
        assert_eq!(Locale::parse("fr-FR"), None);
    }

    #[test]
    fn unknown_locale_falls_back_to_default() {
        assert_eq!(Locale::parse_or_default("fr-FR"), Locale::ZhCn);
        assert_eq!(Locale::parse_or_default("en-US"), Locale::EnUs);
    }

    #[test]
    fn label_interpolation_preferred_over_generic() {
        let m = meta("Email");
        let msg = localize(&issue(IssueCode::Required), Some(&m), Locale::EnUs);
        assert_eq!(msg, "Email is required");

        let msg = localize(&issue(IssueCode::Required), None, Locale::EnUs);
        assert_eq!(msg, "This field is required");
    }

    #[test]
    fn empty_label_uses_generic_template() {
        let m = meta("");
        let msg = localize(&issue(IssueCode::InvalidString), Some(&m), Locale::EnUs);
        assert_eq!(msg, "Invalid string format");
    }

    #[test]
    fn zh_cn_templates() {
        let m = meta("邮箱");
        let msg = localize(&issue(IssueCode::Required), Some(&m), Locale::ZhCn);
        assert_eq!(msg, "邮箱为必填项");

        let msg = localize(&issue(IssueCode::InvalidEnumValue), None, Locale::ZhCn);
        assert_eq!(msg, "值不在可选范围内");
    }

    #[test]
    fn custom_issue_keeps_machine_message() {
        let msg = localize(&issue(IssueCode::Custom), Some(&meta("X")), Locale::EnUs);
        assert_eq!(msg, "machine message");
    }

    #[test]
    fn summary_picks_highest_priority_per_field() {
        let errors = vec![
            error("email", "invalid_string"),
            error("email", "invalid_type"),
            error("name", "required"),
        ];
        let summary = most_important_errors(&errors);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].field, "email");
        assert_eq!(summary[0].code.as_deref(), Some("invalid_type"));
        assert_eq!(summary[1].field, "name");
    }

    #[test]
    fn summary_preserves_first_appearance_order() {
        let errors = vec![
            error("b", "too_small"),
            error("a", "required"),
            error("b", "required"),
        ];
        let summary = most_important_errors(&errors);
        assert_eq!(summary[0].field, "b");
        assert_eq!(summary[0].code.as_deref(), Some("required"));
        assert_eq!(summary[1].field, "a");
    }
}

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::forms::models::{ElementKind, ElementType, FieldErrors, FormElement, ValueBag};

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

/// A value counts as empty when it is missing, null, blank, an empty list,
/// or an unchecked box.
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Bool(checked)) => !checked,
        Some(Value::Object(map)) => map.is_empty(),
        Some(Value::Number(_)) => false,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Whether a choice value only names listed options. A bare boolean is the
/// single-box form of a checkbox.
fn within_options(element_type: ElementType, options: &[String], value: &Value) -> bool {
    let listed = |v: &Value| v.as_str().is_some_and(|s| options.iter().any(|o| o == s));
    match value {
        Value::Array(items) => {
            matches!(element_type, ElementType::MultiSelect | ElementType::Checkbox)
                && items.iter().all(listed)
        }
        Value::Bool(_) => element_type == ElementType::Checkbox,
        other => listed(other),
    }
}

/// Validates one element against its value. Rules run in order (required,
/// length, numeric bounds, rating and option membership, email format,
/// custom pattern) and the first failure is returned.
pub fn validate_field(element: &FormElement, value: Option<&Value>) -> Option<String> {
    let element_type = element.element_type();
    if element_type.is_display_only() {
        return None;
    }

    let label = element.display_label();

    if is_empty_value(value) {
        return element.required.then(|| format!("{label} is required"));
    }
    let value = value?;

    let rules = element.validation.clone().unwrap_or_default();
    let fail = |default: String| Some(rules.message.clone().unwrap_or(default));

    let text = text_of(value);

    if let Some(text) = text.as_deref() {
        let len = text.chars().count();
        if let Some(min) = rules.min_length {
            if len < min {
                return fail(format!("{label} must be at least {min} characters"));
            }
        }
        if let Some(max) = rules.max_length {
            if len > max {
                return fail(format!("{label} must be at most {max} characters"));
            }
        }
    }

    if matches!(element_type, ElementType::Number | ElementType::Range) {
        let Some(n) = as_number(value) else {
            return fail(format!("{label} must be a number"));
        };
        if let Some(min) = rules.min {
            if n < min {
                return fail(format!("{label} must be at least {min}"));
            }
        }
        if let Some(max) = rules.max {
            if n > max {
                return fail(format!("{label} must be at most {max}"));
            }
        }
    }

    if let ElementKind::Rating { max_stars } = element.kind {
        let lowest = if element.required { 1 } else { 0 };
        let stars = value.as_u64().filter(|n| (lowest..=u64::from(max_stars)).contains(n));
        if stars.is_none() {
            return fail(format!("{label} must be between {lowest} and {max_stars} stars"));
        }
    }

    let options = element.options();
    if element_type.is_choice()
        && !options.is_empty()
        && !within_options(element_type, options, value)
    {
        return fail(format!("{label} must be one of the listed options"));
    }

    if element_type == ElementType::Email {
        let valid = text.as_deref().is_some_and(|t| email_regex().is_match(t.trim()));
        if !valid {
            return fail("Please enter a valid email address".to_string());
        }
    }

    if let (Some(pattern), Some(text)) = (rules.pattern.as_deref(), text.as_deref()) {
        match Regex::new(pattern) {
            Ok(re) if !re.is_match(text) => {
                return fail(format!("{label} has an invalid format"));
            }
            Ok(_) => {}
            Err(e) => warn!(element_id = %element.id, "skipping invalid pattern: {e}"),
        }
    }

    None
}

/// Validates every given element, collecting the first error of each field.
pub fn validate_elements<'a, I>(elements: I, values: &ValueBag) -> FieldErrors
where
    I: IntoIterator<Item = &'a FormElement>,
{
    elements
        .into_iter()
        .filter_map(|element| {
            validate_field(element, values.get(&element.id)).map(|msg| (element.id, msg))
        })
        .collect()
}

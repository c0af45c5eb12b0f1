//! Element Renderer — maps a descriptor and its current value to a control
//! view model. Pure: the only state is what the caller passes in.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::forms::models::{ElementKind, FormDefinition, FormElement, ValueBag};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum Control {
    TextInput {
        input_type: &'static str,
        placeholder: String,
        value: String,
    },
    TextArea {
        placeholder: String,
        rows: u8,
        value: String,
    },
    Select {
        placeholder: String,
        options: Vec<String>,
        selected: Option<String>,
    },
    MultiSelect {
        options: Vec<String>,
        selected: Vec<String>,
    },
    Toggle {
        checked: bool,
    },
    CheckboxGroup {
        options: Vec<String>,
        checked: Vec<String>,
    },
    RadioGroup {
        options: Vec<String>,
        selected: Option<String>,
    },
    StarRating {
        max_stars: u8,
        value: u8,
    },
    Slider {
        min: f64,
        max: f64,
        step: f64,
        value: f64,
    },
    DatePicker {
        value: Option<String>,
        /// Human-readable form of `value`, e.g. "October 19, 2026".
        display: Option<String>,
    },
    TimePicker {
        value: Option<String>,
    },
    FileUpload {
        accept: String,
        multiple: bool,
        max_size_mb: u32,
    },
    SignaturePad {
        signed: bool,
    },
    PaymentField {
        currency: String,
        amount: Option<f64>,
    },
    CaptchaPlaceholder,
    Heading {
        level: u8,
        text: String,
    },
    Paragraph {
        text: String,
    },
    Divider,
    Layout {
        columns: u8,
    },
    SubmitButton {
        text: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderedElement {
    pub id: Uuid,
    pub label: String,
    pub required: bool,
    #[serde(flatten)]
    pub control: Control,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RenderedElement>,
}

fn string_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn selected_option(options: &[String], value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| options.iter().any(|o| o == s))
        .map(str::to_string)
}

fn format_date(value: Option<&Value>) -> (Option<String>, Option<String>) {
    let raw = value.and_then(Value::as_str).filter(|s| !s.is_empty());
    let display = raw
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .map(|d| d.format("%B %-d, %Y").to_string());
    (raw.map(str::to_string), display)
}

pub fn render_control(element: &FormElement, value: Option<&Value>) -> Control {
    let placeholder = element.display_placeholder().to_string();
    match &element.kind {
        ElementKind::Text => text_input("text", placeholder, value),
        ElementKind::Email => text_input("email", placeholder, value),
        ElementKind::Tel => text_input("tel", placeholder, value),
        ElementKind::Password => text_input("password", placeholder, value),
        ElementKind::Url => text_input("url", placeholder, value),
        ElementKind::Number => text_input("number", placeholder, value),
        ElementKind::Textarea { rows } => Control::TextArea {
            placeholder,
            rows: *rows,
            value: string_value(value),
        },
        ElementKind::Select { options } => Control::Select {
            placeholder,
            options: options.clone(),
            selected: selected_option(options, value),
        },
        ElementKind::MultiSelect { options } => Control::MultiSelect {
            options: options.clone(),
            selected: string_list(value),
        },
        ElementKind::Checkbox { options } if options.is_empty() => Control::Toggle {
            checked: value.and_then(Value::as_bool).unwrap_or(false),
        },
        ElementKind::Checkbox { options } => Control::CheckboxGroup {
            options: options.clone(),
            checked: string_list(value),
        },
        ElementKind::Radio { options } => Control::RadioGroup {
            options: options.clone(),
            selected: selected_option(options, value),
        },
        ElementKind::Rating { max_stars } => Control::StarRating {
            max_stars: *max_stars,
            value: value
                .and_then(Value::as_u64)
                .map(|v| v.min(u64::from(*max_stars)) as u8)
                .unwrap_or(0),
        },
        ElementKind::Range { min, max, step } => Control::Slider {
            min: *min,
            max: *max,
            step: *step,
            value: value
                .and_then(Value::as_f64)
                .map(|v| v.clamp(*min, *max))
                .unwrap_or(*min),
        },
        ElementKind::Date => {
            let (value, display) = format_date(value);
            Control::DatePicker { value, display }
        }
        ElementKind::Time => Control::TimePicker {
            value: value.and_then(Value::as_str).map(str::to_string),
        },
        ElementKind::File {
            accept,
            multiple,
            max_size_mb,
        } => Control::FileUpload {
            accept: accept.clone(),
            multiple: *multiple,
            max_size_mb: *max_size_mb,
        },
        ElementKind::Signature => Control::SignaturePad {
            signed: !string_value(value).is_empty(),
        },
        ElementKind::Payment { currency, amount } => Control::PaymentField {
            currency: currency.clone(),
            amount: *amount,
        },
        ElementKind::Captcha => Control::CaptchaPlaceholder,
        ElementKind::Heading { level } => Control::Heading {
            level: (*level).clamp(1, 6),
            text: element.display_label().to_string(),
        },
        ElementKind::Paragraph { text } => Control::Paragraph { text: text.clone() },
        ElementKind::Divider => Control::Divider,
        ElementKind::Container => Control::Layout { columns: 1 },
        ElementKind::ColumnLayout { columns } => Control::Layout {
            columns: (*columns).max(1),
        },
        ElementKind::Submit => Control::SubmitButton {
            text: element.display_label().to_string(),
        },
    }
}

fn text_input(input_type: &'static str, placeholder: String, value: Option<&Value>) -> Control {
    Control::TextInput {
        input_type,
        placeholder,
        value: string_value(value),
    }
}

fn render_element(element: &FormElement, values: &ValueBag) -> RenderedElement {
    RenderedElement {
        id: element.id,
        label: element.display_label().to_string(),
        required: element.required,
        control: render_control(element, values.get(&element.id)),
        children: Vec::new(),
    }
}

/// Renders a whole form in list order. Nested elements appear under their
/// layout parent; an element whose parent is missing renders at top level.
/// A submit button is appended when the form has none.
pub fn render_form(form: &FormDefinition, values: &ValueBag) -> Vec<RenderedElement> {
    let is_parent = |id: Uuid| {
        form.element(id)
            .is_some_and(|p| p.element_type().is_layout())
    };

    let mut rendered: Vec<RenderedElement> = Vec::new();
    for element in &form.elements {
        match element.container_id {
            Some(parent) if is_parent(parent) => {}
            _ => {
                let mut node = render_element(element, values);
                if element.element_type().is_layout() {
                    node.children = form
                        .elements
                        .iter()
                        .filter(|c| c.container_id == Some(element.id))
                        .map(|c| render_element(c, values))
                        .collect();
                }
                rendered.push(node);
            }
        }
    }

    let has_submit = form
        .elements
        .iter()
        .any(|e| matches!(e.kind, ElementKind::Submit));
    if !has_submit {
        rendered.push(RenderedElement {
            id: Uuid::nil(),
            label: form.settings.submit_button_text.clone(),
            required: false,
            control: Control::SubmitButton {
                text: form.settings.submit_button_text.clone(),
            },
            children: Vec::new(),
        });
    }
    rendered
}

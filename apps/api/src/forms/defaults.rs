//! Default values synthesized for newly dropped elements.
//!
//! Every function here is total over `ElementType`. The `*_for_tag` variants
//! accept the raw palette tag and degrade to a generic field for unknown tags.

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::forms::models::{ElementKind, ElementType, FormElement};

const GENERIC_LABEL: &str = "Form Field";
const GENERIC_PLACEHOLDER: &str = "Enter value";

pub fn label_for(element_type: ElementType) -> &'static str {
    match element_type {
        ElementType::Text => "Text Field",
        ElementType::Textarea => "Text Area",
        ElementType::Email => "Email Address",
        ElementType::Tel => "Phone Number",
        ElementType::Password => "Password",
        ElementType::Url => "Website",
        ElementType::Number => "Number",
        ElementType::Date => "Date",
        ElementType::Time => "Time",
        ElementType::Select => "Dropdown",
        ElementType::MultiSelect => "Multi Select",
        ElementType::Checkbox => "Checkboxes",
        ElementType::Radio => "Multiple Choice",
        ElementType::Rating => "Rating",
        ElementType::Range => "Range Slider",
        ElementType::File => "File Upload",
        ElementType::Signature => "Signature",
        ElementType::Payment => "Payment",
        ElementType::Captcha => "Captcha",
        ElementType::Heading => "Heading",
        ElementType::Paragraph => "Paragraph",
        ElementType::Divider => "Divider",
        ElementType::Container => "Container",
        ElementType::ColumnLayout => "Column Layout",
        ElementType::Submit => "Submit",
    }
}

pub fn placeholder_for(element_type: ElementType) -> &'static str {
    match element_type {
        ElementType::Text => "Enter text",
        ElementType::Textarea => "Enter your message",
        ElementType::Email => "you@example.com",
        ElementType::Tel => "+1 (555) 000-0000",
        ElementType::Password => "Enter password",
        ElementType::Url => "https://",
        ElementType::Number => "0",
        ElementType::Date => "Select a date",
        ElementType::Time => "Select a time",
        ElementType::Select => "Choose an option",
        ElementType::MultiSelect => "Choose one or more options",
        ElementType::Checkbox => "Select all that apply",
        ElementType::Radio => "Select one",
        ElementType::Rating => "Rate from 1 to 5",
        ElementType::Range => "Drag to select a value",
        ElementType::File => "Drop files here or click to upload",
        ElementType::Signature => "Sign here",
        ElementType::Payment => "Card details",
        ElementType::Captcha => "Verify you are human",
        ElementType::Heading => "Section heading",
        ElementType::Paragraph => "Add descriptive text",
        ElementType::Divider => "Section divider",
        ElementType::Container => "Drop elements here",
        ElementType::ColumnLayout => "Drop elements into columns",
        ElementType::Submit => "Submit",
    }
}

pub fn options_for(element_type: ElementType) -> Vec<String> {
    if element_type.is_choice() {
        vec![
            "Option 1".to_string(),
            "Option 2".to_string(),
            "Option 3".to_string(),
        ]
    } else {
        Vec::new()
    }
}

/// The typed settings object for a type, with defaults filled in.
pub fn kind_for(element_type: ElementType) -> ElementKind {
    let options = options_for(element_type);
    match element_type {
        ElementType::Text => ElementKind::Text,
        ElementType::Textarea => ElementKind::Textarea { rows: 4 },
        ElementType::Email => ElementKind::Email,
        ElementType::Tel => ElementKind::Tel,
        ElementType::Password => ElementKind::Password,
        ElementType::Url => ElementKind::Url,
        ElementType::Number => ElementKind::Number,
        ElementType::Date => ElementKind::Date,
        ElementType::Time => ElementKind::Time,
        ElementType::Select => ElementKind::Select { options },
        ElementType::MultiSelect => ElementKind::MultiSelect { options },
        ElementType::Checkbox => ElementKind::Checkbox { options },
        ElementType::Radio => ElementKind::Radio { options },
        ElementType::Rating => ElementKind::Rating { max_stars: 5 },
        ElementType::Range => ElementKind::Range {
            min: 0.0,
            max: 100.0,
            step: 1.0,
        },
        ElementType::File => ElementKind::File {
            accept: "image/*,.pdf,.doc,.docx".to_string(),
            multiple: false,
            max_size_mb: 10,
        },
        ElementType::Signature => ElementKind::Signature,
        ElementType::Payment => ElementKind::Payment {
            currency: "USD".to_string(),
            amount: None,
        },
        ElementType::Captcha => ElementKind::Captcha,
        ElementType::Heading => ElementKind::Heading { level: 2 },
        ElementType::Paragraph => ElementKind::Paragraph {
            text: "Add your paragraph text here.".to_string(),
        },
        ElementType::Divider => ElementKind::Divider,
        ElementType::Container => ElementKind::Container,
        ElementType::ColumnLayout => ElementKind::ColumnLayout { columns: 2 },
        ElementType::Submit => ElementKind::Submit,
    }
}

/// Settings bag of a type without the tag and option list.
pub fn settings_for(element_type: ElementType) -> Value {
    match serde_json::to_value(kind_for(element_type)) {
        Ok(Value::Object(mut map)) => {
            map.remove("type");
            map.remove("options");
            Value::Object(map)
        }
        _ => Value::Object(Map::new()),
    }
}

pub fn label_for_tag(tag: &str) -> &'static str {
    tag.parse::<ElementType>().map(label_for).unwrap_or(GENERIC_LABEL)
}

pub fn placeholder_for_tag(tag: &str) -> &'static str {
    tag.parse::<ElementType>().map(placeholder_for).unwrap_or(GENERIC_PLACEHOLDER)
}

pub fn options_for_tag(tag: &str) -> Vec<String> {
    tag.parse::<ElementType>().map(options_for).unwrap_or_default()
}

pub fn settings_for_tag(tag: &str) -> Value {
    tag.parse::<ElementType>()
        .map(settings_for)
        .unwrap_or_else(|_| Value::Object(Map::new()))
}

/// A fresh element of the given type with every default applied.
pub fn synthesize(element_type: ElementType) -> FormElement {
    FormElement {
        id: Uuid::new_v4(),
        kind: kind_for(element_type),
        label: label_for(element_type).to_string(),
        placeholder: placeholder_for(element_type).to_string(),
        required: false,
        validation: None,
        container_id: None,
    }
}

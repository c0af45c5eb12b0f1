use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Values entered in a form, keyed by element id.
pub type ValueBag = BTreeMap<Uuid, serde_json::Value>;

/// First validation failure per element id.
pub type FieldErrors = BTreeMap<Uuid, String>;

// ────────────────────────────────────────────────────────────────────────────
// Element types
// ────────────────────────────────────────────────────────────────────────────

/// Fieldless tag of an element, as dropped from the builder palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementType {
    Text,
    Textarea,
    Email,
    Tel,
    Password,
    Url,
    Number,
    Date,
    Time,
    Select,
    MultiSelect,
    Checkbox,
    Radio,
    Rating,
    Range,
    File,
    Signature,
    Payment,
    Captcha,
    Heading,
    Paragraph,
    Divider,
    Container,
    ColumnLayout,
    Submit,
}

impl ElementType {
    pub const ALL: [ElementType; 25] = [
        ElementType::Text,
        ElementType::Textarea,
        ElementType::Email,
        ElementType::Tel,
        ElementType::Password,
        ElementType::Url,
        ElementType::Number,
        ElementType::Date,
        ElementType::Time,
        ElementType::Select,
        ElementType::MultiSelect,
        ElementType::Checkbox,
        ElementType::Radio,
        ElementType::Rating,
        ElementType::Range,
        ElementType::File,
        ElementType::Signature,
        ElementType::Payment,
        ElementType::Captcha,
        ElementType::Heading,
        ElementType::Paragraph,
        ElementType::Divider,
        ElementType::Container,
        ElementType::ColumnLayout,
        ElementType::Submit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Text => "text",
            ElementType::Textarea => "textarea",
            ElementType::Email => "email",
            ElementType::Tel => "tel",
            ElementType::Password => "password",
            ElementType::Url => "url",
            ElementType::Number => "number",
            ElementType::Date => "date",
            ElementType::Time => "time",
            ElementType::Select => "select",
            ElementType::MultiSelect => "multi-select",
            ElementType::Checkbox => "checkbox",
            ElementType::Radio => "radio",
            ElementType::Rating => "rating",
            ElementType::Range => "range",
            ElementType::File => "file",
            ElementType::Signature => "signature",
            ElementType::Payment => "payment",
            ElementType::Captcha => "captcha",
            ElementType::Heading => "heading",
            ElementType::Paragraph => "paragraph",
            ElementType::Divider => "divider",
            ElementType::Container => "container",
            ElementType::ColumnLayout => "column-layout",
            ElementType::Submit => "submit",
        }
    }

    /// Choice elements carry an option list.
    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            ElementType::Select
                | ElementType::MultiSelect
                | ElementType::Checkbox
                | ElementType::Radio
        )
    }

    /// Layout elements may parent one level of nested elements.
    pub fn is_layout(&self) -> bool {
        matches!(self, ElementType::Container | ElementType::ColumnLayout)
    }

    /// Display-only elements never hold a value and never fail validation.
    pub fn is_display_only(&self) -> bool {
        matches!(
            self,
            ElementType::Heading
                | ElementType::Paragraph
                | ElementType::Divider
                | ElementType::Container
                | ElementType::ColumnLayout
                | ElementType::Submit
                | ElementType::Captcha
        )
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown element type '{0}'")]
pub struct UnknownElementType(pub String);

impl FromStr for ElementType {
    type Err = UnknownElementType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ElementType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownElementType(s.to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Element kind: per-type configuration
// ────────────────────────────────────────────────────────────────────────────

fn default_rows() -> u8 {
    4
}

fn default_max_stars() -> u8 {
    5
}

fn default_range_max() -> f64 {
    100.0
}

fn default_step() -> f64 {
    1.0
}

fn default_max_size_mb() -> u32 {
    10
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_heading_level() -> u8 {
    2
}

fn default_columns() -> u8 {
    2
}

/// Element variant together with its type-specific settings.
/// Absent settings deserialize to the type default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ElementKind {
    Text,
    Textarea {
        #[serde(default = "default_rows")]
        rows: u8,
    },
    Email,
    Tel,
    Password,
    Url,
    Number,
    Date,
    Time,
    Select {
        #[serde(default)]
        options: Vec<String>,
    },
    MultiSelect {
        #[serde(default)]
        options: Vec<String>,
    },
    /// With no options this is a single yes/no checkbox.
    Checkbox {
        #[serde(default)]
        options: Vec<String>,
    },
    Radio {
        #[serde(default)]
        options: Vec<String>,
    },
    Rating {
        #[serde(default = "default_max_stars")]
        max_stars: u8,
    },
    Range {
        #[serde(default)]
        min: f64,
        #[serde(default = "default_range_max")]
        max: f64,
        #[serde(default = "default_step")]
        step: f64,
    },
    File {
        #[serde(default)]
        accept: String,
        #[serde(default)]
        multiple: bool,
        #[serde(default = "default_max_size_mb")]
        max_size_mb: u32,
    },
    Signature,
    Payment {
        #[serde(default = "default_currency")]
        currency: String,
        #[serde(default)]
        amount: Option<f64>,
    },
    Captcha,
    Heading {
        #[serde(default = "default_heading_level")]
        level: u8,
    },
    Paragraph {
        #[serde(default)]
        text: String,
    },
    Divider,
    Container,
    ColumnLayout {
        #[serde(default = "default_columns")]
        columns: u8,
    },
    Submit,
}

impl ElementKind {
    pub fn element_type(&self) -> ElementType {
        match self {
            ElementKind::Text => ElementType::Text,
            ElementKind::Textarea { .. } => ElementType::Textarea,
            ElementKind::Email => ElementType::Email,
            ElementKind::Tel => ElementType::Tel,
            ElementKind::Password => ElementType::Password,
            ElementKind::Url => ElementType::Url,
            ElementKind::Number => ElementType::Number,
            ElementKind::Date => ElementType::Date,
            ElementKind::Time => ElementType::Time,
            ElementKind::Select { .. } => ElementType::Select,
            ElementKind::MultiSelect { .. } => ElementType::MultiSelect,
            ElementKind::Checkbox { .. } => ElementType::Checkbox,
            ElementKind::Radio { .. } => ElementType::Radio,
            ElementKind::Rating { .. } => ElementType::Rating,
            ElementKind::Range { .. } => ElementType::Range,
            ElementKind::File { .. } => ElementType::File,
            ElementKind::Signature => ElementType::Signature,
            ElementKind::Payment { .. } => ElementType::Payment,
            ElementKind::Captcha => ElementType::Captcha,
            ElementKind::Heading { .. } => ElementType::Heading,
            ElementKind::Paragraph { .. } => ElementType::Paragraph,
            ElementKind::Divider => ElementType::Divider,
            ElementKind::Container => ElementType::Container,
            ElementKind::ColumnLayout { .. } => ElementType::ColumnLayout,
            ElementKind::Submit => ElementType::Submit,
        }
    }

    /// Option list of a choice element; empty for every other kind.
    pub fn options(&self) -> &[String] {
        match self {
            ElementKind::Select { options }
            | ElementKind::MultiSelect { options }
            | ElementKind::Checkbox { options }
            | ElementKind::Radio { options } => options,
            _ => &[],
        }
    }

    pub fn options_mut(&mut self) -> Option<&mut Vec<String>> {
        match self {
            ElementKind::Select { options }
            | ElementKind::MultiSelect { options }
            | ElementKind::Checkbox { options }
            | ElementKind::Radio { options } => Some(options),
            _ => None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Element descriptor
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Overrides the default message of every rule except `required`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// One form field or layout block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormElement {
    pub id: Uuid,
    #[serde(flatten)]
    pub kind: ElementKind,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRules>,
    /// Parent layout element, one level deep at most.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<Uuid>,
}

impl FormElement {
    pub fn element_type(&self) -> ElementType {
        self.kind.element_type()
    }

    pub fn options(&self) -> &[String] {
        self.kind.options()
    }

    /// Label shown to the user, falling back to the type default.
    pub fn display_label(&self) -> &str {
        if self.label.trim().is_empty() {
            crate::forms::defaults::label_for(self.element_type())
        } else {
            &self.label
        }
    }

    pub fn display_placeholder(&self) -> &str {
        if self.placeholder.trim().is_empty() {
            crate::forms::defaults::placeholder_for(self.element_type())
        } else {
            &self.placeholder
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Form configuration
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoPlacement {
    #[default]
    None,
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormTheme {
    pub primary_color: String,
    pub background_color: String,
    pub font_family: String,
    pub border_radius: u8,
}

impl Default for FormTheme {
    fn default() -> Self {
        Self {
            primary_color: "#2563eb".to_string(),
            background_color: "#ffffff".to_string(),
            font_family: "Inter".to_string(),
            border_radius: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormSettings {
    pub theme: FormTheme,
    pub submit_button_text: String,
    pub require_terms: bool,
    pub terms_text: String,
    pub logo_url: Option<String>,
    pub logo_placement: LogoPlacement,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            theme: FormTheme::default(),
            submit_button_text: "Submit".to_string(),
            require_terms: false,
            terms_text: "I agree to the terms and conditions".to_string(),
            logo_url: None,
            logo_placement: LogoPlacement::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDefinition {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub elements: Vec<FormElement>,
    #[serde(default)]
    pub settings: FormSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FormDefinition {
    pub fn new(title: impl Into<String>, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description,
            elements: Vec::new(),
            settings: FormSettings::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn element(&self, id: Uuid) -> Option<&FormElement> {
        self.elements.iter().find(|e| e.id == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSubmission {
    pub id: Uuid,
    pub form_id: Uuid,
    pub values: ValueBag,
    pub submitted_at: DateTime<Utc>,
}

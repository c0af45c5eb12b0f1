//! Form Builder — structural edits of a form's ordered element list.
//!
//! The builder owns the element list and the current selection. Every edit is
//! a synchronous in-memory splice; persistence happens when the caller saves
//! the resulting list back to the repository.

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::forms::defaults::{label_for, synthesize};
use crate::forms::models::{ElementType, FormElement, ValidationRules};

#[derive(Debug, Error, PartialEq)]
pub enum BuilderError {
    #[error("Element {0} not found")]
    NotFound(Uuid),

    #[error("Element {0} cannot hold nested elements")]
    NotALayout(Uuid),

    #[error("Layout elements cannot be nested inside another layout")]
    NestedLayout,

    #[error("Options are only supported on choice elements")]
    OptionsNotSupported,

    #[error("Invalid validation pattern: {0}")]
    InvalidPattern(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

/// Partial update from the property panel. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ElementPatch {
    pub label: Option<String>,
    pub placeholder: Option<String>,
    pub required: Option<bool>,
    pub validation: Option<ValidationRules>,
    pub options: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct FormBuilder {
    elements: Vec<FormElement>,
    selected: Option<Uuid>,
}

impl FormBuilder {
    pub fn new(elements: Vec<FormElement>) -> Self {
        Self {
            elements,
            selected: None,
        }
    }

    pub fn elements(&self) -> &[FormElement] {
        &self.elements
    }

    pub fn into_elements(self) -> Vec<FormElement> {
        self.elements
    }

    pub fn selected(&self) -> Option<Uuid> {
        self.selected
    }

    pub fn get(&self, id: Uuid) -> Option<&FormElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    fn position(&self, id: Uuid) -> Option<usize> {
        self.elements.iter().position(|e| e.id == id)
    }

    /// Drops a new element of `element_type` at `index` (appends when `None`
    /// or past the end). The new element becomes the selection.
    pub fn insert(&mut self, element_type: ElementType, index: Option<usize>) -> Uuid {
        let element = synthesize(element_type);
        let id = element.id;
        let at = index
            .unwrap_or(self.elements.len())
            .min(self.elements.len());
        self.elements.insert(at, element);
        self.selected = Some(id);
        debug!(%id, %element_type, at, "inserted element");
        id
    }

    /// Drops a new element inside a container or column layout, after the
    /// layout's existing children.
    pub fn insert_into(
        &mut self,
        container_id: Uuid,
        element_type: ElementType,
    ) -> Result<Uuid, BuilderError> {
        let parent_idx = self
            .position(container_id)
            .ok_or(BuilderError::NotFound(container_id))?;
        if !self.elements[parent_idx].element_type().is_layout() {
            return Err(BuilderError::NotALayout(container_id));
        }
        if element_type.is_layout() {
            return Err(BuilderError::NestedLayout);
        }

        let at = self
            .elements
            .iter()
            .rposition(|e| e.container_id == Some(container_id))
            .unwrap_or(parent_idx)
            + 1;

        let mut element = synthesize(element_type);
        element.container_id = Some(container_id);
        let id = element.id;
        self.elements.insert(at, element);
        self.selected = Some(id);
        debug!(%id, %element_type, %container_id, "inserted nested element");
        Ok(id)
    }

    /// Clones an element with a fresh id and a " (Copy)" label, right after
    /// the original.
    pub fn duplicate(&mut self, id: Uuid) -> Option<Uuid> {
        let idx = self.position(id)?;
        let mut copy = self.elements[idx].clone();
        copy.id = Uuid::new_v4();
        let base = if copy.label.trim().is_empty() {
            label_for(copy.element_type()).to_string()
        } else {
            copy.label.clone()
        };
        copy.label = format!("{base} (Copy)");
        let new_id = copy.id;
        self.elements.insert(idx + 1, copy);
        self.selected = Some(new_id);
        Some(new_id)
    }

    /// Removes exactly one element. Children of a removed layout move to the
    /// top level. Returns `false` when `id` is absent.
    pub fn delete(&mut self, id: Uuid) -> bool {
        let Some(idx) = self.position(id) else {
            return false;
        };
        self.elements.remove(idx);
        for child in self
            .elements
            .iter_mut()
            .filter(|e| e.container_id == Some(id))
        {
            child.container_id = None;
        }
        if self.selected == Some(id) {
            self.selected = None;
        }
        true
    }

    /// Swaps an element with its neighbour. No-op at the list boundaries.
    pub fn move_element(&mut self, id: Uuid, direction: Direction) -> bool {
        let Some(idx) = self.position(id) else {
            return false;
        };
        let target = match direction {
            Direction::Up if idx > 0 => idx - 1,
            Direction::Down if idx + 1 < self.elements.len() => idx + 1,
            _ => return false,
        };
        self.elements.swap(idx, target);
        true
    }

    /// Selecting an unknown id clears the selection.
    pub fn select(&mut self, id: Option<Uuid>) {
        self.selected = id.filter(|id| self.position(*id).is_some());
    }

    pub fn update(&mut self, id: Uuid, patch: ElementPatch) -> Result<(), BuilderError> {
        let idx = self.position(id).ok_or(BuilderError::NotFound(id))?;

        if let Some(pattern) = patch.validation.as_ref().and_then(|v| v.pattern.as_deref()) {
            Regex::new(pattern).map_err(|e| BuilderError::InvalidPattern(e.to_string()))?;
        }

        let element = &mut self.elements[idx];
        if let Some(options) = patch.options {
            let slot = element
                .kind
                .options_mut()
                .ok_or(BuilderError::OptionsNotSupported)?;
            *slot = options;
        }
        if let Some(label) = patch.label {
            element.label = label;
        }
        if let Some(placeholder) = patch.placeholder {
            element.placeholder = placeholder;
        }
        if let Some(required) = patch.required {
            element.required = required;
        }
        if let Some(validation) = patch.validation {
            element.validation = Some(validation);
        }
        Ok(())
    }
}

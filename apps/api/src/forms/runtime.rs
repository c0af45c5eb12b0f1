//! Form Runtime — value bag, validation state machine, step pagination and
//! submission through a pluggable sink.
//!
//! States: `Editing -> Validating -> (Invalid | Submitting) -> (Success | Failed)`.
//! `Invalid` and `Failed` keep every entered value and accept further edits;
//! any edit moves the session back to `Editing`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::forms::models::{FieldErrors, FormDefinition, FormElement, ValueBag};
use crate::forms::validation::validate_elements;

pub const DEFAULT_FIELDS_PER_STEP: usize = 5;

const TERMS_REQUIRED_MESSAGE: &str = "You must accept the terms and conditions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Editing,
    Validating,
    Invalid,
    Submitting,
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub submission_id: Uuid,
    pub form_id: Uuid,
    pub submitted_at: DateTime<Utc>,
}

/// Failure reported by a submit sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote API error (status {status}): {message}")]
    Remote { status: u16, message: String },

    #[error(transparent)]
    Store(#[from] crate::errors::StoreError),
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("{} field(s) failed validation", .fields.len())]
    Invalid {
        fields: FieldErrors,
        terms: Option<String>,
    },

    #[error("Form has already been submitted")]
    AlreadySubmitted,

    #[error("Submission failed: {0}")]
    Failed(#[source] SinkError),
}

/// Receives a validated value bag. Implemented by the local repository and
/// by the remote forms API client.
#[async_trait]
pub trait SubmitSink: Send + Sync {
    async fn submit(&self, form_id: Uuid, values: &ValueBag)
        -> Result<SubmissionReceipt, SinkError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Session
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FormSession {
    form: FormDefinition,
    values: ValueBag,
    errors: FieldErrors,
    terms_accepted: bool,
    terms_error: Option<String>,
    state: SessionState,
    /// Element indices per page. Layout children share their parent's page.
    pages: Vec<Vec<usize>>,
    current_step: usize,
}

impl FormSession {
    pub fn new(form: FormDefinition, fields_per_step: usize) -> Self {
        let pages = paginate(&form.elements, fields_per_step.max(1));
        Self {
            form,
            values: ValueBag::new(),
            errors: FieldErrors::new(),
            terms_accepted: false,
            terms_error: None,
            state: SessionState::Editing,
            pages,
            current_step: 0,
        }
    }

    pub fn form(&self) -> &FormDefinition {
        &self.form
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn values(&self) -> &ValueBag {
        &self.values
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn terms_error(&self) -> Option<&str> {
        self.terms_error.as_deref()
    }

    /// Records a field value and clears that field's error. Values for ids
    /// that are not part of the form are dropped and reported as `false`.
    pub fn set_value(&mut self, id: Uuid, value: Value) -> bool {
        if self.form.element(id).is_none() {
            debug!(form_id = %self.form.id, element_id = %id, "ignoring value for unknown element");
            return false;
        }
        self.values.insert(id, value);
        self.errors.remove(&id);
        self.state = SessionState::Editing;
        true
    }

    pub fn accept_terms(&mut self, accepted: bool) {
        self.terms_accepted = accepted;
        if accepted {
            self.terms_error = None;
        }
        self.state = SessionState::Editing;
    }

    /// Validates the whole form, including the terms gate. Returns `true`
    /// when nothing failed.
    pub fn validate(&mut self) -> bool {
        self.state = SessionState::Validating;
        self.errors = validate_elements(&self.form.elements, &self.values);
        self.terms_error = (self.form.settings.require_terms && !self.terms_accepted)
            .then(|| TERMS_REQUIRED_MESSAGE.to_string());

        let valid = self.errors.is_empty() && self.terms_error.is_none();
        if !valid {
            self.state = SessionState::Invalid;
        }
        valid
    }

    pub async fn submit(&mut self, sink: &dyn SubmitSink) -> Result<SubmissionReceipt, SubmitError> {
        if self.state == SessionState::Success {
            return Err(SubmitError::AlreadySubmitted);
        }

        if !self.validate() {
            warn!(
                form_id = %self.form.id,
                failed = self.errors.len(),
                terms = self.terms_error.is_some(),
                "submission blocked by validation"
            );
            return Err(SubmitError::Invalid {
                fields: self.errors.clone(),
                terms: self.terms_error.clone(),
            });
        }

        self.state = SessionState::Submitting;
        match sink.submit(self.form.id, &self.values).await {
            Ok(receipt) => {
                self.state = SessionState::Success;
                info!(
                    form_id = %self.form.id,
                    submission_id = %receipt.submission_id,
                    "form submitted"
                );
                Ok(receipt)
            }
            Err(e) => {
                self.state = SessionState::Failed;
                warn!(form_id = %self.form.id, "submission failed: {e}");
                Err(SubmitError::Failed(e))
            }
        }
    }

    // ── Pagination ──────────────────────────────────────────────────────────

    /// Forms longer than one page are split into steps of `fields_per_step`
    /// top-level nodes.
    pub fn step_count(&self) -> usize {
        self.pages.len()
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Jumps to `step` without validating, clamped to the last step.
    pub fn seek_step(&mut self, step: usize) {
        self.current_step = step.min(self.step_count() - 1);
    }

    pub fn step_elements(&self) -> Vec<&FormElement> {
        self.pages
            .get(self.current_step)
            .map(|page| {
                page.iter()
                    .filter_map(|&i| self.form.elements.get(i))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Advances one step if the fields on the current step pass validation.
    /// Errors for the current step replace any earlier ones for those fields.
    pub fn next_step(&mut self) -> bool {
        let (step_ids, step_errors) = {
            let step = self.step_elements();
            let ids: Vec<Uuid> = step.iter().map(|e| e.id).collect();
            (ids, validate_elements(step, &self.values))
        };
        self.errors.retain(|id, _| !step_ids.contains(id));
        let passed = step_errors.is_empty();
        self.errors.extend(step_errors);

        if !passed {
            self.state = SessionState::Invalid;
            return false;
        }
        if self.current_step + 1 < self.step_count() {
            self.current_step += 1;
        }
        true
    }

    pub fn prev_step(&mut self) -> bool {
        if self.current_step == 0 {
            return false;
        }
        self.current_step -= 1;
        true
    }
}

/// Splits the element list into pages of `per_step` top-level nodes. A layout
/// element carries its children onto its own page; an element whose parent is
/// missing counts as top level.
fn paginate(elements: &[FormElement], per_step: usize) -> Vec<Vec<usize>> {
    let is_layout = |id: Uuid| {
        elements
            .iter()
            .any(|e| e.id == id && e.element_type().is_layout())
    };

    let mut pages: Vec<Vec<usize>> = Vec::new();
    let mut roots_on_page = per_step;
    for (i, element) in elements.iter().enumerate() {
        if element.container_id.is_some_and(is_layout) {
            continue;
        }
        if roots_on_page == per_step {
            pages.push(Vec::new());
            roots_on_page = 0;
        }
        roots_on_page += 1;
        if let Some(page) = pages.last_mut() {
            page.push(i);
            if element.element_type().is_layout() {
                page.extend(
                    elements
                        .iter()
                        .enumerate()
                        .filter(|(_, child)| child.container_id == Some(element.id))
                        .map(|(j, _)| j),
                );
            }
        }
    }

    if pages.is_empty() {
        pages.push(Vec::new());
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::builder::FormBuilder;
    use crate::forms::models::ElementType;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSink {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl SubmitSink for CountingSink {
        async fn submit(
            &self,
            form_id: Uuid,
            _values: &ValueBag,
        ) -> Result<SubmissionReceipt, SinkError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SinkError::Remote {
                    status: 503,
                    message: "unavailable".to_string(),
                });
            }
            Ok(SubmissionReceipt {
                submission_id: Uuid::new_v4(),
                form_id,
                submitted_at: Utc::now(),
            })
        }
    }

    fn form_with(types: &[(ElementType, bool)]) -> FormDefinition {
        let mut builder = FormBuilder::default();
        for (t, required) in types {
            let id = builder.insert(*t, None);
            builder
                .update(
                    id,
                    crate::forms::builder::ElementPatch {
                        required: Some(*required),
                        ..Default::default()
                    },
                )
                .unwrap();
        }
        let mut form = FormDefinition::new("Enrollment", None);
        form.elements = builder.into_elements();
        form
    }

    #[tokio::test]
    async fn test_one_blank_required_field_blocks_submit() {
        let form = form_with(&[(ElementType::Text, true), (ElementType::Email, true)]);
        let filled = form.elements[1].id;
        let blank = form.elements[0].id;
        let mut session = FormSession::new(form, DEFAULT_FIELDS_PER_STEP);
        session.set_value(filled, json!("parent@school.org"));

        let sink = CountingSink::default();
        let err = session.submit(&sink).await.unwrap_err();

        match err {
            SubmitError::Invalid { fields, terms } => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[&blank], "Text Field is required");
                assert!(terms.is_none());
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
        assert_eq!(sink.calls.load(Ordering::SeqCst), 0);
        assert_eq!(session.state(), SessionState::Invalid);
    }

    #[tokio::test]
    async fn test_valid_submit_reaches_success() {
        let form = form_with(&[(ElementType::Text, true)]);
        let id = form.elements[0].id;
        let mut session = FormSession::new(form, DEFAULT_FIELDS_PER_STEP);
        session.set_value(id, json!("Ada"));

        let sink = CountingSink::default();
        let receipt = session.submit(&sink).await.unwrap();
        assert_eq!(receipt.form_id, session.form().id);
        assert_eq!(session.state(), SessionState::Success);
        assert_eq!(sink.calls.load(Ordering::SeqCst), 1);

        assert!(matches!(
            session.submit(&sink).await,
            Err(SubmitError::AlreadySubmitted)
        ));
    }

    #[tokio::test]
    async fn test_sink_failure_keeps_values() {
        let form = form_with(&[(ElementType::Text, true)]);
        let id = form.elements[0].id;
        let mut session = FormSession::new(form, DEFAULT_FIELDS_PER_STEP);
        session.set_value(id, json!("Ada"));

        let sink = CountingSink {
            fail: true,
            ..Default::default()
        };
        let err = session.submit(&sink).await.unwrap_err();
        assert!(matches!(err, SubmitError::Failed(SinkError::Remote { status: 503, .. })));
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(session.values()[&id], json!("Ada"));

        session.set_value(id, json!("Ada L."));
        assert_eq!(session.state(), SessionState::Editing);
    }

    #[tokio::test]
    async fn test_terms_gate_blocks_submit() {
        let mut form = form_with(&[(ElementType::Text, false)]);
        form.settings.require_terms = true;
        let mut session = FormSession::new(form, DEFAULT_FIELDS_PER_STEP);
        let sink = CountingSink::default();

        let err = session.submit(&sink).await.unwrap_err();
        match err {
            SubmitError::Invalid { fields, terms } => {
                assert!(fields.is_empty());
                assert_eq!(terms.as_deref(), Some(TERMS_REQUIRED_MESSAGE));
            }
            other => panic!("expected Invalid, got {other:?}"),
        }

        session.accept_terms(true);
        assert!(session.submit(&sink).await.is_ok());
    }

    #[test]
    fn test_set_value_clears_field_error() {
        let form = form_with(&[(ElementType::Text, true), (ElementType::Text, true)]);
        let a = form.elements[0].id;
        let b = form.elements[1].id;
        let mut session = FormSession::new(form, DEFAULT_FIELDS_PER_STEP);
        assert!(!session.validate());
        assert_eq!(session.errors().len(), 2);

        session.set_value(a, json!("x"));
        assert_eq!(session.errors().len(), 1);
        assert!(session.errors().contains_key(&b));
        assert_eq!(session.state(), SessionState::Editing);
    }

    #[test]
    fn test_set_value_for_unknown_element_is_dropped() {
        let form = form_with(&[(ElementType::Text, false)]);
        let mut session = FormSession::new(form, DEFAULT_FIELDS_PER_STEP);
        assert!(!session.set_value(Uuid::new_v4(), json!("x")));
        assert!(session.values().is_empty());
    }

    #[test]
    fn test_short_form_has_single_step() {
        let form = form_with(&[(ElementType::Text, false); 3]);
        let session = FormSession::new(form, DEFAULT_FIELDS_PER_STEP);
        assert_eq!(session.step_count(), 1);
        assert_eq!(session.step_elements().len(), 3);
    }

    #[test]
    fn test_empty_form_has_single_empty_step() {
        let session = FormSession::new(FormDefinition::new("Empty", None), 5);
        assert_eq!(session.step_count(), 1);
        assert!(session.step_elements().is_empty());
    }

    #[test]
    fn test_next_step_validates_only_current_step() {
        let mut types = vec![(ElementType::Text, false); 2];
        types.push((ElementType::Text, true));
        let form = form_with(&types);
        let last = form.elements[2].id;
        let mut session = FormSession::new(form, 2);
        assert_eq!(session.step_count(), 2);

        assert!(session.next_step());
        assert_eq!(session.current_step(), 1);
        assert_eq!(session.step_elements().len(), 1);

        assert!(!session.next_step());
        assert!(session.errors().contains_key(&last));

        assert!(session.prev_step());
        assert!(!session.prev_step());
    }

    #[test]
    fn test_layout_children_stay_on_parent_page() {
        let mut builder = FormBuilder::default();
        let container = builder.insert(ElementType::Container, None);
        for _ in 0..5 {
            builder.insert_into(container, ElementType::Text).unwrap();
        }
        let tail = builder.insert(ElementType::Email, None);
        let mut form = FormDefinition::new("Field Trip", None);
        form.elements = builder.into_elements();

        let mut session = FormSession::new(form, 1);
        assert_eq!(session.step_count(), 2);
        let first: Vec<Uuid> = session.step_elements().iter().map(|e| e.id).collect();
        assert_eq!(first.len(), 6);
        assert_eq!(first[0], container);

        session.seek_step(1);
        let second: Vec<Uuid> = session.step_elements().iter().map(|e| e.id).collect();
        assert_eq!(second, vec![tail]);
    }

    #[test]
    fn test_seek_step_clamps_to_last() {
        let form = form_with(&[(ElementType::Text, false); 3]);
        let mut session = FormSession::new(form, 2);
        session.seek_step(7);
        assert_eq!(session.current_step(), 1);
        session.seek_step(0);
        assert_eq!(session.current_step(), 0);
    }

    #[tokio::test]
    async fn test_final_submit_checks_all_steps() {
        let mut types = vec![(ElementType::Text, true)];
        types.extend([(ElementType::Text, false); 2]);
        let form = form_with(&types);
        let first = form.elements[0].id;
        let mut session = FormSession::new(form, 1);
        session.current_step = 2;

        let sink = CountingSink::default();
        let err = session.submit(&sink).await.unwrap_err();
        match err {
            SubmitError::Invalid { fields, .. } => assert!(fields.contains_key(&first)),
            other => panic!("expected Invalid, got {other:?}"),
        }
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::errors::StoreError;
use crate::forms::models::{FormDefinition, FormSubmission, ValueBag};
use crate::forms::runtime::{SinkError, SubmissionReceipt, SubmitSink};

/// Storage for form definitions and their submissions.
/// Writes are last-write-wins; there is no version check.
#[async_trait]
pub trait FormRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<FormDefinition>, StoreError>;
    async fn get(&self, id: Uuid) -> Result<FormDefinition, StoreError>;
    async fn create(
        &self,
        title: String,
        description: Option<String>,
    ) -> Result<FormDefinition, StoreError>;
    /// Inserts or replaces a form, bumping `updated_at`.
    async fn save(&self, form: FormDefinition) -> Result<FormDefinition, StoreError>;
    async fn add_submission(
        &self,
        form_id: Uuid,
        values: ValueBag,
    ) -> Result<FormSubmission, StoreError>;
    async fn submissions(&self, form_id: Uuid) -> Result<Vec<FormSubmission>, StoreError>;
}

#[derive(Default)]
struct Inner {
    forms: HashMap<Uuid, FormDefinition>,
    submissions: HashMap<Uuid, Vec<FormSubmission>>,
}

#[derive(Default)]
pub struct MemoryFormRepository {
    inner: RwLock<Inner>,
}

impl MemoryFormRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FormRepository for MemoryFormRepository {
    async fn list(&self) -> Result<Vec<FormDefinition>, StoreError> {
        let inner = self.inner.read().await;
        let mut forms: Vec<FormDefinition> = inner.forms.values().cloned().collect();
        forms.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(forms)
    }

    async fn get(&self, id: Uuid) -> Result<FormDefinition, StoreError> {
        self.inner
            .read()
            .await
            .forms
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Form {id} not found")))
    }

    async fn create(
        &self,
        title: String,
        description: Option<String>,
    ) -> Result<FormDefinition, StoreError> {
        let form = FormDefinition::new(title, description);
        self.inner
            .write()
            .await
            .forms
            .insert(form.id, form.clone());
        info!(form_id = %form.id, "form created");
        Ok(form)
    }

    async fn save(&self, mut form: FormDefinition) -> Result<FormDefinition, StoreError> {
        form.updated_at = Utc::now();
        self.inner
            .write()
            .await
            .forms
            .insert(form.id, form.clone());
        Ok(form)
    }

    async fn add_submission(
        &self,
        form_id: Uuid,
        values: ValueBag,
    ) -> Result<FormSubmission, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.forms.contains_key(&form_id) {
            return Err(StoreError::NotFound(format!("Form {form_id} not found")));
        }
        let submission = FormSubmission {
            id: Uuid::new_v4(),
            form_id,
            values,
            submitted_at: Utc::now(),
        };
        inner
            .submissions
            .entry(form_id)
            .or_default()
            .push(submission.clone());
        Ok(submission)
    }

    async fn submissions(&self, form_id: Uuid) -> Result<Vec<FormSubmission>, StoreError> {
        let inner = self.inner.read().await;
        if !inner.forms.contains_key(&form_id) {
            return Err(StoreError::NotFound(format!("Form {form_id} not found")));
        }
        Ok(inner.submissions.get(&form_id).cloned().unwrap_or_default())
    }
}

/// Submit sink that records submissions in the local repository.
pub struct RepositorySink(pub Arc<dyn FormRepository>);

#[async_trait]
impl SubmitSink for RepositorySink {
    async fn submit(
        &self,
        form_id: Uuid,
        values: &ValueBag,
    ) -> Result<SubmissionReceipt, SinkError> {
        let submission = self.0.add_submission(form_id, values.clone()).await?;
        Ok(SubmissionReceipt {
            submission_id: submission.id,
            form_id,
            submitted_at: submission.submitted_at,
        })
    }
}

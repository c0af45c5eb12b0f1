use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::integrations::catalog::{self, IntegrationMeta};
use crate::integrations::store::IntegrationConfig;
use crate::integrations::tester::TestOutcome;
use crate::integrations::IntegrationError;
use crate::session::Session;
use crate::state::AppState;

#[derive(Serialize)]
pub struct IntegrationStatus {
    #[serde(flatten)]
    pub meta: &'static IntegrationMeta,
    pub enabled: bool,
}

#[derive(Deserialize)]
pub struct SaveIntegrationRequest {
    #[serde(default)]
    pub config: Value,
}

#[derive(Deserialize)]
pub struct ToggleIntegrationRequest {
    pub enabled: bool,
}

/// Body of a test call. Without `config` the stored configuration is used.
#[derive(Deserialize, Default)]
pub struct TestIntegrationRequest {
    #[serde(default)]
    pub config: Option<Value>,
}

fn known(integration_id: &str) -> Result<&'static IntegrationMeta, AppError> {
    catalog::find(integration_id)
        .ok_or_else(|| IntegrationError::UnknownIntegration(integration_id.to_string()).into())
}

/// GET /api/v1/integrations
pub async fn handle_catalog() -> Json<&'static [IntegrationMeta]> {
    Json(catalog::catalog())
}

/// GET /api/v1/forms/:id/integrations
pub async fn handle_form_integrations(
    State(state): State<AppState>,
    Path(form_id): Path<Uuid>,
) -> Result<Json<Vec<IntegrationStatus>>, AppError> {
    state.forms.get(form_id).await?;
    let saved = state.integrations.list_for_form(form_id).await?;
    let statuses: Vec<IntegrationStatus> = catalog::catalog()
        .iter()
        .map(|meta| IntegrationStatus {
            meta,
            enabled: saved.get(meta.id).is_some_and(|c| c.enabled),
        })
        .collect();
    Ok(Json(statuses))
}

/// GET /api/v1/forms/:id/integrations/:integration_id
pub async fn handle_get_integration(
    State(state): State<AppState>,
    session: Session,
    Path((form_id, integration_id)): Path<(Uuid, String)>,
) -> Result<Json<IntegrationConfig>, AppError> {
    session.require_editor()?;
    let meta = known(&integration_id)?;
    state
        .integrations
        .get(form_id, meta.id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("{} is not configured for this form", meta.name)))
}

/// PUT /api/v1/forms/:id/integrations/:integration_id
pub async fn handle_save_integration(
    State(state): State<AppState>,
    session: Session,
    Path((form_id, integration_id)): Path<(Uuid, String)>,
    Json(req): Json<SaveIntegrationRequest>,
) -> Result<Json<IntegrationConfig>, AppError> {
    session.require_editor()?;
    let meta = known(&integration_id)?;
    state.forms.get(form_id).await?;
    let config = if req.config.is_null() { json!({}) } else { req.config };
    let saved = state.integrations.save(form_id, meta.id, config).await?;
    info!(%form_id, integration_id = meta.id, "integration saved");
    Ok(Json(saved))
}

/// PATCH /api/v1/forms/:id/integrations/:integration_id
pub async fn handle_toggle_integration(
    State(state): State<AppState>,
    session: Session,
    Path((form_id, integration_id)): Path<(Uuid, String)>,
    Json(req): Json<ToggleIntegrationRequest>,
) -> Result<Json<IntegrationConfig>, AppError> {
    session.require_editor()?;
    let meta = known(&integration_id)?;
    state
        .integrations
        .set_enabled(form_id, meta.id, req.enabled)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("{} is not configured for this form", meta.name)))
}

/// An empty body means "test the stored config"; anything else must be valid JSON.
fn parse_test_request(body: &[u8]) -> Result<TestIntegrationRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(TestIntegrationRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid test request body: {e}")))
}

/// POST /api/v1/forms/:id/integrations/:integration_id/test
pub async fn handle_test_integration(
    State(state): State<AppState>,
    session: Session,
    Path((form_id, integration_id)): Path<(Uuid, String)>,
    body: Bytes,
) -> Result<Json<TestOutcome>, AppError> {
    session.require_editor()?;
    let meta = known(&integration_id)?;
    let req = parse_test_request(&body)?;

    let config = match req.config {
        Some(config) => config,
        None => state
            .integrations
            .get(form_id, meta.id)
            .await?
            .map(|c| c.config)
            .unwrap_or_else(|| json!({})),
    };

    let outcome = state.tester.test(form_id, meta.id, &config).await?;
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_uses_stored_config() {
        assert!(parse_test_request(b"").unwrap().config.is_none());
        assert!(parse_test_request(b"  \n").unwrap().config.is_none());
    }

    #[test]
    fn test_malformed_body_is_rejected() {
        assert!(matches!(
            parse_test_request(br#"{"config": {"url": "#),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_explicit_config_is_kept() {
        let req = parse_test_request(br#"{"config": {"url": "https://a.example"}}"#).unwrap();
        assert_eq!(req.config.unwrap()["url"], "https://a.example");
    }
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::forms::builder::{Direction, ElementPatch, FormBuilder};
use crate::forms::defaults;
use crate::forms::models::{
    ElementType, FieldErrors, FormDefinition, FormSettings, FormSubmission, ValueBag,
};
use crate::forms::render::{render_form, RenderedElement};
use crate::forms::runtime::{FormSession, SubmissionReceipt};
use crate::session::Session;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateFormRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct InsertElementRequest {
    #[serde(rename = "type")]
    pub element_type: String,
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default)]
    pub container_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct MoveElementRequest {
    pub direction: Direction,
}

#[derive(Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub values: ValueBag,
    #[serde(default)]
    pub terms_accepted: bool,
}

/// Page navigation request. `step` is where the respondent currently is.
#[derive(Deserialize)]
pub struct StepRequest {
    #[serde(default)]
    pub values: ValueBag,
    #[serde(default)]
    pub step: usize,
    pub direction: StepDirection,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepDirection {
    Next,
    Prev,
}

#[derive(Serialize)]
pub struct StepResponse {
    pub moved: bool,
    pub current_step: usize,
    pub step_count: usize,
    pub element_ids: Vec<Uuid>,
    pub errors: FieldErrors,
}

#[derive(Serialize)]
pub struct ElementDefaults {
    #[serde(rename = "type")]
    pub element_type: String,
    pub label: &'static str,
    pub placeholder: &'static str,
    pub options: Vec<String>,
    pub settings: Value,
}

/// Result of a builder edit: the saved form plus the element the builder
/// selected while applying it.
#[derive(Serialize)]
pub struct BuilderResponse {
    pub form: FormDefinition,
    pub selected: Option<Uuid>,
    pub changed: bool,
}

#[derive(Serialize)]
pub struct RenderResponse {
    pub form_id: Uuid,
    pub title: String,
    pub settings: FormSettings,
    pub step_count: usize,
    pub elements: Vec<RenderedElement>,
}

/// Loads a form, applies one builder edit and saves it when something changed.
async fn apply_edit<F>(
    state: &AppState,
    form_id: Uuid,
    edit: F,
) -> Result<BuilderResponse, AppError>
where
    F: FnOnce(&mut FormBuilder) -> Result<bool, AppError>,
{
    let mut form = state.forms.get(form_id).await?;
    let mut builder = FormBuilder::new(std::mem::take(&mut form.elements));
    let changed = edit(&mut builder)?;
    let selected = builder.selected();
    form.elements = builder.into_elements();

    let form = if changed {
        state.forms.save(form).await?
    } else {
        form
    };
    Ok(BuilderResponse {
        form,
        selected,
        changed,
    })
}

/// GET /api/v1/forms
pub async fn handle_list_forms(
    State(state): State<AppState>,
) -> Result<Json<Vec<FormDefinition>>, AppError> {
    Ok(Json(state.forms.list().await?))
}

/// POST /api/v1/forms
pub async fn handle_create_form(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<CreateFormRequest>,
) -> Result<(StatusCode, Json<FormDefinition>), AppError> {
    session.require_editor()?;
    let title = req.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Form title is required".to_string()));
    }
    let form = state.forms.create(title.to_string(), req.description).await?;
    info!(form_id = %form.id, user_id = %session.user_id, "form created");
    Ok((StatusCode::CREATED, Json(form)))
}

/// GET /api/v1/forms/:id
pub async fn handle_get_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FormDefinition>, AppError> {
    Ok(Json(state.forms.get(id).await?))
}

/// PUT /api/v1/forms/:id/settings
pub async fn handle_update_settings(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(settings): Json<FormSettings>,
) -> Result<Json<FormDefinition>, AppError> {
    session.require_editor()?;
    let mut form = state.forms.get(id).await?;
    form.settings = settings;
    Ok(Json(state.forms.save(form).await?))
}

/// POST /api/v1/forms/:id/elements
pub async fn handle_insert_element(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(req): Json<InsertElementRequest>,
) -> Result<(StatusCode, Json<BuilderResponse>), AppError> {
    session.require_editor()?;
    let element_type = req
        .element_type
        .parse::<ElementType>()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let response = apply_edit(&state, id, |builder| {
        match req.container_id {
            Some(container_id) => {
                builder.insert_into(container_id, element_type)?;
            }
            None => {
                builder.insert(element_type, req.index);
            }
        }
        Ok(true)
    })
    .await?;
    info!(form_id = %id, %element_type, "element inserted");
    Ok((StatusCode::CREATED, Json(response)))
}

/// PATCH /api/v1/forms/:id/elements/:element_id
pub async fn handle_update_element(
    State(state): State<AppState>,
    session: Session,
    Path((id, element_id)): Path<(Uuid, Uuid)>,
    Json(patch): Json<ElementPatch>,
) -> Result<Json<BuilderResponse>, AppError> {
    session.require_editor()?;
    let response = apply_edit(&state, id, |builder| {
        builder.update(element_id, patch)?;
        builder.select(Some(element_id));
        Ok(true)
    })
    .await?;
    Ok(Json(response))
}

/// DELETE /api/v1/forms/:id/elements/:element_id
pub async fn handle_delete_element(
    State(state): State<AppState>,
    session: Session,
    Path((id, element_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<BuilderResponse>, AppError> {
    session.require_editor()?;
    let response = apply_edit(&state, id, |builder| {
        if builder.delete(element_id) {
            Ok(true)
        } else {
            Err(AppError::NotFound(format!("Element {element_id} not found")))
        }
    })
    .await?;
    info!(form_id = %id, %element_id, "element deleted");
    Ok(Json(response))
}

/// POST /api/v1/forms/:id/elements/:element_id/duplicate
pub async fn handle_duplicate_element(
    State(state): State<AppState>,
    session: Session,
    Path((id, element_id)): Path<(Uuid, Uuid)>,
) -> Result<(StatusCode, Json<BuilderResponse>), AppError> {
    session.require_editor()?;
    let response = apply_edit(&state, id, |builder| {
        builder
            .duplicate(element_id)
            .map(|_| true)
            .ok_or_else(|| AppError::NotFound(format!("Element {element_id} not found")))
    })
    .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/forms/:id/elements/:element_id/move
/// Moving past either end of the list succeeds with `changed: false`.
pub async fn handle_move_element(
    State(state): State<AppState>,
    session: Session,
    Path((id, element_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<MoveElementRequest>,
) -> Result<Json<BuilderResponse>, AppError> {
    session.require_editor()?;
    let response = apply_edit(&state, id, |builder| {
        if builder.get(element_id).is_none() {
            return Err(AppError::NotFound(format!("Element {element_id} not found")));
        }
        let moved = builder.move_element(element_id, req.direction);
        builder.select(Some(element_id));
        Ok(moved)
    })
    .await?;
    Ok(Json(response))
}

/// GET /api/v1/forms/:id/render
pub async fn handle_render_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RenderResponse>, AppError> {
    let form = state.forms.get(id).await?;
    let elements = render_form(&form, &ValueBag::new());
    let step_count = FormSession::new(form.clone(), state.config.fields_per_step).step_count();
    Ok(Json(RenderResponse {
        form_id: form.id,
        title: form.title,
        settings: form.settings,
        step_count,
        elements,
    }))
}

/// POST /api/v1/forms/:id/steps
/// Only the fields on the step being left are validated when moving forward.
pub async fn handle_step(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StepRequest>,
) -> Result<Json<StepResponse>, AppError> {
    let form = state.forms.get(id).await?;
    let mut session = FormSession::new(form, state.config.fields_per_step);
    for (element_id, value) in req.values {
        session.set_value(element_id, value);
    }
    session.seek_step(req.step);

    let moved = match req.direction {
        StepDirection::Next => {
            let from = session.current_step();
            session.next_step() && session.current_step() != from
        }
        StepDirection::Prev => session.prev_step(),
    };

    Ok(Json(StepResponse {
        moved,
        current_step: session.current_step(),
        step_count: session.step_count(),
        element_ids: session.step_elements().iter().map(|e| e.id).collect(),
        errors: session.errors().clone(),
    }))
}

/// GET /api/v1/element-types/:type/defaults
/// Unknown tags get the generic fallback rather than an error.
pub async fn handle_element_defaults(Path(tag): Path<String>) -> Json<ElementDefaults> {
    Json(ElementDefaults {
        label: defaults::label_for_tag(&tag),
        placeholder: defaults::placeholder_for_tag(&tag),
        options: defaults::options_for_tag(&tag),
        settings: defaults::settings_for_tag(&tag),
        element_type: tag,
    })
}

/// POST /api/v1/forms/:id/responses
pub async fn handle_submit_response(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<SubmissionReceipt>), AppError> {
    let form = state.forms.get(id).await?;
    let mut session = FormSession::new(form, state.config.fields_per_step);
    for (element_id, value) in req.values {
        session.set_value(element_id, value);
    }
    session.accept_terms(req.terms_accepted);

    let receipt = session.submit(state.submit_sink.as_ref()).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// GET /api/v1/forms/:id/responses
pub async fn handle_list_responses(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<FormSubmission>>, AppError> {
    session.require_editor()?;
    Ok(Json(state.forms.submissions(id).await?))
}

pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::forms::handlers as forms;
use crate::integrations::handlers as integrations;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Forms & builder
        .route(
            "/api/v1/forms",
            get(forms::handle_list_forms).post(forms::handle_create_form),
        )
        .route("/api/v1/forms/:id", get(forms::handle_get_form))
        .route(
            "/api/v1/forms/:id/settings",
            axum::routing::put(forms::handle_update_settings),
        )
        .route(
            "/api/v1/forms/:id/elements",
            post(forms::handle_insert_element),
        )
        .route(
            "/api/v1/forms/:id/elements/:element_id",
            axum::routing::patch(forms::handle_update_element)
                .delete(forms::handle_delete_element),
        )
        .route(
            "/api/v1/forms/:id/elements/:element_id/duplicate",
            post(forms::handle_duplicate_element),
        )
        .route(
            "/api/v1/forms/:id/elements/:element_id/move",
            post(forms::handle_move_element),
        )
        // Runtime
        .route("/api/v1/forms/:id/render", get(forms::handle_render_form))
        .route("/api/v1/forms/:id/steps", post(forms::handle_step))
        .route(
            "/api/v1/element-types/:element_type/defaults",
            get(forms::handle_element_defaults),
        )
        .route(
            "/api/v1/forms/:id/responses",
            get(forms::handle_list_responses).post(forms::handle_submit_response),
        )
        // Integrations hub
        .route("/api/v1/integrations", get(integrations::handle_catalog))
        .route(
            "/api/v1/forms/:id/integrations",
            get(integrations::handle_form_integrations),
        )
        .route(
            "/api/v1/forms/:id/integrations/:integration_id",
            get(integrations::handle_get_integration)
                .put(integrations::handle_save_integration)
                .patch(integrations::handle_toggle_integration),
        )
        .route(
            "/api/v1/forms/:id/integrations/:integration_id/test",
            post(integrations::handle_test_integration),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::session::SESSION_HEADER;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const TEACHER: &str = r#"{"id":"t-1","role":"teacher"}"#;
    const STUDENT: &str = r#"{"id":"s-1","role":"student"}"#;

    fn app() -> Router {
        build_router(AppState::in_memory(Config::default()))
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        session: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(s) = session {
            req = req.header(SESSION_HEADER, s);
        }
        let req = match body {
            Some(b) => req
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create_form(app: &Router) -> String {
        let (status, body) = call(
            app,
            "POST",
            "/api/v1/forms",
            Some(TEACHER),
            Some(json!({ "title": "Club Sign-up" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    async fn insert(app: &Router, form_id: &str, element_type: &str) -> Value {
        let (status, body) = call(
            app,
            "POST",
            &format!("/api/v1/forms/{form_id}/elements"),
            Some(TEACHER),
            Some(json!({ "type": element_type })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(&app(), "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_create_form_requires_session() {
        let (status, body) = call(
            &app(),
            "POST",
            "/api/v1/forms",
            None,
            Some(json!({ "title": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_student_cannot_edit_form() {
        let app = app();
        let form_id = create_form(&app).await;
        let (status, _) = call(
            &app,
            "POST",
            &format!("/api/v1/forms/{form_id}/elements"),
            Some(STUDENT),
            Some(json!({ "type": "text" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_insert_unknown_type_is_bad_request() {
        let app = app();
        let form_id = create_form(&app).await;
        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/v1/forms/{form_id}/elements"),
            Some(TEACHER),
            Some(json!({ "type": "hologram" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Unknown element type 'hologram'");
    }

    #[tokio::test]
    async fn test_builder_edits_persist() {
        let app = app();
        let form_id = create_form(&app).await;

        let first = insert(&app, &form_id, "text").await;
        let text_id = first["selected"].as_str().unwrap().to_string();
        let second = insert(&app, &form_id, "email").await;
        assert_eq!(second["form"]["elements"].as_array().unwrap().len(), 2);

        let (status, moved) = call(
            &app,
            "POST",
            &format!("/api/v1/forms/{form_id}/elements/{text_id}/move"),
            Some(TEACHER),
            Some(json!({ "direction": "up" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(moved["changed"], false);

        let (status, deleted) = call(
            &app,
            "DELETE",
            &format!("/api/v1/forms/{form_id}/elements/{text_id}"),
            Some(TEACHER),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted["selected"], Value::Null);

        let (_, form) = call(&app, "GET", &format!("/api/v1/forms/{form_id}"), None, None).await;
        let elements = form["elements"].as_array().unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0]["type"], "email");
    }

    #[tokio::test]
    async fn test_delete_missing_element_is_not_found() {
        let app = app();
        let form_id = create_form(&app).await;
        let (status, _) = call(
            &app,
            "DELETE",
            &format!("/api/v1/forms/{form_id}/elements/{}", uuid::Uuid::new_v4()),
            Some(TEACHER),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_submit_blocks_blank_required_field() {
        let app = app();
        let form_id = create_form(&app).await;
        let a = insert(&app, &form_id, "text").await["selected"]
            .as_str()
            .unwrap()
            .to_string();
        let b = insert(&app, &form_id, "email").await["selected"]
            .as_str()
            .unwrap()
            .to_string();
        for id in [&a, &b] {
            call(
                &app,
                "PATCH",
                &format!("/api/v1/forms/{form_id}/elements/{id}"),
                Some(TEACHER),
                Some(json!({ "required": true })),
            )
            .await;
        }

        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/v1/forms/{form_id}/responses"),
            None,
            Some(json!({ "values": { b.clone(): "kid@school.org" } })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let fields = body["error"]["fields"].as_object().unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[&a], "Text Field is required");

        let (_, responses) = call(
            &app,
            "GET",
            &format!("/api/v1/forms/{form_id}/responses"),
            Some(TEACHER),
            None,
        )
        .await;
        assert!(responses.as_array().unwrap().is_empty());

        let (status, _) = call(
            &app,
            "POST",
            &format!("/api/v1/forms/{form_id}/responses"),
            None,
            Some(json!({ "values": { a.clone(): "Ada", b.clone(): "kid@school.org" } })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_render_lists_controls() {
        let app = app();
        let form_id = create_form(&app).await;
        insert(&app, &form_id, "rating").await;
        let (status, body) = call(
            &app,
            "GET",
            &format!("/api/v1/forms/{form_id}/render"),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["step_count"], 1);
        assert_eq!(body["elements"][0]["control"], "star_rating");
        assert_eq!(body["elements"][1]["control"], "submit_button");
    }

    #[tokio::test]
    async fn test_step_blocks_on_current_page_errors() {
        let app = build_router(AppState::in_memory(Config {
            fields_per_step: 1,
            ..Config::default()
        }));
        let form_id = create_form(&app).await;
        let first = insert(&app, &form_id, "text").await["selected"]
            .as_str()
            .unwrap()
            .to_string();
        insert(&app, &form_id, "email").await;
        call(
            &app,
            "PATCH",
            &format!("/api/v1/forms/{form_id}/elements/{first}"),
            Some(TEACHER),
            Some(json!({ "required": true })),
        )
        .await;

        let uri = format!("/api/v1/forms/{form_id}/steps");
        let (status, blocked) = call(
            &app,
            "POST",
            &uri,
            None,
            Some(json!({ "step": 0, "direction": "next" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(blocked["moved"], false);
        assert_eq!(blocked["current_step"], 0);
        assert_eq!(blocked["errors"][&first], "Text Field is required");

        let (_, advanced) = call(
            &app,
            "POST",
            &uri,
            None,
            Some(json!({ "step": 0, "direction": "next", "values": { first.clone(): "Ada" } })),
        )
        .await;
        assert_eq!(advanced["moved"], true);
        assert_eq!(advanced["current_step"], 1);
        assert_eq!(advanced["step_count"], 2);
    }

    #[tokio::test]
    async fn test_element_defaults_fall_back_for_unknown_tag() {
        let app = app();
        let (status, known) =
            call(&app, "GET", "/api/v1/element-types/radio/defaults", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(known["options"].as_array().unwrap().len(), 3);

        let (_, unknown) =
            call(&app, "GET", "/api/v1/element-types/hologram/defaults", None, None).await;
        assert_eq!(unknown["label"], "Form Field");
        assert_eq!(unknown["placeholder"], "Enter value");
        assert_eq!(unknown["settings"], json!({}));
    }

    #[tokio::test]
    async fn test_webhook_test_without_url_is_rejected() {
        let app = app();
        let form_id = create_form(&app).await;
        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/v1/forms/{form_id}/integrations/webhook/test"),
            Some(TEACHER),
            Some(json!({ "config": { "url": "" } })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Webhook URL is required");
    }

    #[tokio::test]
    async fn test_malformed_test_body_is_bad_request() {
        let app = app();
        let form_id = create_form(&app).await;
        call(
            &app,
            "PUT",
            &format!("/api/v1/forms/{form_id}/integrations/email"),
            Some(TEACHER),
            Some(json!({
                "config": { "smtp_host": "smtp.school.edu", "from_address": "office@school.org" }
            })),
        )
        .await;

        let uri = format!("/api/v1/forms/{form_id}/integrations/email/test");
        let (status, outcome) = call(&app, "POST", &uri, Some(TEACHER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["integration_id"], "email");

        let req = Request::builder()
            .method("POST")
            .uri(&uri)
            .header(SESSION_HEADER, TEACHER)
            .header("content-type", "application/json")
            .body(Body::from("{\"config\": "))
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_save_integration_marks_enabled() {
        let app = app();
        let form_id = create_form(&app).await;
        let (status, saved) = call(
            &app,
            "PUT",
            &format!("/api/v1/forms/{form_id}/integrations/slack"),
            Some(TEACHER),
            Some(json!({ "config": { "webhook_url": "https://hooks.example/x" } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["enabled"], true);

        let (_, statuses) = call(
            &app,
            "GET",
            &format!("/api/v1/forms/{form_id}/integrations"),
            None,
            None,
        )
        .await;
        let slack = statuses
            .as_array()
            .unwrap()
            .iter()
            .find(|s| s["id"] == "slack")
            .unwrap();
        assert_eq!(slack["enabled"], true);
        let webhook = statuses
            .as_array()
            .unwrap()
            .iter()
            .find(|s| s["id"] == "webhook")
            .unwrap();
        assert_eq!(webhook["enabled"], false);
    }

    #[tokio::test]
    async fn test_unknown_integration_is_not_found() {
        let app = app();
        let form_id = create_form(&app).await;
        let (status, _) = call(
            &app,
            "PUT",
            &format!("/api/v1/forms/{form_id}/integrations/fax"),
            Some(TEACHER),
            Some(json!({ "config": {} })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

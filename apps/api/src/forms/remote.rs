//! Client for the remote forms API.
//!
//! Calls are one-shot: a failed request is reported to the caller and never
//! retried.
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::forms::models::{FormDefinition, ValueBag};
use crate::forms::runtime::{SinkError, SubmissionReceipt, SubmitSink};

#[derive(Debug, Deserialize)]
struct RemoteError {
    #[serde(alias = "error")]
    message: String,
}

#[derive(Clone)]
pub struct RemoteFormsClient {
    client: Client,
    base_url: String,
}

impl RemoteFormsClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET /forms
    pub async fn get_all_forms(&self) -> Result<Vec<FormDefinition>, SinkError> {
        let response = self.client.get(self.url("/forms")).send().await?;
        let response = check_status(response).await?;
        let forms: Vec<FormDefinition> = response.json().await?;
        debug!("fetched {} forms from remote API", forms.len());
        Ok(forms)
    }
}

async fn check_status(response: Response) -> Result<Response, SinkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<RemoteError>(&body)
        .map(|e| e.message)
        .unwrap_or(body);
    Err(SinkError::Remote {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl SubmitSink for RemoteFormsClient {
    /// POST /forms/:id/responses
    /// Any 2xx is an accepted submission. The remote may answer with a
    /// receipt; otherwise one is issued locally.
    async fn submit(
        &self,
        form_id: Uuid,
        values: &ValueBag,
    ) -> Result<SubmissionReceipt, SinkError> {
        let response = self
            .client
            .post(self.url(&format!("/forms/{form_id}/responses")))
            .json(values)
            .send()
            .await?;
        let response = check_status(response).await?;
        let body = response.bytes().await?;
        let receipt = match serde_json::from_slice::<SubmissionReceipt>(&body) {
            Ok(receipt) => receipt,
            Err(_) => {
                debug!(%form_id, "remote accepted submission without a receipt");
                SubmissionReceipt {
                    submission_id: Uuid::new_v4(),
                    form_id,
                    submitted_at: Utc::now(),
                }
            }
        };
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Path,
        http::StatusCode,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_submit_posts_value_bag() {
        let router = Router::new().route(
            "/forms/:id/responses",
            post(|Path(id): Path<Uuid>, Json(body): Json<Value>| async move {
                assert!(body.is_object());
                Json(json!({
                    "submission_id": Uuid::new_v4(),
                    "form_id": id,
                    "submitted_at": Utc::now(),
                }))
            }),
        );
        let base = spawn(router).await;
        let client = RemoteFormsClient::new(Client::new(), format!("{base}/"));

        let form_id = Uuid::new_v4();
        let mut values = ValueBag::new();
        values.insert(Uuid::new_v4(), json!("a@b.com"));
        let receipt = client.submit(form_id, &values).await.unwrap();
        assert_eq!(receipt.form_id, form_id);
    }

    #[tokio::test]
    async fn test_submit_accepts_empty_success_response() {
        let router = Router::new().route(
            "/forms/:id/responses",
            post(|| async { StatusCode::NO_CONTENT }),
        );
        let base = spawn(router).await;
        let client = RemoteFormsClient::new(Client::new(), base);

        let form_id = Uuid::new_v4();
        let receipt = client.submit(form_id, &ValueBag::new()).await.unwrap();
        assert_eq!(receipt.form_id, form_id);
        assert!(!receipt.submission_id.is_nil());
    }

    #[tokio::test]
    async fn test_submit_ignores_unrelated_success_body() {
        let router = Router::new().route(
            "/forms/:id/responses",
            post(|| async { Json(json!({ "ok": true })) }),
        );
        let base = spawn(router).await;
        let client = RemoteFormsClient::new(Client::new(), base);

        let form_id = Uuid::new_v4();
        let receipt = client.submit(form_id, &ValueBag::new()).await.unwrap();
        assert_eq!(receipt.form_id, form_id);
    }

    #[tokio::test]
    async fn test_non_success_status_is_surfaced() {
        let router = Router::new().route(
            "/forms",
            get(|| async {
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({ "message": "maintenance" })),
                )
            }),
        );
        let base = spawn(router).await;
        let client = RemoteFormsClient::new(Client::new(), base);

        match client.get_all_forms().await.unwrap_err() {
            SinkError::Remote { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "maintenance");
            }
            other => panic!("expected Remote error, got {other:?}"),
        }
    }
}

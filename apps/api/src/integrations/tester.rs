//! One-shot diagnostic calls for configured integrations.
//!
//! Webhook, Slack and Zapier tests make a single HTTP POST with a synthetic
//! payload; any 2xx is a pass. The remaining integrations only check that
//! their required settings are present. Nothing is retried or recorded.

use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::integrations::catalog;
use crate::integrations::IntegrationError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestOutcome {
    pub integration_id: String,
    /// HTTP status of the outbound call, when one was made.
    pub status: Option<u16>,
    pub message: String,
}

#[derive(Clone)]
pub struct IntegrationTester {
    client: Client,
}

/// Reads a non-blank string setting or fails with `message`.
fn required<'a>(config: &'a Value, key: &str, message: &str) -> Result<&'a str, IntegrationError> {
    config
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| IntegrationError::MissingConfig(message.to_string()))
}

impl IntegrationTester {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    pub async fn test(
        &self,
        form_id: Uuid,
        integration_id: &str,
        config: &Value,
    ) -> Result<TestOutcome, IntegrationError> {
        let meta = catalog::find(integration_id)
            .ok_or_else(|| IntegrationError::UnknownIntegration(integration_id.to_string()))?;

        let outcome = match meta.id {
            "webhook" => {
                let url = required(config, "url", "Webhook URL is required")?;
                let payload = json!({
                    "event": "test",
                    "form_id": form_id,
                    "timestamp": Utc::now(),
                    "data": { "message": "This is a test submission" },
                });
                let mut request = self.client.post(url).json(&payload);
                if let Some(headers) = config.get("headers").and_then(Value::as_object) {
                    for (name, value) in headers {
                        if let Some(value) = value.as_str() {
                            request = request.header(name.as_str(), value);
                        }
                    }
                }
                if let Some(secret) = config.get("secret").and_then(Value::as_str) {
                    request = request.header("X-Webhook-Secret", secret);
                }
                self.send(meta.id, request).await?
            }
            "slack" => {
                let url = required(config, "webhook_url", "Slack webhook URL is required")?;
                let mut payload = json!({
                    "text": format!("Test notification for form {form_id}"),
                });
                if let Some(channel) = config.get("channel").and_then(Value::as_str) {
                    payload["channel"] = json!(channel);
                }
                self.send(meta.id, self.client.post(url).json(&payload)).await?
            }
            "zapier" => {
                let url = required(config, "webhook_url", "Zapier webhook URL is required")?;
                let payload = json!({
                    "test": true,
                    "form_id": form_id,
                    "timestamp": Utc::now(),
                });
                self.send(meta.id, self.client.post(url).json(&payload)).await?
            }
            "email" => {
                required(config, "smtp_host", "SMTP host is required")?;
                required(config, "from_address", "Sender address is required")?;
                config_ok(meta.id)
            }
            "google-sheets" => {
                required(config, "spreadsheet_id", "Spreadsheet ID is required")?;
                config_ok(meta.id)
            }
            "mailchimp" => {
                required(config, "api_key", "Mailchimp API key is required")?;
                required(config, "list_id", "Audience ID is required")?;
                config_ok(meta.id)
            }
            "stripe" => {
                required(config, "publishable_key", "Stripe publishable key is required")?;
                config_ok(meta.id)
            }
            "hubspot" => {
                required(config, "api_key", "HubSpot API key is required")?;
                config_ok(meta.id)
            }
            other => return Err(IntegrationError::UnknownIntegration(other.to_string())),
        };

        info!(%form_id, integration_id = meta.id, "integration test passed");
        Ok(outcome)
    }

    async fn send(
        &self,
        integration_id: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<TestOutcome, IntegrationError> {
        let response = request.send().await.map_err(|e| {
            warn!(integration_id, "test call failed: {e}");
            IntegrationError::Http(e)
        })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(integration_id, status = status.as_u16(), "test call rejected");
            return Err(IntegrationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(TestOutcome {
            integration_id: integration_id.to_string(),
            status: Some(status.as_u16()),
            message: "Test request delivered successfully".to_string(),
        })
    }
}

fn config_ok(integration_id: &str) -> TestOutcome {
    TestOutcome {
        integration_id: integration_id.to_string(),
        status: None,
        message: "Configuration looks valid".to_string(),
    }
}

// Integrations Hub: static catalog, per-form configuration store and one-shot
// test calls. Nothing here retries; failures go straight back to the caller.

pub mod catalog;
pub mod handlers;
pub mod store;
pub mod tester;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("Unknown integration '{0}'")]
    UnknownIntegration(String),

    #[error("{0}")]
    MissingConfig(String),

    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request failed with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

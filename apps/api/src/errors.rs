use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::forms::builder::BuilderError;
use crate::forms::models::FieldErrors;
use crate::forms::runtime::SubmitError;
use crate::integrations::IntegrationError;

/// Failure of a form or integration store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Per-field validation failures from a submission attempt.
    #[error("Submission rejected: {message}")]
    FieldValidation {
        message: String,
        fields: FieldErrors,
        terms: Option<String>,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(msg) => AppError::NotFound(msg),
            other => AppError::Store(other),
        }
    }
}

impl From<BuilderError> for AppError {
    fn from(e: BuilderError) -> Self {
        match e {
            BuilderError::NotFound(_) => AppError::NotFound(e.to_string()),
            other => AppError::Validation(other.to_string()),
        }
    }
}

impl From<SubmitError> for AppError {
    fn from(e: SubmitError) -> Self {
        match e {
            SubmitError::Invalid { fields, terms } => AppError::FieldValidation {
                message: format!("{} field(s) failed validation", fields.len()),
                fields,
                terms,
            },
            SubmitError::AlreadySubmitted => AppError::Conflict(e.to_string()),
            SubmitError::Failed(inner) => AppError::Upstream(inner.to_string()),
        }
    }
}

impl From<IntegrationError> for AppError {
    fn from(e: IntegrationError) -> Self {
        match e {
            IntegrationError::UnknownIntegration(_) => AppError::NotFound(e.to_string()),
            IntegrationError::MissingConfig(msg) => AppError::Validation(msg),
            IntegrationError::Http(_) | IntegrationError::Rejected { .. } => {
                AppError::Upstream(e.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::FieldValidation { message, .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "FIELD_VALIDATION_ERROR",
                message.clone(),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Access denied".to_string(),
            ),
            AppError::Upstream(msg) => {
                tracing::warn!("Upstream error: {msg}");
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg.clone())
            }
            AppError::Store(e) => {
                tracing::error!("Store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let AppError::FieldValidation { fields, terms, .. } = &self {
            error["fields"] = json!(fields);
            if let Some(terms) = terms {
                error["terms"] = json!(terms);
            }
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

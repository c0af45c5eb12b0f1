//! Typed session context.
//!
//! The signed-in user arrives as a JSON blob in the `x-esm-user` header
//! (`{"id": "...", "role": "teacher"}`) and is extracted once per request.
//! Handlers that mutate forms or integrations take a `Session` and call
//! `require_editor`.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AppError;

pub const SESSION_HEADER: &str = "x-esm-user";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Teacher,
    Student,
    Parent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Empty when the blob carries only a role.
    #[serde(rename = "id", default)]
    pub user_id: String,
    pub role: Role,
}

impl Session {
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            debug!(user_id = %self.user_id, role = ?self.role, "role not permitted");
            Err(AppError::Forbidden)
        }
    }

    /// Builder and integration changes are limited to staff.
    pub fn require_editor(&self) -> Result<(), AppError> {
        self.require_role(&[Role::Admin, Role::Teacher])
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;
        serde_json::from_str(raw).map_err(|e| {
            debug!("rejecting malformed session header: {e}");
            AppError::Unauthorized
        })
    }
}

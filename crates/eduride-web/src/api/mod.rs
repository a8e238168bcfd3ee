//! REST API route handlers.
//!
//! One module per resource. The extractors shared between them live here:
//! [`ApiJson`] for request bodies, [`Pagination`] for `?skip&limit`, and
//! [`Principal`] for endpoints that need a bearer token.

pub mod admin;
pub mod buses;
pub mod driver;
pub mod feedback;
pub mod health;
pub mod routes;
pub mod schedules;
pub mod student;

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use eduride_auth::{Claims, Role};

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// `Json<T>` whose rejection is an [`ApiError::Validation`], so malformed
/// bodies get the same error shape as every other failure.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
        }
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// `?skip=0&limit=100`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

impl Pagination {
    /// Clamp to non-negative values.
    pub fn bounds(self) -> (i64, i64) {
        (self.skip.max(0), self.limit.max(0))
    }
}

// ---------------------------------------------------------------------------
// Bearer principal
// ---------------------------------------------------------------------------

/// The caller identified by a valid `Authorization: Bearer` token.
#[derive(Debug, Clone)]
pub struct Principal(pub Claims);

impl Principal {
    /// Return the principal id if the token carries `role`.
    pub fn require(&self, role: Role) -> Result<i64, ApiError> {
        if self.0.role != role {
            return Err(ApiError::Forbidden(format!(
                "This endpoint requires a {role} account"
            )));
        }
        Ok(self.0.principal_id()?)
    }
}

impl FromRequestParts<Arc<AppState>> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Not authenticated".into()))?;

        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Not authenticated".into()))?;

        let claims = state.auth.verify(token)?;
        Ok(Self(claims))
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Render a unix timestamp as `YYYY-MM-DDTHH:MM:SS` (UTC).
pub fn iso_timestamp(unix: i64) -> String {
    DateTime::<Utc>::from_timestamp(unix, 0)
        .map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string())
        .unwrap_or_default()
}

//! HTTP error mapping.
//!
//! Every handler returns `Result<_, ApiError>`. The response body is always
//! `{"detail": <message>, "reason": <code>}`.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use eduride_auth::AuthError;
use eduride_store::StoreError;

/// Errors a handler can return.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    /// A unique value is taken, or the row is still referenced.
    #[error("{0}")]
    Conflict(String),

    /// Bad credentials or a missing/invalid bearer token.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but with the wrong role.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    detail: &'a str,
    reason: &'static str,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            // Kept at 400 so clients that match "Email already registered" keep working.
            Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::Validation(_) => "validation",
            Self::Internal(_) => "internal",
        }
    }

    /// `"<Entity> not found"`.
    pub fn not_found(entity: &str) -> Self {
        Self::NotFound(format!("{entity} not found"))
    }

    /// Map a login failure, using `detail` for rejected credentials.
    pub fn from_login(err: AuthError, detail: &str) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::Unauthorized(detail.to_string()),
            other => other.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        let body = Json(ErrorBody {
            detail: &message,
            reason: self.reason(),
        });

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, .. } => Self::not_found(&capitalize(entity)),
            StoreError::Conflict { entity, message } => {
                match message.strip_suffix(" already exists") {
                    Some(column) => Self::Conflict(format!(
                        "{} already registered",
                        capitalize(&column.replace('_', " "))
                    )),
                    None => Self::Conflict(format!("{} is {message}", capitalize(entity))),
                }
            }
            StoreError::InvalidArgument(message) => Self::Validation(message),
            other => {
                error!(error = %other, "store operation failed");
                Self::Internal("Internal server error".into())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::Unauthorized("Invalid credentials".into()),
            AuthError::InvalidToken { .. } => {
                Self::Unauthorized("Could not validate credentials".into())
            }
            AuthError::TokenExpired => Self::Unauthorized("Token has expired".into()),
            AuthError::Store(e) => e.into(),
            AuthError::TokenIssue(e) => {
                error!(error = %e, "failed to issue token");
                Self::Internal("Internal server error".into())
            }
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

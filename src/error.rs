use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::auth::error::AuthError;

/// Error returned by handlers; renders as `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("Authorization token is required")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingToken | ApiError::InvalidToken | ApiError::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingCredential => ApiError::MissingToken,
            AuthError::Token(_) => ApiError::InvalidToken,
            AuthError::OwnershipViolation | AuthError::AdminRestricted => {
                ApiError::Forbidden("You are not allowed to perform this action")
            }
            AuthError::HashFailure(_) => ApiError::Internal("Could not process credentials"),
        }
    }
}

/// Logs the underlying failure and hides it behind a fixed 500 message.
pub fn internal<E: std::fmt::Display>(message: &'static str) -> impl FnOnce(E) -> ApiError {
    move |e| {
        error!(error = %e, "{}", message);
        ApiError::Internal(message)
    }
}

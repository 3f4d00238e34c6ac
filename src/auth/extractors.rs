use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::claims::Identity;
use crate::error::ApiError;

/// Identity placed in the request by [`super::middleware::require_auth`].
pub struct AuthUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Absent only when a handler is mounted outside the gated router.
        parts
            .extensions
            .get::<Identity>()
            .copied()
            .map(AuthUser)
            .ok_or(ApiError::MissingToken)
    }
}

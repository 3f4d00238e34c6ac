use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::{
    auth::{
        claims::Identity,
        error::{AuthError, TokenError},
        jwt::JwtKeys,
    },
    error::ApiError,
    state::AppState,
};

/// Auth gate for protected routes.
///
/// Reads the raw `Authorization` header (the token as issued, no `Bearer `
/// scheme), verifies it and stores the caller's [`Identity`] in the request
/// extensions. Missing or empty header is a 401 "Authorization token is
/// required"; any verification failure is a 401 "Invalid token".
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = match authenticate(&state.jwt, req.headers()) {
        Ok(identity) => identity,
        Err(e) => {
            warn!(error = %e, uri = %req.uri(), "request rejected by auth gate");
            return Err(e.into());
        }
    };
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

pub fn authenticate(keys: &JwtKeys, headers: &HeaderMap) -> Result<Identity, AuthError> {
    let raw = match headers.get(AUTHORIZATION) {
        Some(v) if !v.is_empty() => v,
        _ => return Err(AuthError::MissingCredential),
    };
    let token = raw.to_str().map_err(|_| TokenError::MalformedToken)?;
    let claims = keys.verify(token)?;
    Ok(Identity::from(&claims))
}

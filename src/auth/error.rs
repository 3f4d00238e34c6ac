use thiserror::Error;

/// Why a bearer token was refused.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token could not be parsed")]
    MalformedToken,
    #[error("token signature or algorithm is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token claims are missing or mistyped")]
    MalformedClaims,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization token is required")]
    MissingCredential,
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("caller does not own the resource")]
    OwnershipViolation,
    #[error("operation is not permitted for this privilege level")]
    AdminRestricted,
    #[error("password hashing failed: {0}")]
    HashFailure(String),
}

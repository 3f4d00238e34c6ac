use serde::{Deserialize, Serialize};

/// JWT payload issued at login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub email: String,
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    pub exp: i64, // expires at (unix timestamp)
}

/// Authenticated caller attached to the request by the auth gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub is_admin: bool,
}

impl From<&Claims> for Identity {
    fn from(claims: &Claims) -> Self {
        Self {
            user_id: claims.user_id,
            is_admin: claims.is_admin,
        }
    }
}

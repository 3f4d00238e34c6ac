use serde::Serialize;

/// `{"message": "..."}` success body for operations with nothing else to return.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

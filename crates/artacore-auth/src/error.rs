//! Authentication error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown identity or wrong password. The two are never told apart.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing or malformed authorization header")]
    MissingOrMalformedHeader,

    /// Bad signature, undecodable token, or `exp` in the past.
    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials | AuthError::MissingOrMalformedHeader => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::InvalidOrExpiredToken | AuthError::InsufficientPermissions => {
                StatusCode::FORBIDDEN
            }
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the client
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "Invalid credentials",
            AuthError::MissingOrMalformedHeader => "Unauthorized",
            AuthError::InvalidOrExpiredToken => "Invalid or expired token",
            AuthError::InsufficientPermissions => "Insufficient permissions",
            AuthError::Internal(_) => "Internal server error",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = axum::Json(json!({
            "error": self.public_message()
        }));

        (self.status_code(), body).into_response()
    }
}

//! API error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("User not found")]
    UserNotFound,

    #[error("Verse not found")]
    VerseNotFound,

    #[error("Verse already exists")]
    VerseAlreadyExists,

    #[error("Group not found")]
    GroupNotFound,

    #[error("Not a member of this group")]
    NotGroupMember,

    #[error("Invalid invite code")]
    InvalidInviteCode,

    #[error("Invalid login code")]
    InvalidLoginCode,

    #[error("Login code expired")]
    LoginCodeExpired,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Perfect attempt already recorded for this verse. Try again in {hours} hour(s).")]
    CooldownActive { hours: i64 },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotAuthenticated => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            ApiError::UserNotFound | ApiError::VerseNotFound | ApiError::GroupNotFound => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            ApiError::InvalidInviteCode => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::NotGroupMember => (StatusCode::FORBIDDEN, self.to_string()),
            ApiError::VerseAlreadyExists => (StatusCode::CONFLICT, self.to_string()),
            ApiError::InvalidLoginCode
            | ApiError::LoginCodeExpired
            | ApiError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::CooldownActive { .. } => {
                (StatusCode::TOO_MANY_REQUESTS, self.to_string())
            }
            ApiError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

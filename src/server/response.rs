use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::Error;

/// API error that converts to a proper HTTP response.
///
/// The status code is authoritative; the `ok` field in the body is a
/// convenience echo for callers that branch on it.
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "ok": false, "msg": self.message });
        (self.status, Json(body)).into_response()
    }
}

/// Fallback conversion for `?` on store and dispatcher results. Handlers
/// that want a more specific message map the error themselves first.
impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::BadRequest(msg) => ApiError::bad_request(msg),
            Error::NothingToSend => ApiError::bad_request("No subscribers to send to"),
            Error::Unauthorized => ApiError::unauthorized("Authentication required"),
            Error::Forbidden => ApiError::forbidden("Admin access required"),
            Error::NotFound => ApiError::not_found("Not found"),
            Error::AlreadyExists => ApiError::conflict("Already exists"),
            Error::Conflict(msg) => ApiError::conflict(msg),
            other => {
                // Unexpected failures collapse to a generic 500; the cause
                // stays in the server log.
                tracing::error!("internal error: {other}");
                ApiError::internal("Internal server error")
            }
        }
    }
}

/// Extension for Option types from store operations.
pub trait StoreOptionExt<T> {
    fn or_not_found(self, message: &'static str) -> Result<T, ApiError>;
}

impl<T> StoreOptionExt<T> for Option<T> {
    fn or_not_found(self, message: &'static str) -> Result<T, ApiError> {
        self.ok_or_else(|| ApiError::not_found(message))
    }
}

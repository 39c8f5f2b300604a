//! Error codes shared by every service and the JSON error response.
//!
//! DESIGN
//! ======
//! Each module owns a `thiserror` enum and implements [`ErrorCode`] for it.
//! Route handlers convert any of them into [`ApiError`], which renders a
//! flat `{code, message, retryable}` body with the mapped HTTP status.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Grepable error code, HTTP status, and retryable flag.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    fn retryable(&self) -> bool {
        false
    }
}

/// JSON body for error responses.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    pub retryable: bool,
}

/// Response-side error wrapper for route handlers.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn from_code(err: &(impl ErrorCode + ?Sized)) -> Self {
        Self {
            status: err.status(),
            body: ErrorBody { code: err.error_code(), message: err.to_string(), retryable: err.retryable() },
        }
    }

    #[must_use]
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody { code, message: message.into(), retryable: false },
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorBody { code: "E_INTERNAL", message: message.into(), retryable: true },
        }
    }
}

impl<E: ErrorCode> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self::from_code(&err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = self.body.code, message = %self.body.message, "request failed");
        } else {
            tracing::debug!(code = self.body.code, message = %self.body.message, "request rejected");
        }
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

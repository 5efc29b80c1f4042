//! Application error taxonomy and its HTTP mapping.
//!
//! DESIGN
//! ======
//! Every failure a caller can observe collapses into one of five kinds:
//! auth, validation, format, not-found and remote. Handlers return
//! `Result<_, AppError>`; the `IntoResponse` impl renders a `{code, message}`
//! body so the front end can show a transient notification and keep its
//! stale data on screen. Nothing here retries.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use crate::data::DataError;

/// Stable machine-readable error code for client notifications.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("authentication required")]
    Auth,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Format(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("remote service error: {0}")]
    Remote(String),
}

impl ErrorCode for AppError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Auth => "E_AUTH",
            Self::Validation(_) => "E_VALIDATION",
            Self::Format(_) => "E_FORMAT",
            Self::NotFound(_) => "E_NOT_FOUND",
            Self::Remote(_) => "E_REMOTE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl AppError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Auth => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Format(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Remote(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<DataError> for AppError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::NotFound(id) => Self::NotFound(id.to_string()),
            DataError::Conflict(msg) => Self::Validation(msg),
            other => {
                tracing::error!(error = %other, "data service call failed");
                Self::Remote(other.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "code": self.error_code(),
            "message": self.to_string(),
            "retryable": self.retryable(),
        });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

//! Axum-specific error types and mappings.
//!
//! Maps engine and cookie-store errors to HTTP status codes and a JSON
//! response body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use mediagrab_core::download::DownloadError;
use mediagrab_download::CookieError;

/// Axum-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request (invalid input, or an operation that cannot proceed).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Conflict (resource already exists).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = ErrorBody {
            error: message,
            status: status.as_u16(),
        };
        (status, axum::Json(body)).into_response()
    }
}

impl From<DownloadError> for HttpError {
    fn from(err: DownloadError) -> Self {
        match err {
            DownloadError::SessionNotFound { .. } => Self::NotFound(err.to_string()),
            DownloadError::CookieNotFound { .. }
            | DownloadError::InvalidMediaKind { .. }
            | DownloadError::Extraction { .. }
            | DownloadError::NotReady => Self::BadRequest(err.to_string()),
            DownloadError::FileMissing => Self::NotFound(err.to_string()),
            DownloadError::Io { .. } => Self::Internal(err.to_string()),
        }
    }
}

impl From<CookieError> for HttpError {
    fn from(err: CookieError) -> Self {
        match err {
            CookieError::NotFound { .. } => Self::NotFound(err.to_string()),
            CookieError::InvalidExtension | CookieError::EmptyFile => {
                Self::BadRequest(err.to_string())
            }
            CookieError::AlreadyExists { .. } => Self::Conflict(err.to_string()),
            CookieError::Io(_) => Self::Internal(err.to_string()),
        }
    }
}

//! Download error types.
//!
//! Configuration errors are reported synchronously at request time; job
//! failures travel through the session snapshot and the event stream
//! instead, so only the former need rich variants here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for download operations.
///
/// Designed to be serializable across transport boundaries without
/// depending on non-serializable types like `std::io::Error`.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum DownloadError {
    /// A named cookie file does not exist in the store.
    #[error("Cookie file '{name}' not found")]
    CookieNotFound {
        /// The logical cookie name that failed to resolve.
        name: String,
    },

    /// The requested media kind is not one of video/audio/photo.
    #[error("Unknown media kind: {value}")]
    InvalidMediaKind {
        /// The rejected input.
        value: String,
    },

    /// No session with the given ID exists.
    #[error("Session not found: {id}")]
    SessionNotFound {
        /// The unknown session ID as given by the caller.
        id: String,
    },

    /// The extraction capability failed; the message is its raw text.
    #[error("{message}")]
    Extraction {
        /// Opaque failure text from the extractor.
        message: String,
    },

    /// No candidate artifact existed on disk after the job finished.
    #[error("Downloaded file not found")]
    FileMissing,

    /// The session's artifact is not available to retrieve (yet).
    #[error("File not ready")]
    NotReady,

    /// I/O error during file operations.
    #[error("I/O error ({kind}): {message}")]
    Io {
        /// The kind of I/O error (e.g. "NotFound", "PermissionDenied").
        kind: String,
        /// Detailed error message.
        message: String,
    },
}

impl DownloadError {
    /// Create a cookie-not-found error.
    pub fn cookie_not_found(name: impl Into<String>) -> Self {
        Self::CookieNotFound { name: name.into() }
    }

    /// Create an invalid-media-kind error.
    pub fn invalid_media_kind(value: impl Into<String>) -> Self {
        Self::InvalidMediaKind {
            value: value.into(),
        }
    }

    /// Create a session-not-found error.
    pub fn session_not_found(id: impl std::fmt::Display) -> Self {
        Self::SessionNotFound { id: id.to_string() }
    }

    /// Create an extraction error from opaque failure text.
    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction {
            message: message.into(),
        }
    }

    /// Create an I/O error from a `std::io::Error`.
    #[must_use]
    pub fn from_io_error(err: &std::io::Error) -> Self {
        Self::Io {
            kind: format!("{:?}", err.kind()),
            message: err.to_string(),
        }
    }
}

/// Convenience result type for download operations.
pub type DownloadResult<T> = Result<T, DownloadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_captures_kind() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = DownloadError::from_io_error(&io_err);
        match err {
            DownloadError::Io { kind, message } => {
                assert_eq!(kind, "NotFound");
                assert!(message.contains("gone"));
            }
            _ => panic!("expected Io variant"),
        }
    }

    #[test]
    fn error_serialization_roundtrip() {
        let err = DownloadError::cookie_not_found("work");
        let json = serde_json::to_string(&err).unwrap();
        let parsed: DownloadError = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, err);
    }
}

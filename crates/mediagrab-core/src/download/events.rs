//! Download events - discriminated union for all session state changes.

use super::types::{SessionId, SessionSnapshot};
use serde::{Deserialize, Serialize};

/// Single discriminated union for all download events.
///
/// Every event is tagged with the session ID so a multi-session client can
/// demultiplex a shared stream. `DownloadComplete` and `DownloadError` are
/// emitted in addition to the final `ProgressUpdate` so clients can trigger
/// UI transitions (e.g. enable the retrieve action) without parsing status
/// text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DownloadEvent {
    /// Periodic snapshot of a session's observable fields.
    ProgressUpdate {
        session_id: SessionId,
        status: super::DownloadStatus,
        /// Percent rounded to one decimal place.
        progress: f64,
        speed: String,
        eta: String,
        file_size: String,
        downloaded: String,
        filename: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// The session finished and its artifact is ready to retrieve.
    DownloadComplete {
        session_id: SessionId,
        filename: String,
    },

    /// The session failed; `error` carries the classified message.
    DownloadError {
        session_id: SessionId,
        error: String,
    },

    /// Cancellation was requested for the session.
    DownloadCancelled { session_id: SessionId },
}

impl DownloadEvent {
    /// Build a progress event from a snapshot, rounding the percentage.
    #[must_use]
    pub fn progress(snapshot: &SessionSnapshot) -> Self {
        Self::ProgressUpdate {
            session_id: snapshot.session_id,
            status: snapshot.status,
            progress: (snapshot.progress * 10.0).round() / 10.0,
            speed: snapshot.speed.clone(),
            eta: snapshot.eta.clone(),
            file_size: snapshot.file_size.clone(),
            downloaded: snapshot.downloaded.clone(),
            filename: snapshot.filename.clone(),
            error: snapshot.error.clone(),
        }
    }

    /// Build a completion event.
    pub fn complete(session_id: SessionId, filename: impl Into<String>) -> Self {
        Self::DownloadComplete {
            session_id,
            filename: filename.into(),
        }
    }

    /// Build an error event.
    pub fn failed(session_id: SessionId, error: impl Into<String>) -> Self {
        Self::DownloadError {
            session_id,
            error: error.into(),
        }
    }

    /// Build a cancellation event.
    #[must_use]
    pub const fn cancelled(session_id: SessionId) -> Self {
        Self::DownloadCancelled { session_id }
    }

    /// The session this event belongs to.
    #[must_use]
    pub const fn session_id(&self) -> SessionId {
        match self {
            Self::ProgressUpdate { session_id, .. }
            | Self::DownloadComplete { session_id, .. }
            | Self::DownloadError { session_id, .. }
            | Self::DownloadCancelled { session_id } => *session_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::DownloadStatus;
    use super::*;

    fn snapshot() -> SessionSnapshot {
        SessionSnapshot {
            session_id: SessionId::new(),
            status: DownloadStatus::Downloading,
            progress: 42.3456,
            speed: "1.2 MB/s".to_string(),
            eta: "00:31".to_string(),
            file_size: "120.0 MB".to_string(),
            downloaded: "50.8 MB".to_string(),
            filename: "clip.mp4".to_string(),
            error: None,
        }
    }

    #[test]
    fn progress_event_rounds_percentage() {
        let event = DownloadEvent::progress(&snapshot());
        match event {
            DownloadEvent::ProgressUpdate { progress, .. } => {
                assert!((progress - 42.3).abs() < f64::EPSILON);
            }
            _ => panic!("expected ProgressUpdate"),
        }
    }

    #[test]
    fn events_carry_their_session_id() {
        let id = SessionId::new();
        assert_eq!(DownloadEvent::cancelled(id).session_id(), id);
        assert_eq!(DownloadEvent::complete(id, "a.mp4").session_id(), id);
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let id = SessionId::new();
        let json = serde_json::to_value(DownloadEvent::failed(id, "boom")).unwrap();
        assert_eq!(json["type"], "download_error");
        assert_eq!(json["error"], "boom");
        assert_eq!(json["session_id"], id.to_string());
    }
}

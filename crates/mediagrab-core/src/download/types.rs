//! Core domain types for download sessions.
//!
//! Pure data types with no I/O dependencies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque identifier for a download session.
///
/// Generated once per submitted download and used to track, cancel, and
/// retrieve it afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a fresh random session ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// The kind of media a caller asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// Merged video + audio.
    Video,
    /// Audio track only, transcoded after extraction.
    Audio,
    /// A single image asset.
    Photo,
}

impl MediaKind {
    /// Canonical string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Photo => "photo",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(Self::Video),
            "audio" => Ok(Self::Audio),
            "photo" => Ok(Self::Photo),
            _ => Err(()),
        }
    }
}

/// Status of a download session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    /// Registered, job task not yet running.
    Queued,
    /// Job task started, extractor not yet producing progress.
    Starting,
    /// Transfer in flight, driven by progress callbacks.
    Downloading,
    /// Transfer done, post-processing (merge/transcode) may still run.
    Processing,
    /// Artifact resolved on disk.
    Completed,
    /// Terminal failure.
    Error,
    /// Cancellation requested; advisory only (see the runner docs).
    Cancelled,
}

impl DownloadStatus {
    /// Canonical string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Starting => "starting",
            Self::Downloading => "downloading",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether this status ends the session's trajectory.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error | Self::Cancelled)
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Observable state of a download session at one point in time.
///
/// This is what pollers get back and what progress events carry. Sizes,
/// speed, and ETA are human-readable strings ("N/A" when unknown) so
/// clients can render them verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub status: DownloadStatus,
    /// Percent complete, within [0, 100].
    pub progress: f64,
    pub speed: String,
    pub eta: String,
    pub file_size: String,
    pub downloaded: String,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Retry budget for the extractor, per failure class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Transport-level (HTTP) retries.
    pub transport: u32,
    /// Per-fragment retries.
    pub fragment: u32,
    /// Extractor-level retries.
    pub extractor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            transport: 20,
            fragment: 20,
            extractor: 10,
        }
    }
}

/// What to extract, with kind-specific parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchMode {
    /// Download and merge the selected video/audio streams.
    Video {
        /// Extractor format selector string.
        format_selector: String,
    },
    /// Best audio stream, transcoded after extraction.
    Audio {
        /// Target codec for the post-extraction transcode.
        codec: String,
        /// Target bitrate in kbit/s.
        bitrate: String,
    },
    /// Best single image asset, no metadata/thumbnail side-writes.
    Photo,
}

impl FetchMode {
    /// The media kind this mode corresponds to.
    #[must_use]
    pub const fn media_kind(&self) -> MediaKind {
        match self {
            Self::Video { .. } => MediaKind::Video,
            Self::Audio { .. } => MediaKind::Audio,
            Self::Photo => MediaKind::Photo,
        }
    }
}

/// Merged option set for one extraction job.
///
/// Built fresh for every job from platform policy, cookie selection, and the
/// requested media kind/quality. Never persisted or shared across jobs.
///
/// `headers` is insertion-ordered with later entries having already replaced
/// earlier ones for the same key; the merge precedence is user-agent, then
/// platform extra headers, then referer.
#[derive(Clone, Debug)]
pub struct FetchConfig {
    pub mode: FetchMode,
    pub headers: Vec<(String, String)>,
    pub cookie_file: Option<PathBuf>,
    /// Warning-level policy note surfaced when a cookie-mandatory platform
    /// has no cookies available. Informational, never blocks the job.
    pub cookie_note: Option<String>,
    /// Output path template handed to the extractor.
    pub output_template: String,
    pub retries: RetryPolicy,
    pub concurrent_fragments: u32,
    pub socket_timeout_secs: u64,
    /// Single-item mode: never expand playlists.
    pub no_playlist: bool,
    /// Location of the bundled ffmpeg, when discoverable.
    pub ffmpeg_location: Option<PathBuf>,
}

impl FetchConfig {
    /// Look up a merged header by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_roundtrips_through_display() {
        let id = SessionId::new();
        let parsed: SessionId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn media_kind_parse() {
        assert_eq!("video".parse::<MediaKind>(), Ok(MediaKind::Video));
        assert_eq!("photo".parse::<MediaKind>(), Ok(MediaKind::Photo));
        assert!("gif".parse::<MediaKind>().is_err());
    }

    #[test]
    fn terminal_statuses() {
        assert!(DownloadStatus::Completed.is_terminal());
        assert!(DownloadStatus::Error.is_terminal());
        assert!(DownloadStatus::Cancelled.is_terminal());
        assert!(!DownloadStatus::Downloading.is_terminal());
        assert!(!DownloadStatus::Processing.is_terminal());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&DownloadStatus::Downloading).unwrap();
        assert_eq!(json, "\"downloading\"");
    }
}

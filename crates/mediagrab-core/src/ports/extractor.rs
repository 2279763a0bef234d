//! Extraction capability port.
//!
//! The actual media extraction and network fetching live behind this trait.
//! The core treats extractor failure text as opaque: classification happens
//! downstream on the raw message, and no typed taxonomy is assumed from the
//! implementation.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::download::FetchConfig;

/// Metadata about a piece of media, returned by a pre-flight probe.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MediaProbe {
    pub title: String,
    pub duration_seconds: u64,
    pub uploader: String,
    pub thumbnail: String,
    pub description: String,
    /// Available renditions with a video stream and a known height.
    pub renditions: Vec<Rendition>,
}

/// One downloadable rendition of a media item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rendition {
    pub format_id: String,
    pub height: u32,
    pub ext: String,
    pub filesize: Option<u64>,
}

/// A progress notification from an in-flight fetch.
///
/// Frames arrive synchronously on the fetch's own execution context and
/// must be handled without blocking significantly.
#[derive(Clone, Debug, PartialEq)]
pub enum ProgressFrame {
    /// Bytes are moving.
    Downloading {
        /// Basename of the file currently being written, when known.
        filename: Option<String>,
        downloaded: u64,
        /// Total size; `None` while the extractor has no estimate.
        total: Option<u64>,
        /// Preformatted transfer rate, when the extractor reports one.
        speed: Option<String>,
        /// Preformatted time remaining, when the extractor reports one.
        eta: Option<String>,
    },
    /// Transfer finished; post-processing may still follow. `path` is the
    /// tentative output path whose extension may change during remux or
    /// transcode.
    Finished { path: PathBuf },
}

/// Callback invoked for every progress frame.
pub type ProgressSink = Box<dyn Fn(ProgressFrame) + Send + Sync>;

/// Result of a completed fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchOutcome {
    /// The output path the extractor intended to write. The artifact that
    /// actually lands on disk may carry a different extension.
    pub requested_path: PathBuf,
}

/// Errors from the extraction capability.
///
/// `Display` yields the raw failure text; callers classify on that string.
#[derive(Debug, Error)]
pub enum ExtractorError {
    /// The extractor process could not be launched at all.
    #[error("failed to launch extractor: {0}")]
    Spawn(String),

    /// The extraction itself failed; the message is opaque upstream text.
    #[error("{0}")]
    Failed(String),
}

/// Port for probing and fetching media.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Fetch metadata for a URL without downloading.
    async fn probe(&self, url: &str, config: &FetchConfig) -> Result<MediaProbe, ExtractorError>;

    /// Perform the download, invoking `on_progress` for every frame the
    /// underlying tool reports. Returns once the extractor (including any
    /// post-processing it performs) has exited.
    async fn fetch(
        &self,
        url: &str,
        config: &FetchConfig,
        on_progress: ProgressSink,
    ) -> Result<FetchOutcome, ExtractorError>;
}

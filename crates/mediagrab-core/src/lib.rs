//! Core domain types and port definitions for mediagrab.
//!
//! This crate holds the pure download domain (types, events, errors), the
//! platform policy registry, and the port traits implemented by adapters.
//! It performs no I/O of its own.

pub mod download;
pub mod platform;
pub mod ports;
pub mod util;

// Re-export commonly used types for convenience
pub use download::{
    DownloadError, DownloadEvent, DownloadResult, DownloadStatus, FetchConfig, FetchMode,
    MediaKind, RetryPolicy, SessionId, SessionSnapshot,
};
pub use platform::{PlatformConfig, resolve_platform};
pub use ports::{
    ActivityKind, ActivityLog, ActivityLogError, ActivityRecord, CallerId, DownloadEventSink,
    Extractor, ExtractorError, FetchOutcome, MediaProbe, NoopActivityLog, NoopEventSink,
    ProgressFrame, ProgressSink, Rendition,
};

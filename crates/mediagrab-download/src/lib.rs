//! Download orchestration engine.
//!
//! Wires platform policy, cookie selection, and media-kind options into
//! per-job fetch configurations, tracks one in-memory session per submitted
//! download, runs each job on a detached task, and publishes progress and
//! terminal events through the injected event sink.

// Re-export core types for convenience
pub use mediagrab_core::download::{
    DownloadError, DownloadEvent, DownloadStatus, FetchConfig, FetchMode, MediaKind, SessionId,
    SessionSnapshot,
};

mod classify;
mod config;
mod cookies;
mod engine;
mod options;
mod progress;
mod runner;
mod session;
pub mod ytdlp;

pub use classify::classify_failure;
pub use config::EngineConfig;
pub use cookies::{CookieError, CookieRecord, CookieStore};
pub use engine::{DownloadEngine, DownloadEngineDeps, build_engine};
pub use options::{
    AdvisoryLevel, PlatformAdvisory, build_fetch_config, build_video_selector, check_requirements,
    ffmpeg_available,
};
pub use progress::ProgressThrottle;
pub use session::{Session, SessionRegistry};
pub use ytdlp::YtDlpExtractor;

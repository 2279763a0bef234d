//! Download domain: session types, events, and errors.

mod errors;
mod events;
mod types;

pub use errors::{DownloadError, DownloadResult};
pub use events::DownloadEvent;
pub use types::{
    DownloadStatus, FetchConfig, FetchMode, MediaKind, RetryPolicy, SessionId, SessionSnapshot,
};

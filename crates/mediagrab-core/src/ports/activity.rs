//! Activity log sink port.
//!
//! Download start/completion/failure records for attributed callers go
//! through this port. Recording is strictly best-effort: failures are
//! logged by the caller and never surfaced to the user or allowed to delay
//! the download itself.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity of an authenticated caller, used for attribution only.
///
/// The core never authenticates anyone; it receives this value from the
/// serving layer when one is available.
pub type CallerId = i64;

/// What happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    DownloadStarted,
    DownloadCompleted,
    DownloadFailed,
}

/// One activity record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub kind: ActivityKind,
    pub url: String,
    pub format: String,
    pub quality: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub status: String,
}

/// Error from an activity sink. Callers swallow these.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ActivityLogError(pub String);

/// Port for recording caller activity.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    /// Record one activity for the given caller.
    async fn record(&self, caller: CallerId, record: ActivityRecord)
    -> Result<(), ActivityLogError>;
}

/// An activity sink that discards everything.
///
/// Used in tests and in deployments without a persistence layer wired in.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopActivityLog;

#[async_trait]
impl ActivityLog for NoopActivityLog {
    async fn record(
        &self,
        _caller: CallerId,
        _record: ActivityRecord,
    ) -> Result<(), ActivityLogError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_sink_accepts_records() {
        let sink = NoopActivityLog;
        let record = ActivityRecord {
            kind: ActivityKind::DownloadStarted,
            url: "https://youtube.com/watch?v=x".to_string(),
            format: "video".to_string(),
            quality: "720p".to_string(),
            filename: None,
            status: "started".to_string(),
        };
        assert!(sink.record(1, record).await.is_ok());
    }
}

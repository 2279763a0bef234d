//! In-memory download session registry.
//!
//! The registry owns every session's mutable progress state. Each session
//! is written by exactly one job task; the serving layer only reads
//! snapshots and sets the cancellation flag. The registry map itself is
//! behind an async `RwLock`; per-session state sits behind a short
//! critical-section `std::sync::Mutex` so the extractor's synchronous
//! progress callbacks can write it without an executor handle.
//!
//! Sessions are never removed: their lifetime is the process lifetime.
//! A production deployment would evict terminal sessions after a TTL.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::RwLock;

use mediagrab_core::download::{DownloadStatus, SessionId, SessionSnapshot};
use mediagrab_core::util::format_bytes;

/// Mutable state of one download session.
#[derive(Debug)]
struct SessionState {
    status: DownloadStatus,
    progress: f64,
    speed: String,
    eta: String,
    file_size: String,
    downloaded: String,
    filename: String,
    file_path: Option<PathBuf>,
    error: Option<String>,
    cookie_file: Option<PathBuf>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            status: DownloadStatus::Queued,
            progress: 0.0,
            speed: "N/A".to_string(),
            eta: "N/A".to_string(),
            file_size: "N/A".to_string(),
            downloaded: "0 B".to_string(),
            filename: String::new(),
            file_path: None,
            error: None,
            cookie_file: None,
        }
    }
}

/// Handle to one download session.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    state: Mutex<SessionState>,
}

impl Session {
    fn new(id: SessionId) -> Self {
        Self {
            id,
            state: Mutex::new(SessionState::new()),
        }
    }

    /// The session's identifier.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Copy out the observable fields.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().expect("session state lock poisoned");
        SessionSnapshot {
            session_id: self.id,
            status: state.status,
            progress: state.progress,
            speed: state.speed.clone(),
            eta: state.eta.clone(),
            file_size: state.file_size.clone(),
            downloaded: state.downloaded.clone(),
            filename: state.filename.clone(),
            error: state.error.clone(),
        }
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> DownloadStatus {
        self.state.lock().expect("session state lock poisoned").status
    }

    /// Resolved artifact path, set on completion.
    #[must_use]
    pub fn file_path(&self) -> Option<PathBuf> {
        self.state
            .lock()
            .expect("session state lock poisoned")
            .file_path
            .clone()
    }

    /// Cookie file the job was launched with, for diagnostics.
    #[must_use]
    pub fn cookie_file(&self) -> Option<PathBuf> {
        self.state
            .lock()
            .expect("session state lock poisoned")
            .cookie_file
            .clone()
    }

    pub(crate) fn set_status(&self, status: DownloadStatus) {
        self.state.lock().expect("session state lock poisoned").status = status;
    }

    pub(crate) fn set_cookie_file(&self, cookie_file: Option<PathBuf>) {
        self.state
            .lock()
            .expect("session state lock poisoned")
            .cookie_file = cookie_file;
    }

    /// Apply one transfer progress callback.
    ///
    /// Percent is downloaded/total when the total is known; otherwise the
    /// last known value is retained rather than reset. The status is set
    /// to `downloading` unconditionally, which is also why a cancelled
    /// flag does not stop in-flight updates (documented limitation).
    pub(crate) fn record_transfer(
        &self,
        filename: Option<&str>,
        downloaded: u64,
        total: Option<u64>,
        speed: Option<&str>,
        eta: Option<&str>,
    ) {
        let mut state = self.state.lock().expect("session state lock poisoned");
        state.status = DownloadStatus::Downloading;
        if let Some(name) = filename {
            state.filename = name.to_string();
        }
        #[allow(clippy::cast_precision_loss)]
        if let Some(total) = total.filter(|t| *t > 0) {
            state.progress = (downloaded as f64 / total as f64 * 100.0).min(100.0);
        }
        state.file_size = format_bytes(total);
        state.downloaded = format_bytes(Some(downloaded));
        state.speed = speed.unwrap_or("N/A").to_string();
        state.eta = eta.unwrap_or("N/A").to_string();
    }

    /// The transfer finished; post-processing may still be running.
    pub(crate) fn record_processing(&self, tentative_path: &Path) {
        let mut state = self.state.lock().expect("session state lock poisoned");
        state.status = DownloadStatus::Processing;
        state.progress = 100.0;
        state.file_path = Some(tentative_path.to_path_buf());
    }

    pub(crate) fn record_completed(&self, path: PathBuf, filename: String) {
        let mut state = self.state.lock().expect("session state lock poisoned");
        state.status = DownloadStatus::Completed;
        state.progress = 100.0;
        state.file_path = Some(path);
        state.filename = filename;
    }

    pub(crate) fn record_error(&self, message: String) {
        let mut state = self.state.lock().expect("session state lock poisoned");
        state.status = DownloadStatus::Error;
        state.error = Some(message);
    }
}

/// Registry of all sessions created since process start.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<Session>>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh session in the initial state.
    pub async fn create(&self) -> Arc<Session> {
        let session = Arc::new(Session::new(SessionId::new()));
        self.sessions
            .write()
            .await
            .insert(session.id(), Arc::clone(&session));
        session
    }

    /// Look up a session by ID.
    pub async fn get(&self, id: SessionId) -> Option<Arc<Session>> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Flag a session as cancelled.
    ///
    /// Best-effort: the underlying job keeps running and later progress
    /// callbacks still update the stored state. Returns false when the
    /// session does not exist.
    pub async fn mark_cancelled(&self, id: SessionId) -> bool {
        match self.get(id).await {
            Some(session) => {
                session.set_status(DownloadStatus::Cancelled);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_starts_queued() {
        let registry = SessionRegistry::new();
        let session = registry.create().await;
        let snapshot = session.snapshot();
        assert_eq!(snapshot.status, DownloadStatus::Queued);
        assert!((snapshot.progress - 0.0).abs() < f64::EPSILON);
        assert_eq!(snapshot.downloaded, "0 B");
        assert_eq!(snapshot.eta, "N/A");
    }

    #[tokio::test]
    async fn get_returns_same_session() {
        let registry = SessionRegistry::new();
        let session = registry.create().await;
        let found = registry.get(session.id()).await.unwrap();
        assert_eq!(found.id(), session.id());
        assert!(registry.get(SessionId::new()).await.is_none());
    }

    #[tokio::test]
    async fn cancel_is_a_flag_only() {
        let registry = SessionRegistry::new();
        let session = registry.create().await;
        assert!(registry.mark_cancelled(session.id()).await);
        assert_eq!(session.status(), DownloadStatus::Cancelled);

        // A late progress callback still lands and moves the status
        session.record_transfer(Some("clip.mp4"), 10, Some(100), None, None);
        assert_eq!(session.status(), DownloadStatus::Downloading);

        assert!(!registry.mark_cancelled(SessionId::new()).await);
    }

    #[test]
    fn transfer_updates_keep_percent_without_total() {
        let session = Session::new(SessionId::new());
        session.record_transfer(None, 50, Some(200), Some("1 MB/s"), Some("00:10"));
        let snapshot = session.snapshot();
        assert!((snapshot.progress - 25.0).abs() < f64::EPSILON);
        assert_eq!(snapshot.speed, "1 MB/s");

        // No total: percent retains its last value instead of resetting
        session.record_transfer(None, 80, None, None, None);
        let snapshot = session.snapshot();
        assert!((snapshot.progress - 25.0).abs() < f64::EPSILON);
        assert_eq!(snapshot.file_size, "N/A");
    }

    #[test]
    fn percent_is_clamped_and_monotonic_for_monotonic_bytes() {
        let session = Session::new(SessionId::new());
        let mut last = 0.0;
        for downloaded in [0u64, 10, 40, 90, 100, 150] {
            session.record_transfer(None, downloaded, Some(100), None, None);
            let progress = session.snapshot().progress;
            assert!(progress >= last);
            assert!((0.0..=100.0).contains(&progress));
            last = progress;
        }
        assert!((last - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn processing_pins_percent_to_full() {
        let session = Session::new(SessionId::new());
        session.record_transfer(None, 10, Some(100), None, None);
        session.record_processing(Path::new("/tmp/out.webm"));
        let snapshot = session.snapshot();
        assert_eq!(snapshot.status, DownloadStatus::Processing);
        assert!((snapshot.progress - 100.0).abs() < f64::EPSILON);
        assert_eq!(session.file_path(), Some(PathBuf::from("/tmp/out.webm")));
    }
}

//! Download engine facade.
//!
//! The composition point for the orchestration crate: owns the session
//! registry and cookie store, holds the injected ports, and exposes the
//! transport-agnostic operations the serving layer calls.

use std::path::PathBuf;
use std::sync::Arc;

use mediagrab_core::download::{
    DownloadError, DownloadEvent, DownloadStatus, MediaKind, SessionId, SessionSnapshot,
};
use mediagrab_core::platform::resolve_platform;
use mediagrab_core::ports::{
    ActivityKind, ActivityLog, ActivityRecord, CallerId, DownloadEventSink, Extractor, MediaProbe,
};

use crate::classify::classify_failure;
use crate::config::EngineConfig;
use crate::cookies::CookieStore;
use crate::options::{PlatformAdvisory, build_fetch_config, check_requirements};
use crate::runner::{JobRequest, run_job};
use crate::session::SessionRegistry;

/// Dependencies for creating a download engine.
pub struct DownloadEngineDeps {
    /// Directory layout the engine operates on.
    pub config: EngineConfig,
    /// The extraction capability.
    pub extractor: Arc<dyn Extractor>,
    /// Sink for session events.
    pub events: Arc<dyn DownloadEventSink>,
    /// Sink for caller activity records.
    pub activity: Arc<dyn ActivityLog>,
}

/// Build a download engine from its dependencies.
#[must_use]
pub fn build_engine(deps: DownloadEngineDeps) -> DownloadEngine {
    DownloadEngine::new(deps)
}

/// The download orchestration engine.
pub struct DownloadEngine {
    config: EngineConfig,
    registry: SessionRegistry,
    cookies: CookieStore,
    extractor: Arc<dyn Extractor>,
    events: Arc<dyn DownloadEventSink>,
    activity: Arc<dyn ActivityLog>,
}

impl DownloadEngine {
    fn new(deps: DownloadEngineDeps) -> Self {
        let cookies = CookieStore::new(
            deps.config.cookie_dir.clone(),
            deps.config.default_cookie_file.clone(),
        );
        Self {
            config: deps.config,
            registry: SessionRegistry::new(),
            cookies,
            extractor: deps.extractor,
            events: deps.events,
            activity: deps.activity,
        }
    }

    /// The engine's directory layout.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The cookie store, for upload/list/delete operations.
    #[must_use]
    pub fn cookies(&self) -> &CookieStore {
        &self.cookies
    }

    pub(crate) fn extractor(&self) -> &Arc<dyn Extractor> {
        &self.extractor
    }

    pub(crate) fn events(&self) -> &Arc<dyn DownloadEventSink> {
        &self.events
    }

    pub(crate) fn activity(&self) -> &Arc<dyn ActivityLog> {
        &self.activity
    }

    /// Pre-flight metadata lookup.
    ///
    /// Probe failures come back classified, like job failures; the raw
    /// extractor text only lands in the logs.
    pub async fn probe_media(
        &self,
        url: &str,
        cookie_name: Option<&str>,
    ) -> Result<(MediaProbe, PlatformAdvisory), DownloadError> {
        let cookie_file = self.resolve_cookie(cookie_name)?;
        let advisory = check_requirements(url, &self.cookies);

        let config = build_fetch_config(
            &self.config,
            url,
            MediaKind::Video,
            "best",
            cookie_file.as_deref(),
        );

        match self.extractor.probe(url, &config).await {
            Ok(probe) => Ok((probe, advisory)),
            Err(e) => {
                let raw = e.to_string();
                tracing::warn!(url = %url, raw_error = %raw, "Probe failed");
                Err(DownloadError::extraction(classify_failure(
                    resolve_platform(url),
                    &raw,
                )))
            }
        }
    }

    /// Begin an asynchronous download and return its session ID.
    ///
    /// Configuration problems (an unknown cookie name) fail here; anything
    /// that happens after the task is spawned is reported through the
    /// session snapshot and the event stream. The spawned task is never
    /// awaited or joined.
    pub async fn start_download(
        self: &Arc<Self>,
        url: &str,
        kind: MediaKind,
        quality: &str,
        cookie_name: Option<&str>,
        caller: Option<CallerId>,
    ) -> Result<SessionId, DownloadError> {
        let cookie_file = self.resolve_cookie(cookie_name)?;

        if let Some(caller) = caller {
            let record = ActivityRecord {
                kind: ActivityKind::DownloadStarted,
                url: url.to_string(),
                format: kind.to_string(),
                quality: quality.to_string(),
                filename: None,
                status: "started".to_string(),
            };
            if let Err(e) = self.activity.record(caller, record).await {
                tracing::warn!(error = %e, "Activity logging failed");
            }
        }

        let session = self.registry.create().await;
        let id = session.id();
        tracing::info!(session_id = %id, url = %url, kind = %kind, quality = %quality, "Download queued");

        let request = JobRequest {
            url: url.to_string(),
            kind,
            quality: quality.to_string(),
            cookie_file,
            caller,
        };
        tokio::spawn(run_job(Arc::clone(self), session, request));

        Ok(id)
    }

    /// Current observable state of a session.
    pub async fn snapshot(&self, id: SessionId) -> Result<SessionSnapshot, DownloadError> {
        self.registry
            .get(id)
            .await
            .map(|s| s.snapshot())
            .ok_or_else(|| DownloadError::session_not_found(id))
    }

    /// Flag a session as cancelled and notify subscribers.
    ///
    /// Advisory only: the in-flight fetch keeps running (the capability
    /// has no cooperative interrupt) and may still complete or fail.
    pub async fn cancel(&self, id: SessionId) -> Result<(), DownloadError> {
        if !self.registry.mark_cancelled(id).await {
            return Err(DownloadError::session_not_found(id));
        }
        tracing::info!(session_id = %id, "Download cancelled");
        self.events.emit(DownloadEvent::cancelled(id));
        Ok(())
    }

    /// Resolve a completed session's artifact for retrieval.
    ///
    /// Returns the path and download filename, or `NotReady` when the
    /// session has not completed or its file is gone.
    pub async fn artifact(&self, id: SessionId) -> Result<(PathBuf, String), DownloadError> {
        let session = self
            .registry
            .get(id)
            .await
            .ok_or_else(|| DownloadError::session_not_found(id))?;

        if session.status() != DownloadStatus::Completed {
            return Err(DownloadError::NotReady);
        }
        let path = session.file_path().ok_or(DownloadError::NotReady)?;
        if !path.is_file() {
            return Err(DownloadError::NotReady);
        }
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok((path, filename))
    }

    /// Platform advisory for a URL against current cookie availability.
    #[must_use]
    pub fn advisory(&self, url: &str) -> PlatformAdvisory {
        check_requirements(url, &self.cookies)
    }

    /// Map an optional logical cookie name to a verified file path.
    fn resolve_cookie(&self, name: Option<&str>) -> Result<Option<PathBuf>, DownloadError> {
        match name {
            None | Some("") => Ok(None),
            Some(name) => self
                .cookies
                .resolve(name)
                .map(Some)
                .map_err(|_| DownloadError::cookie_not_found(name)),
        }
    }
}

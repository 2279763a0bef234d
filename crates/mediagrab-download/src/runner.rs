//! Download job execution.
//!
//! One detached task per submitted download. The task drives the session
//! state machine (`queued → starting → downloading → processing →
//! completed | error`), forwards extractor progress frames to the event
//! sink, resolves the finished artifact among extension candidates, and
//! classifies failures.
//!
//! Cancellation is advisory: the extraction capability offers no
//! cooperative interrupt, so a cancelled session keeps receiving state
//! updates until the underlying job ends on its own.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::Rng;

use mediagrab_core::download::{DownloadEvent, MediaKind};
use mediagrab_core::platform::resolve_platform;
use mediagrab_core::ports::{
    ActivityKind, ActivityRecord, CallerId, ProgressFrame, ProgressSink,
};

use crate::classify::classify_failure;
use crate::engine::DownloadEngine;
use crate::options::{build_fetch_config, check_requirements};
use crate::progress::ProgressThrottle;
use crate::session::Session;

/// Candidate artifact extensions per media kind. The final artifact's
/// extension may differ from the tentative path after remux or transcode.
const VIDEO_EXTS: [&str; 3] = ["mp4", "mkv", "webm"];
const AUDIO_EXTS: [&str; 2] = ["m4a", "mp3"];
const PHOTO_EXTS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Everything a job task needs, captured at submission time.
pub(crate) struct JobRequest {
    pub url: String,
    pub kind: MediaKind,
    pub quality: String,
    pub cookie_file: Option<PathBuf>,
    pub caller: Option<CallerId>,
}

/// Run one download job to its terminal state.
pub(crate) async fn run_job(
    engine: Arc<DownloadEngine>,
    session: Arc<Session>,
    request: JobRequest,
) {
    session.set_status(mediagrab_core::download::DownloadStatus::Starting);
    session.set_cookie_file(request.cookie_file.clone());

    let advisory = check_requirements(&request.url, engine.cookies());
    tracing::info!(
        session_id = %session.id(),
        level = ?advisory.level,
        "Platform check: {}",
        advisory.message
    );

    // Stagger bursts of simultaneous requests against the same remote host
    let jitter_ms = rand::thread_rng().gen_range(200..=900);
    tokio::time::sleep(Duration::from_millis(jitter_ms)).await;

    let config = build_fetch_config(
        engine.config(),
        &request.url,
        request.kind,
        &request.quality,
        request.cookie_file.as_deref(),
    );
    if let Some(note) = &config.cookie_note {
        tracing::warn!(session_id = %session.id(), "{note}");
    }

    let result = engine
        .extractor()
        .fetch(
            &request.url,
            &config,
            progress_sink(Arc::clone(&session), &engine),
        )
        .await;

    match result {
        Ok(outcome) => {
            match resolve_artifact(&outcome.requested_path, request.kind) {
                Some(path) => finish_success(&engine, &session, &request, path).await,
                None => {
                    finish_failure(&engine, &session, &request, "Downloaded file not found").await;
                }
            }
        }
        Err(e) => finish_failure(&engine, &session, &request, &e.to_string()).await,
    }
}

/// Build the callback handed to the extractor.
///
/// Frames execute synchronously on the fetch's execution context, so the
/// sink only takes short std-mutex critical sections. Transfer frames are
/// throttled; the finished frame always broadcasts.
fn progress_sink(session: Arc<Session>, engine: &Arc<DownloadEngine>) -> ProgressSink {
    let events = Arc::clone(engine.events());
    let throttle = Mutex::new(ProgressThrottle::default_interval());

    Box::new(move |frame| match frame {
        ProgressFrame::Downloading {
            filename,
            downloaded,
            total,
            speed,
            eta,
        } => {
            session.record_transfer(
                filename.as_deref(),
                downloaded,
                total,
                speed.as_deref(),
                eta.as_deref(),
            );
            let should_emit = throttle
                .lock()
                .map(|mut t| t.should_emit())
                .unwrap_or(true);
            if should_emit {
                events.emit(DownloadEvent::progress(&session.snapshot()));
            }
        }
        ProgressFrame::Finished { path } => {
            session.record_processing(&path);
            events.emit(DownloadEvent::progress(&session.snapshot()));
        }
    })
}

async fn finish_success(
    engine: &Arc<DownloadEngine>,
    session: &Arc<Session>,
    request: &JobRequest,
    path: PathBuf,
) {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    session.record_completed(path, filename.clone());
    tracing::info!(session_id = %session.id(), filename = %filename, "Download completed");

    engine
        .events()
        .emit(DownloadEvent::progress(&session.snapshot()));
    engine
        .events()
        .emit(DownloadEvent::complete(session.id(), &filename));

    record_activity(
        engine,
        request,
        ActivityKind::DownloadCompleted,
        Some(filename),
        "completed",
    )
    .await;
}

async fn finish_failure(
    engine: &Arc<DownloadEngine>,
    session: &Arc<Session>,
    request: &JobRequest,
    raw: &str,
) {
    let classified = classify_failure(resolve_platform(&request.url), raw);
    // The raw message stays in the logs; users only see the classified text
    tracing::warn!(
        session_id = %session.id(),
        raw_error = %raw,
        "Download failed: {classified}"
    );

    session.record_error(classified.clone());
    engine
        .events()
        .emit(DownloadEvent::progress(&session.snapshot()));
    engine
        .events()
        .emit(DownloadEvent::failed(session.id(), classified));

    record_activity(engine, request, ActivityKind::DownloadFailed, None, "failed").await;
}

/// Record activity for attributed callers. Best-effort: failures are
/// logged and swallowed, never surfaced.
async fn record_activity(
    engine: &Arc<DownloadEngine>,
    request: &JobRequest,
    kind: ActivityKind,
    filename: Option<String>,
    status: &str,
) {
    let Some(caller) = request.caller else { return };
    let record = ActivityRecord {
        kind,
        url: request.url.clone(),
        format: request.kind.to_string(),
        quality: request.quality.clone(),
        filename,
        status: status.to_string(),
    };
    if let Err(e) = engine.activity().record(caller, record).await {
        tracing::warn!(error = %e, "Activity logging failed");
    }
}

/// Probe candidate paths for the finished artifact and pick the first
/// that exists. Returns `None` when no candidate is on disk.
pub(crate) fn resolve_artifact(tentative: &Path, kind: MediaKind) -> Option<PathBuf> {
    candidate_paths(tentative, kind)
        .into_iter()
        .find(|p| p.is_file())
}

/// Ordered candidates: the tentative path itself, then the tentative path
/// with each plausible extension for the requested media kind.
fn candidate_paths(tentative: &Path, kind: MediaKind) -> Vec<PathBuf> {
    let exts: &[&str] = match kind {
        MediaKind::Video => &VIDEO_EXTS,
        MediaKind::Audio => &AUDIO_EXTS,
        MediaKind::Photo => &PHOTO_EXTS,
    };

    let mut candidates = vec![tentative.to_path_buf()];
    for ext in exts {
        let candidate = tentative.with_extension(ext);
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_start_with_tentative_path() {
        let candidates = candidate_paths(Path::new("/d/clip.webm"), MediaKind::Video);
        assert_eq!(candidates[0], Path::new("/d/clip.webm"));
        assert!(candidates.contains(&PathBuf::from("/d/clip.mp4")));
        assert!(candidates.contains(&PathBuf::from("/d/clip.mkv")));
        // No duplicate when the tentative extension is already a candidate
        assert_eq!(
            candidates
                .iter()
                .filter(|p| **p == PathBuf::from("/d/clip.webm"))
                .count(),
            1
        );
    }

    #[test]
    fn candidates_follow_media_kind() {
        let audio = candidate_paths(Path::new("/d/track.webm"), MediaKind::Audio);
        assert!(audio.contains(&PathBuf::from("/d/track.mp3")));
        assert!(!audio.contains(&PathBuf::from("/d/track.mp4")));

        let photo = candidate_paths(Path::new("/d/pic.bin"), MediaKind::Photo);
        assert!(photo.contains(&PathBuf::from("/d/pic.jpg")));
        assert!(photo.contains(&PathBuf::from("/d/pic.webp")));
    }

    #[test]
    fn resolve_artifact_picks_first_existing_candidate() {
        let tmp = tempfile::TempDir::new().unwrap();
        let tentative = tmp.path().join("clip.webm");
        std::fs::write(tmp.path().join("clip.mkv"), b"x").unwrap();

        let resolved = resolve_artifact(&tentative, MediaKind::Video).unwrap();
        assert_eq!(resolved, tmp.path().join("clip.mkv"));
    }

    #[test]
    fn resolve_artifact_none_when_nothing_on_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        let tentative = tmp.path().join("clip.webm");
        assert!(resolve_artifact(&tentative, MediaKind::Video).is_none());
    }

    #[test]
    fn resolve_artifact_prefers_exact_tentative() {
        let tmp = tempfile::TempDir::new().unwrap();
        let tentative = tmp.path().join("clip.webm");
        std::fs::write(&tentative, b"x").unwrap();
        std::fs::write(tmp.path().join("clip.mp4"), b"x").unwrap();

        let resolved = resolve_artifact(&tentative, MediaKind::Video).unwrap();
        assert_eq!(resolved, tentative);
    }
}

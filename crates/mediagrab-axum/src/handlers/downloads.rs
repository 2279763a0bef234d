//! Download lifecycle handlers: start, poll, cancel, retrieve.

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::Response;
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;

use mediagrab_core::download::{DownloadError, MediaKind, SessionId, SessionSnapshot};

use crate::error::HttpError;
use crate::state::AppState;

/// Request to begin a download.
#[derive(Debug, Deserialize)]
pub struct StartDownloadRequest {
    pub url: String,
    /// Media kind; "video" when omitted.
    #[serde(default = "default_format")]
    pub format: String,
    /// Quality label; "best" when omitted.
    #[serde(default = "default_quality")]
    pub quality: String,
    #[serde(default)]
    pub cookie_file: Option<String>,
}

fn default_format() -> String {
    "video".to_string()
}

fn default_quality() -> String {
    "best".to_string()
}

/// Response from a successful submission.
#[derive(Debug, Serialize)]
pub struct StartDownloadResponse {
    pub session_id: SessionId,
}

/// Begin an asynchronous download; returns immediately with a session ID.
pub async fn start(
    State(state): State<AppState>,
    Json(req): Json<StartDownloadRequest>,
) -> Result<Json<StartDownloadResponse>, HttpError> {
    let url = req.url.trim();
    if url.is_empty() {
        return Err(HttpError::BadRequest("URL is required".to_string()));
    }
    let kind: MediaKind = req
        .format
        .parse()
        .map_err(|()| DownloadError::invalid_media_kind(&req.format))?;

    // No authenticated-caller context on this transport; attribution stays
    // empty and activity records are skipped by the engine.
    let session_id = state
        .engine
        .start_download(url, kind, &req.quality, req.cookie_file.as_deref(), None)
        .await?;

    Ok(Json(StartDownloadResponse { session_id }))
}

/// Poll a session's observable state.
pub async fn snapshot(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> Result<Json<SessionSnapshot>, HttpError> {
    Ok(Json(state.engine.snapshot(id).await?))
}

/// Flag a session as cancelled.
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> Result<(), HttpError> {
    state.engine.cancel(id).await?;
    Ok(())
}

/// Stream a completed session's artifact to the client.
pub async fn retrieve(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> Result<Response, HttpError> {
    let (path, filename) = state.engine.artifact(id).await?;

    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|e| HttpError::Internal(format!("Failed to open artifact: {e}")))?;
    let body = Body::from_stream(ReaderStream::new(file));

    Response::builder()
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(body)
        .map_err(|e| HttpError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_request_defaults() {
        let req: StartDownloadRequest =
            serde_json::from_value(serde_json::json!({"url": "https://youtube.com/watch?v=x"}))
                .unwrap();
        assert_eq!(req.format, "video");
        assert_eq!(req.quality, "best");
        assert!(req.cookie_file.is_none());
    }

    #[test]
    fn start_response_shape() {
        let response = StartDownloadResponse {
            session_id: SessionId::new(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json["session_id"].is_string());
    }
}

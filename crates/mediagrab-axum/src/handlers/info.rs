//! Metadata probe and platform advisory handlers.

use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use mediagrab_core::util::{ellipsize, format_bytes};
use mediagrab_download::PlatformAdvisory;

use crate::error::HttpError;
use crate::state::AppState;

/// Renditions below this height are noise (storyboards, previews).
const MIN_HEIGHT: u32 = 144;

/// How many distinct-height renditions to return.
const MAX_FORMATS: usize = 10;

/// Request for a pre-flight metadata lookup.
#[derive(Debug, Deserialize)]
pub struct VideoInfoRequest {
    pub url: String,
    #[serde(default)]
    pub cookie_file: Option<String>,
}

/// Metadata about a media item, shaped for selection UIs.
#[derive(Debug, Serialize)]
pub struct VideoInfoResponse {
    pub title: String,
    pub duration: u64,
    pub uploader: String,
    pub thumbnail: String,
    /// Capped at 200 characters.
    pub description: String,
    pub formats: Vec<FormatEntry>,
    pub platform_info: PlatformAdvisory,
}

/// One selectable rendition.
#[derive(Debug, Serialize)]
pub struct FormatEntry {
    pub format_id: String,
    /// Height rendered as a quality label, e.g. "720p".
    pub quality: String,
    pub ext: String,
    pub filesize: String,
}

/// Probe a URL without downloading.
pub async fn video_info(
    State(state): State<AppState>,
    Json(req): Json<VideoInfoRequest>,
) -> Result<Json<VideoInfoResponse>, HttpError> {
    if req.url.trim().is_empty() {
        return Err(HttpError::BadRequest("URL is required".to_string()));
    }

    let (probe, advisory) = state
        .engine
        .probe_media(req.url.trim(), req.cookie_file.as_deref())
        .await?;

    // Top distinct heights, largest first
    let mut seen = std::collections::HashSet::new();
    let mut formats: Vec<FormatEntry> = probe
        .renditions
        .iter()
        .filter(|r| r.height >= MIN_HEIGHT)
        .filter(|r| seen.insert(r.height))
        .map(|r| FormatEntry {
            format_id: r.format_id.clone(),
            quality: format!("{}p", r.height),
            ext: r.ext.clone(),
            filesize: format_bytes(r.filesize),
        })
        .collect();
    formats.sort_by(|a, b| {
        let height = |e: &FormatEntry| {
            e.quality
                .trim_end_matches('p')
                .parse::<u32>()
                .unwrap_or(0)
        };
        height(b).cmp(&height(a))
    });
    formats.truncate(MAX_FORMATS);

    Ok(Json(VideoInfoResponse {
        title: probe.title,
        duration: probe.duration_seconds,
        uploader: probe.uploader,
        thumbnail: probe.thumbnail,
        description: ellipsize(&probe.description, 200),
        formats,
        platform_info: advisory,
    }))
}

/// Query parameters for the advisory endpoint.
#[derive(Debug, Deserialize)]
pub struct AdvisoryQuery {
    pub url: String,
}

/// Report a platform's cookie requirements for a URL.
pub async fn platform_advisory(
    State(state): State<AppState>,
    Query(query): Query<AdvisoryQuery>,
) -> Json<PlatformAdvisory> {
    Json(state.engine.advisory(&query.url))
}

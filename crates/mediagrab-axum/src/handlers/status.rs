//! Service status handler.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use mediagrab_download::{CookieRecord, ffmpeg_available};

use crate::state::AppState;

/// Current service capabilities.
#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub cookies_available: bool,
    pub available_cookies: Vec<CookieRecord>,
    pub ffmpeg_available: bool,
    pub notes: Vec<&'static str>,
}

/// Report cookie and tool availability.
pub async fn status(State(state): State<AppState>) -> Json<ServiceStatus> {
    let available_cookies = state.engine.cookies().list();
    Json(ServiceStatus {
        cookies_available: !available_cookies.is_empty(),
        available_cookies,
        ffmpeg_available: ffmpeg_available(state.engine.config()),
        notes: vec![
            "Supports watch links, Shorts, Music, and live replays.",
            "Upload cookies.txt from your browser to access age/region restricted videos.",
            "Cookie files are automatically deleted after 24 hours.",
            "Platform-specific configurations for optimal compatibility.",
        ],
    })
}

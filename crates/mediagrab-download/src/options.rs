//! Fetch option assembly.
//!
//! Translates a requested media kind + quality into the extractor option
//! set for one job, merged with platform policy and cookie selection.
//! Merge precedence for headers is user-agent, then platform extra
//! headers, then referer; later entries overwrite earlier keys.

use serde::Serialize;
use std::path::{Path, PathBuf};

use mediagrab_core::download::{FetchConfig, FetchMode, MediaKind, RetryPolicy};
use mediagrab_core::platform::{PlatformConfig, resolve_platform};

use crate::config::EngineConfig;
use crate::cookies::CookieStore;

/// Fan-out for fragmented downloads.
const CONCURRENT_FRAGMENTS: u32 = 5;

/// Socket timeout handed to the extractor.
const SOCKET_TIMEOUT_SECS: u64 = 30;

/// Output template: length-capped title plus item ID.
const OUTPUT_TEMPLATE: &str = "%(title).150B-%(id)s.%(ext)s";

/// Audio transcode target.
const AUDIO_CODEC: &str = "mp3";
const AUDIO_BITRATE: &str = "192";

/// Severity of a platform advisory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryLevel {
    Info,
    Success,
    Warning,
}

/// Actionable note about a platform's cookie requirements.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlatformAdvisory {
    pub requires_cookies: bool,
    pub message: String,
    pub level: AdvisoryLevel,
}

/// Build the merged fetch configuration for one job.
///
/// Never fails: missing platform policy means generic defaults, and a
/// missing cookie file on a cookie-mandatory platform only produces a
/// warning-level note, not an error.
#[must_use]
pub fn build_fetch_config(
    engine: &EngineConfig,
    url: &str,
    kind: MediaKind,
    quality: &str,
    cookie_file: Option<&Path>,
) -> FetchConfig {
    let policy = resolve_platform(url);

    let mut headers: Vec<(String, String)> = Vec::new();
    if let Some(policy) = policy {
        if let Some(user_agent) = &policy.user_agent {
            upsert_header(&mut headers, "User-Agent", user_agent);
        }
        for (key, value) in &policy.extra_headers {
            upsert_header(&mut headers, key, value);
        }
        if let Some(referer) = &policy.referer {
            upsert_header(&mut headers, "Referer", referer);
        }
    }

    let (cookie_file, cookie_note) = select_cookie_file(engine, policy, cookie_file);

    let mode = match kind {
        MediaKind::Video => FetchMode::Video {
            format_selector: build_video_selector(quality),
        },
        MediaKind::Audio => FetchMode::Audio {
            codec: AUDIO_CODEC.to_string(),
            bitrate: AUDIO_BITRATE.to_string(),
        },
        MediaKind::Photo => FetchMode::Photo,
    };

    FetchConfig {
        mode,
        headers,
        cookie_file,
        cookie_note,
        output_template: engine
            .download_dir
            .join(OUTPUT_TEMPLATE)
            .to_string_lossy()
            .into_owned(),
        retries: RetryPolicy::default(),
        concurrent_fragments: CONCURRENT_FRAGMENTS,
        socket_timeout_secs: SOCKET_TIMEOUT_SECS,
        no_playlist: true,
        ffmpeg_location: ffmpeg_location(engine),
    }
}

/// Pick the cookie file for a job.
///
/// Cookie-mandatory platforms prefer the explicitly supplied file, fall
/// back to the default file, and otherwise proceed without cookies while
/// surfacing a warning note. Platforms without a mandate still use an
/// explicit file opportunistically but never block on its absence.
fn select_cookie_file(
    engine: &EngineConfig,
    policy: Option<&PlatformConfig>,
    explicit: Option<&Path>,
) -> (Option<PathBuf>, Option<String>) {
    let explicit = explicit.filter(|p| p.exists());

    if policy.is_some_and(|p| p.requires_cookies) {
        if let Some(path) = explicit {
            return (Some(path.to_path_buf()), None);
        }
        if engine.default_cookie_file.exists() {
            return (Some(engine.default_cookie_file.clone()), None);
        }
        let description = policy.map_or("this platform", |p| p.description.as_str());
        return (
            None,
            Some(format!(
                "{description} may require cookies for full access"
            )),
        );
    }

    (explicit.map(Path::to_path_buf), None)
}

/// Insert a header, replacing any earlier entry with the same key.
fn upsert_header(headers: &mut Vec<(String, String)>, key: &str, value: &str) {
    if let Some(entry) = headers
        .iter_mut()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
    {
        entry.1 = value.to_string();
    } else {
        headers.push((key.to_string(), value.to_string()));
    }
}

/// Build a video format selector honoring a maximum height.
///
/// `"best"` (or any quality with no digits) means no height cap, merging
/// the best available video and audio. Numeric qualities like `"1080p"`
/// cap the height, preferring MP4 containers, then any container, then
/// best-audio-plus-best-video, then best overall.
#[must_use]
pub fn build_video_selector(quality: &str) -> String {
    if quality == "best" {
        return "bv*+ba/b".to_string();
    }
    let height: String = quality.chars().filter(char::is_ascii_digit).collect();
    if height.is_empty() {
        return "bv*+ba/b".to_string();
    }
    format!(
        "((bv*[height<={height}][ext=mp4]/bv*[height<={height}])+(ba[ext=m4a]/ba))/b[height<={height}]"
    )
}

/// Whether ffmpeg is discoverable on PATH or in the bundled directory.
#[must_use]
pub fn ffmpeg_available(engine: &EngineConfig) -> bool {
    which::which("ffmpeg").is_ok()
        || engine.ffmpeg_dir.join("ffmpeg").exists()
        || engine.ffmpeg_dir.join("ffmpeg.exe").exists()
}

/// The ffmpeg location hint, when the tool is discoverable at all.
fn ffmpeg_location(engine: &EngineConfig) -> Option<PathBuf> {
    ffmpeg_available(engine).then(|| engine.ffmpeg_dir.clone())
}

/// Describe a platform's cookie requirements against current availability.
///
/// Used by both the pre-flight probe and the download launch to give the
/// caller actionable feedback without blocking either action.
#[must_use]
pub fn check_requirements(url: &str, cookies: &CookieStore) -> PlatformAdvisory {
    let Some(policy) = resolve_platform(url) else {
        return PlatformAdvisory {
            requires_cookies: false,
            message: "Platform not specifically configured. Standard download will be attempted."
                .to_string(),
            level: AdvisoryLevel::Info,
        };
    };

    if policy.requires_cookies {
        if cookies.any_available() {
            return PlatformAdvisory {
                requires_cookies: true,
                message: format!(
                    "Platform: {} - Cookies available for full access.",
                    policy.description
                ),
                level: AdvisoryLevel::Success,
            };
        }
        return PlatformAdvisory {
            requires_cookies: true,
            message: format!(
                "Platform: {} - Cookies recommended for full video access. \
                 You may only get trailers without authentication.",
                policy.description
            ),
            level: AdvisoryLevel::Warning,
        };
    }

    PlatformAdvisory {
        requires_cookies: false,
        message: format!("Platform: {} - No special requirements.", policy.description),
        level: AdvisoryLevel::Info,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn engine(tmp: &TempDir) -> EngineConfig {
        EngineConfig::rooted_at(tmp.path())
    }

    #[test]
    fn best_sentinel_has_no_height_bound() {
        assert_eq!(build_video_selector("best"), "bv*+ba/b");
        assert_eq!(build_video_selector("weird"), "bv*+ba/b");
    }

    #[test]
    fn numeric_qualities_bound_height() {
        for quality in ["1080p", "720p", "480p", "144p"] {
            let selector = build_video_selector(quality);
            let height = &quality[..quality.len() - 1];
            assert!(
                selector.contains(&format!("height<={height}")),
                "selector {selector} should bound height at {height}"
            );
            assert!(selector.contains("ext=mp4"));
        }
    }

    #[test]
    fn header_merge_order_later_wins() {
        let tmp = TempDir::new().unwrap();
        let config = build_fetch_config(
            &engine(&tmp),
            "https://agasobanuyefilms.com/movie/7",
            MediaKind::Video,
            "best",
            None,
        );

        // Policy user agent survives the extra-header merge
        assert!(config.header("User-Agent").unwrap().contains("Mozilla/5.0"));
        assert_eq!(
            config.header("Referer").unwrap(),
            "https://agasobanuyefilms.com/"
        );
        assert_eq!(config.header("DNT").unwrap(), "1");
    }

    #[test]
    fn unknown_platform_builds_generic_config() {
        let tmp = TempDir::new().unwrap();
        let config = build_fetch_config(
            &engine(&tmp),
            "https://example.org/clip",
            MediaKind::Video,
            "720p",
            None,
        );
        assert!(config.headers.is_empty());
        assert!(config.cookie_file.is_none());
        assert!(config.cookie_note.is_none());
        assert!(config.no_playlist);
        assert_eq!(config.concurrent_fragments, 5);
        assert_eq!(config.socket_timeout_secs, 30);
    }

    #[test]
    fn mandatory_platform_without_cookies_gets_warning_note() {
        let tmp = TempDir::new().unwrap();
        let config = build_fetch_config(
            &engine(&tmp),
            "https://agasobanuyefilms.com/movie/7",
            MediaKind::Video,
            "best",
            None,
        );
        assert!(config.cookie_file.is_none());
        assert!(config.cookie_note.is_some());
    }

    #[test]
    fn mandatory_platform_falls_back_to_default_cookies() {
        let tmp = TempDir::new().unwrap();
        let engine = engine(&tmp);
        std::fs::write(&engine.default_cookie_file, b"data").unwrap();

        let config = build_fetch_config(
            &engine,
            "https://agasobanuyefilms.com/movie/7",
            MediaKind::Video,
            "best",
            None,
        );
        assert_eq!(config.cookie_file.as_deref(), Some(engine.default_cookie_file.as_path()));
        assert!(config.cookie_note.is_none());
    }

    #[test]
    fn explicit_cookie_applied_opportunistically() {
        let tmp = TempDir::new().unwrap();
        let engine = engine(&tmp);
        let cookie = tmp.path().join("mine.txt");
        std::fs::write(&cookie, b"data").unwrap();

        let config = build_fetch_config(
            &engine,
            "https://youtube.com/watch?v=x",
            MediaKind::Video,
            "best",
            Some(&cookie),
        );
        assert_eq!(config.cookie_file.as_deref(), Some(cookie.as_path()));

        // A missing explicit file never blocks a platform without a mandate
        let config = build_fetch_config(
            &engine,
            "https://youtube.com/watch?v=x",
            MediaKind::Video,
            "best",
            Some(Path::new("/nonexistent/cookie.txt")),
        );
        assert!(config.cookie_file.is_none());
        assert!(config.cookie_note.is_none());
    }

    #[test]
    fn audio_mode_declares_transcode() {
        let tmp = TempDir::new().unwrap();
        let config = build_fetch_config(
            &engine(&tmp),
            "https://youtube.com/watch?v=x",
            MediaKind::Audio,
            "best",
            None,
        );
        match config.mode {
            FetchMode::Audio { codec, bitrate } => {
                assert_eq!(codec, "mp3");
                assert_eq!(bitrate, "192");
            }
            _ => panic!("expected audio mode"),
        }
    }

    #[test]
    fn advisory_levels() {
        let tmp = TempDir::new().unwrap();
        let engine = engine(&tmp);
        let cookies = CookieStore::new(&engine.cookie_dir, &engine.default_cookie_file);

        let advisory = check_requirements("https://example.org/clip", &cookies);
        assert_eq!(advisory.level, AdvisoryLevel::Info);
        assert!(!advisory.requires_cookies);

        let advisory = check_requirements("https://agasobanuyefilms.com/m/1", &cookies);
        assert_eq!(advisory.level, AdvisoryLevel::Warning);
        assert!(advisory.requires_cookies);

        std::fs::write(&engine.default_cookie_file, b"data").unwrap();
        let advisory = check_requirements("https://agasobanuyefilms.com/m/1", &cookies);
        assert_eq!(advisory.level, AdvisoryLevel::Success);
    }
}

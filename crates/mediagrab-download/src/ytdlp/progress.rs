//! yt-dlp output line parsing.
//!
//! The fetch invocation passes `--newline --progress-template
//! "download:%(progress)j"`, so transfer progress arrives as one JSON
//! object per line mirroring the tool's progress dictionary. Post-
//! processing steps (merge, audio extraction) and the cached-file notice
//! only show up as plain status lines, matched by regex.

use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use mediagrab_core::ports::ProgressFrame;

/// One decoded line of extractor output.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum LineEvent {
    /// A progress frame to forward to the job's sink.
    Frame(ProgressFrame),
    /// A post-processing step revealed the (new) output path.
    FinalPath(PathBuf),
}

/// The progress dictionary fields we consume.
#[derive(Debug, Deserialize)]
struct ProgressPayload {
    status: Option<String>,
    filename: Option<String>,
    downloaded_bytes: Option<f64>,
    total_bytes: Option<f64>,
    total_bytes_estimate: Option<f64>,
    #[serde(rename = "_speed_str")]
    speed_str: Option<String>,
    #[serde(rename = "_eta_str")]
    eta_str: Option<String>,
}

fn merger_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\[Merger\] Merging formats into "(.+)""#).unwrap())
}

fn extract_audio_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[ExtractAudio\] Destination: (.+)").unwrap())
}

fn already_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[download\] (.+) has already been downloaded").unwrap())
}

/// Decode one stdout line, if it carries anything we care about.
pub(crate) fn parse_line(line: &str) -> Option<LineEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if line.starts_with('{') {
        return parse_progress_json(line);
    }

    if let Some(caps) = merger_re().captures(line) {
        return Some(LineEvent::FinalPath(PathBuf::from(&caps[1])));
    }
    if let Some(caps) = extract_audio_re().captures(line) {
        return Some(LineEvent::FinalPath(PathBuf::from(caps[1].trim())));
    }
    if let Some(caps) = already_re().captures(line) {
        return Some(LineEvent::FinalPath(PathBuf::from(caps[1].trim())));
    }

    None
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_progress_json(line: &str) -> Option<LineEvent> {
    let payload: ProgressPayload = serde_json::from_str(line).ok()?;
    match payload.status.as_deref() {
        Some("downloading") => {
            let total = payload
                .total_bytes
                .or(payload.total_bytes_estimate)
                .filter(|t| *t > 0.0)
                .map(|t| t as u64);
            Some(LineEvent::Frame(ProgressFrame::Downloading {
                filename: payload
                    .filename
                    .as_deref()
                    .map(|f| basename(f).to_string()),
                downloaded: payload.downloaded_bytes.unwrap_or(0.0).max(0.0) as u64,
                total,
                speed: payload.speed_str.map(|s| s.trim().to_string()),
                eta: payload.eta_str.map(|s| s.trim().to_string()),
            }))
        }
        Some("finished") => payload
            .filename
            .map(|f| LineEvent::Frame(ProgressFrame::Finished {
                path: PathBuf::from(f),
            })),
        _ => None,
    }
}

fn basename(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downloading_json_becomes_transfer_frame() {
        let line = r#"{"status": "downloading", "filename": "/d/Test clip-xyz.f137.mp4",
            "downloaded_bytes": 1048576, "total_bytes": 4194304,
            "_speed_str": " 1.20MiB/s", "_eta_str": "00:03"}"#;
        let event = parse_line(&line.replace('\n', " ")).unwrap();
        match event {
            LineEvent::Frame(ProgressFrame::Downloading {
                filename,
                downloaded,
                total,
                speed,
                eta,
            }) => {
                assert_eq!(filename.as_deref(), Some("Test clip-xyz.f137.mp4"));
                assert_eq!(downloaded, 1_048_576);
                assert_eq!(total, Some(4_194_304));
                assert_eq!(speed.as_deref(), Some("1.20MiB/s"));
                assert_eq!(eta.as_deref(), Some("00:03"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn estimate_fills_in_for_missing_total() {
        let line = r#"{"status": "downloading", "downloaded_bytes": 10.5,
            "total_bytes_estimate": 100.9}"#;
        match parse_line(&line.replace('\n', " ")).unwrap() {
            LineEvent::Frame(ProgressFrame::Downloading {
                downloaded, total, ..
            }) => {
                assert_eq!(downloaded, 10);
                assert_eq!(total, Some(100));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn finished_json_becomes_finished_frame() {
        let line = r#"{"status": "finished", "filename": "/d/Test clip-xyz.webm"}"#;
        assert_eq!(
            parse_line(line).unwrap(),
            LineEvent::Frame(ProgressFrame::Finished {
                path: PathBuf::from("/d/Test clip-xyz.webm"),
            })
        );
    }

    #[test]
    fn merger_line_reveals_final_path() {
        let line = r#"[Merger] Merging formats into "/d/Test clip-xyz.mp4""#;
        assert_eq!(
            parse_line(line).unwrap(),
            LineEvent::FinalPath(PathBuf::from("/d/Test clip-xyz.mp4"))
        );
    }

    #[test]
    fn extract_audio_line_reveals_final_path() {
        let line = "[ExtractAudio] Destination: /d/Track-abc.mp3";
        assert_eq!(
            parse_line(line).unwrap(),
            LineEvent::FinalPath(PathBuf::from("/d/Track-abc.mp3"))
        );
    }

    #[test]
    fn already_downloaded_line_reveals_final_path() {
        let line = "[download] /d/Test clip-xyz.mp4 has already been downloaded";
        assert_eq!(
            parse_line(line).unwrap(),
            LineEvent::FinalPath(PathBuf::from("/d/Test clip-xyz.mp4"))
        );
    }

    #[test]
    fn unrelated_lines_are_ignored() {
        assert!(parse_line("").is_none());
        assert!(parse_line("[youtube] X: Downloading webpage").is_none());
        assert!(parse_line("{not json").is_none());
        assert!(parse_line(r#"{"status": "error"}"#).is_none());
    }
}

//! yt-dlp subprocess adapter.
//!
//! Implements the extraction port by spawning the yt-dlp binary and
//! streaming its stdout line by line: JSON progress frames drive the
//! job's progress sink, post-processor lines reveal the final output
//! path, and stderr is captured for failure text.

mod progress;

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

use mediagrab_core::download::{FetchConfig, FetchMode};
use mediagrab_core::ports::{
    Extractor, ExtractorError, FetchOutcome, MediaProbe, ProgressFrame, ProgressSink, Rendition,
};

use self::progress::{LineEvent, parse_line};

/// Extraction adapter backed by the yt-dlp CLI.
pub struct YtDlpExtractor {
    binary: PathBuf,
}

impl YtDlpExtractor {
    /// Locate yt-dlp on PATH, falling back to the bare name.
    #[must_use]
    pub fn new() -> Self {
        Self {
            binary: which::which("yt-dlp").unwrap_or_else(|_| PathBuf::from("yt-dlp")),
        }
    }

    /// Use an explicit binary path.
    #[must_use]
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for YtDlpExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Arguments shared by probe and fetch invocations.
fn common_args(config: &FetchConfig) -> Vec<String> {
    let mut args = vec!["--no-warnings".to_string()];
    if config.no_playlist {
        args.push("--no-playlist".to_string());
    }
    args.extend([
        "--concurrent-fragments".to_string(),
        config.concurrent_fragments.to_string(),
        "--retries".to_string(),
        config.retries.transport.to_string(),
        "--fragment-retries".to_string(),
        config.retries.fragment.to_string(),
        "--extractor-retries".to_string(),
        config.retries.extractor.to_string(),
        "--socket-timeout".to_string(),
        config.socket_timeout_secs.to_string(),
    ]);
    for class in ["http", "fragment", "extractor"] {
        args.push("--retry-sleep".to_string());
        args.push(format!("{class}:exp=1:30"));
    }
    for (key, value) in &config.headers {
        args.push("--add-header".to_string());
        args.push(format!("{key}:{value}"));
    }
    if let Some(cookie) = &config.cookie_file {
        args.push("--cookies".to_string());
        args.push(cookie.to_string_lossy().into_owned());
    }
    if let Some(ffmpeg) = &config.ffmpeg_location {
        args.push("--ffmpeg-location".to_string());
        args.push(ffmpeg.to_string_lossy().into_owned());
    }
    args
}

/// Media-kind specific selection and post-processing arguments.
fn mode_args(mode: &FetchMode) -> Vec<String> {
    match mode {
        FetchMode::Video { format_selector } => vec![
            "-f".to_string(),
            format_selector.clone(),
            "--merge-output-format".to_string(),
            "mp4".to_string(),
        ],
        FetchMode::Audio { codec, bitrate } => vec![
            "-f".to_string(),
            "bestaudio/best".to_string(),
            "-x".to_string(),
            "--audio-format".to_string(),
            codec.clone(),
            "--audio-quality".to_string(),
            format!("{bitrate}K"),
        ],
        FetchMode::Photo => vec![
            "-f".to_string(),
            "best".to_string(),
            "--no-write-thumbnail".to_string(),
        ],
    }
}

/// Full argument list for a download invocation.
fn fetch_args(config: &FetchConfig, url: &str) -> Vec<String> {
    let mut args = common_args(config);
    args.extend(mode_args(&config.mode));
    args.extend([
        "--newline".to_string(),
        "--progress-template".to_string(),
        "download:%(progress)j".to_string(),
        "-o".to_string(),
        config.output_template.clone(),
        url.to_string(),
    ]);
    args
}

/// Full argument list for a metadata probe.
fn probe_args(config: &FetchConfig, url: &str) -> Vec<String> {
    let mut args = common_args(config);
    args.extend([
        "--skip-download".to_string(),
        "-J".to_string(),
        url.to_string(),
    ]);
    args
}

/// Subset of the `-J` dump we consume.
#[derive(Debug, serde::Deserialize)]
struct RawInfo {
    title: Option<String>,
    duration: Option<f64>,
    uploader: Option<String>,
    thumbnail: Option<String>,
    description: Option<String>,
    #[serde(default)]
    formats: Vec<RawFormat>,
}

#[derive(Debug, serde::Deserialize)]
struct RawFormat {
    format_id: Option<String>,
    height: Option<f64>,
    ext: Option<String>,
    vcodec: Option<String>,
    filesize: Option<f64>,
    filesize_approx: Option<f64>,
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn probe_from_info(info: RawInfo) -> MediaProbe {
    let renditions = info
        .formats
        .into_iter()
        .filter(|f| f.vcodec.as_deref() != Some("none"))
        .filter_map(|f| {
            let height = f.height.filter(|h| *h > 0.0)? as u32;
            Some(Rendition {
                format_id: f.format_id.unwrap_or_default(),
                height,
                ext: f.ext.unwrap_or_else(|| "mp4".to_string()),
                filesize: f
                    .filesize
                    .or(f.filesize_approx)
                    .filter(|s| *s > 0.0)
                    .map(|s| s as u64),
            })
        })
        .collect();

    MediaProbe {
        title: info.title.unwrap_or_else(|| "Unknown".to_string()),
        duration_seconds: info.duration.unwrap_or(0.0).max(0.0) as u64,
        uploader: info.uploader.unwrap_or_else(|| "Unknown".to_string()),
        thumbnail: info.thumbnail.unwrap_or_default(),
        description: info.description.unwrap_or_default(),
        renditions,
    }
}

/// Pick the failure text for a dead process: stderr when present,
/// otherwise the exit status.
fn failure_text(status: std::process::ExitStatus, stderr: &[u8]) -> String {
    let stderr_text = String::from_utf8_lossy(stderr).trim().to_string();
    if stderr_text.is_empty() {
        format!("extractor exited with status {status}")
    } else {
        stderr_text
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    async fn probe(&self, url: &str, config: &FetchConfig) -> Result<MediaProbe, ExtractorError> {
        let output = Command::new(&self.binary)
            .args(probe_args(config, url))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ExtractorError::Spawn(e.to_string()))?;

        if !output.status.success() {
            return Err(ExtractorError::Failed(failure_text(
                output.status,
                &output.stderr,
            )));
        }

        let info: RawInfo = serde_json::from_slice(&output.stdout)
            .map_err(|e| ExtractorError::Failed(format!("unreadable metadata dump: {e}")))?;
        Ok(probe_from_info(info))
    }

    async fn fetch(
        &self,
        url: &str,
        config: &FetchConfig,
        on_progress: ProgressSink,
    ) -> Result<FetchOutcome, ExtractorError> {
        let mut child = Command::new(&self.binary)
            .args(fetch_args(config, url))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExtractorError::Spawn(e.to_string()))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExtractorError::Spawn("missing stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ExtractorError::Spawn("missing stderr".to_string()))?;

        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = BufReader::new(stderr).read_to_end(&mut buf).await;
            buf
        });

        // Later lines are more final: per-stream finishes give way to the
        // merger/transcode destination.
        let mut final_path: Option<PathBuf> = None;

        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| ExtractorError::Failed(e.to_string()))?
        {
            match parse_line(&line) {
                Some(LineEvent::Frame(frame)) => {
                    if let ProgressFrame::Finished { path } = &frame {
                        final_path = Some(path.clone());
                    }
                    on_progress(frame);
                }
                Some(LineEvent::FinalPath(path)) => final_path = Some(path),
                None => {}
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| ExtractorError::Failed(e.to_string()))?;
        let stderr_buf = stderr_task.await.unwrap_or_default();

        if !status.success() {
            return Err(ExtractorError::Failed(failure_text(status, &stderr_buf)));
        }

        let requested_path = final_path
            .ok_or_else(|| ExtractorError::Failed("no output file reported".to_string()))?;
        Ok(FetchOutcome { requested_path })
    }
}

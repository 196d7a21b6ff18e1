//! Video-link metadata and audio-stream extraction.
//!
//! Scraping a video platform is not something this crate does itself. The
//! [`MediaExtractor`] trait is the seam; the bundled [`YtDlpExtractor`]
//! delegates to the `yt-dlp` tool as a subprocess, requesting metadata as
//! JSON and streaming the audio-only download over stdout.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::AsyncRead;
use tokio::process::{Child, Command};

use crate::error::ExtractError;

/// One available thumbnail for a video.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    /// Image URL.
    pub url: String,
    /// Width in pixels, 0 when unreported.
    pub width: u32,
    /// Height in pixels, 0 when unreported.
    pub height: u32,
}

/// Basic metadata for a video-sharing link.
#[derive(Debug, Clone)]
pub struct VideoInfo {
    /// Video title.
    pub title: String,
    /// View count, when reported.
    pub view_count: Option<u64>,
    /// Like count, when reported.
    pub likes: Option<u64>,
    /// Dislike count, when reported (most platforms no longer expose it).
    pub dislikes: Option<u64>,
    /// Channel or uploader name.
    pub channel: String,
    /// Upload date as reported (typically `YYYYMMDD`).
    pub upload_date: Option<String>,
    /// Total duration in seconds.
    pub duration_seconds: u64,
    /// Available thumbnails.
    pub thumbnails: Vec<Thumbnail>,
}

impl VideoInfo {
    /// The widest available thumbnail.
    pub fn best_thumbnail(&self) -> Option<&Thumbnail> {
        self.thumbnails.iter().max_by_key(|t| t.width)
    }
}

/// Requested audio quality for an extracted stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioQuality {
    /// Best available audio-only format.
    #[default]
    HighestAudio,
}

/// Parameters for opening an extracted audio stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamRequest {
    /// Requested quality.
    pub quality: AudioQuality,
    /// Optional offset to start from.
    pub start_at: Option<Duration>,
}

/// An extracted audio byte stream, optionally backed by a child process that
/// must be killed when the pipeline is destroyed.
pub struct MediaStream {
    reader: Box<dyn AsyncRead + Send + Unpin>,
    guard: Option<Child>,
}

impl MediaStream {
    /// Wraps a plain reader (in-memory test data, a pre-downloaded file).
    pub fn from_reader(reader: Box<dyn AsyncRead + Send + Unpin>) -> Self {
        Self {
            reader,
            guard: None,
        }
    }

    /// Wraps a reader backed by a child process.
    pub fn with_guard(reader: Box<dyn AsyncRead + Send + Unpin>, guard: Child) -> Self {
        Self {
            reader,
            guard: Some(guard),
        }
    }

    /// Splits into the reader and the optional process guard.
    pub(crate) fn into_parts(self) -> (Box<dyn AsyncRead + Send + Unpin>, Option<Child>) {
        (self.reader, self.guard)
    }
}

/// Metadata and audio extraction for video-sharing links.
///
/// Implementations must not block; both operations may take network time and
/// suspend the caller.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Fetches basic metadata for the link.
    async fn basic_info(&self, link: &str) -> Result<VideoInfo, ExtractError>;

    /// Opens the audio-only byte stream for the link.
    async fn open_audio_stream(
        &self,
        link: &str,
        request: &StreamRequest,
    ) -> Result<MediaStream, ExtractError>;
}

/// Extractor backed by the `yt-dlp` command-line tool.
pub struct YtDlpExtractor {
    program: String,
}

impl Default for YtDlpExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl YtDlpExtractor {
    /// Creates an extractor using `yt-dlp` from `PATH`.
    pub fn new() -> Self {
        Self {
            program: "yt-dlp".to_string(),
        }
    }

    /// Uses a specific executable instead of `yt-dlp` from `PATH`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Checks whether the extraction tool can be run at all.
    pub fn is_available(&self) -> bool {
        std::process::Command::new(&self.program)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    async fn basic_info(&self, link: &str) -> Result<VideoInfo, ExtractError> {
        let output = Command::new(&self.program)
            .args(["-J", "--no-playlist", link])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ExtractError::Unavailable {
                reason: format!("failed to run {}: {e}", self.program),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractError::metadata(stderr.trim().to_string()));
        }

        let raw: RawVideoInfo = serde_json::from_slice(&output.stdout)
            .map_err(|e| ExtractError::metadata(format!("unparseable metadata: {e}")))?;
        Ok(raw.into())
    }

    async fn open_audio_stream(
        &self,
        link: &str,
        request: &StreamRequest,
    ) -> Result<MediaStream, ExtractError> {
        let mut args: Vec<String> = vec![
            "-f".to_string(),
            match request.quality {
                AudioQuality::HighestAudio => "bestaudio/best".to_string(),
            },
            "-o".to_string(),
            "-".to_string(),
            "--no-playlist".to_string(),
            "--quiet".to_string(),
        ];
        if let Some(start) = request.start_at {
            args.push("--download-sections".to_string());
            args.push(format!("*{}-inf", start.as_secs()));
        }
        args.push(link.to_string());

        tracing::debug!(program = %self.program, ?args, "spawning extractor stream");
        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExtractError::Unavailable {
                reason: format!("failed to run {}: {e}", self.program),
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExtractError::stream("extractor has no stdout"))?;
        Ok(MediaStream::with_guard(Box::new(stdout), child))
    }
}

/// Subset of the extractor's JSON metadata output.
#[derive(Debug, Deserialize)]
struct RawVideoInfo {
    title: Option<String>,
    view_count: Option<u64>,
    like_count: Option<u64>,
    dislike_count: Option<u64>,
    channel: Option<String>,
    uploader: Option<String>,
    upload_date: Option<String>,
    duration: Option<f64>,
    #[serde(default)]
    thumbnails: Vec<RawThumbnail>,
}

#[derive(Debug, Deserialize)]
struct RawThumbnail {
    url: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

impl From<RawVideoInfo> for VideoInfo {
    fn from(raw: RawVideoInfo) -> Self {
        Self {
            title: raw.title.unwrap_or_default(),
            view_count: raw.view_count,
            likes: raw.like_count,
            dislikes: raw.dislike_count,
            channel: raw.channel.or(raw.uploader).unwrap_or_default(),
            upload_date: raw.upload_date,
            duration_seconds: raw.duration.map(|d| d.round() as u64).unwrap_or(0),
            thumbnails: raw
                .thumbnails
                .into_iter()
                .filter_map(|t| {
                    t.url.map(|url| Thumbnail {
                        url,
                        width: t.width.unwrap_or(0),
                        height: t.height.unwrap_or(0),
                    })
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_info_parsing() {
        let json = r#"{
            "title": "Test Video",
            "view_count": 1234567,
            "like_count": 4321,
            "channel": "Test Channel",
            "upload_date": "20240115",
            "duration": 245.3,
            "thumbnails": [
                {"url": "https://img.example/small.jpg", "width": 120, "height": 90},
                {"url": "https://img.example/big.jpg", "width": 1280, "height": 720},
                {"width": 9999}
            ]
        }"#;
        let raw: RawVideoInfo = serde_json::from_str(json).unwrap();
        let info = VideoInfo::from(raw);
        assert_eq!(info.title, "Test Video");
        assert_eq!(info.view_count, Some(1_234_567));
        assert_eq!(info.dislikes, None);
        assert_eq!(info.duration_seconds, 245);
        // The entry without a URL is dropped, the widest remaining one wins.
        assert_eq!(info.thumbnails.len(), 2);
        assert_eq!(
            info.best_thumbnail().unwrap().url,
            "https://img.example/big.jpg"
        );
    }

    #[test]
    fn test_uploader_fallback() {
        let raw: RawVideoInfo =
            serde_json::from_str(r#"{"uploader": "someone", "duration": 10}"#).unwrap();
        let info = VideoInfo::from(raw);
        assert_eq!(info.channel, "someone");
    }

    #[test]
    fn test_missing_tool_is_unavailable() {
        let extractor = YtDlpExtractor::with_program("/nonexistent/yt-dlp");
        assert!(!extractor.is_available());
    }
}

//! Target classification.
//!
//! A playback target is an arbitrary non-empty string: a video-sharing link,
//! a generic `http(s)` URL, or a local file path. Classification is pure and
//! total - every string maps to exactly one [`SourceKind`], with local file
//! as the fallback. No I/O happens here; file existence is checked by the
//! pipeline builder.

use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

static VIDEO_LINK_RE: OnceLock<Regex> = OnceLock::new();

/// Link pattern for the supported video-sharing hosts: the standard watch
/// URL, the `music.` subdomain variant, and the short-link form. The first
/// capture group is the video identifier.
fn video_link_re() -> &'static Regex {
    VIDEO_LINK_RE.get_or_init(|| {
        Regex::new(r"^https?://(?:www\.)?(?:music\.)?youtu(?:be\.com/watch\?v=|\.be/)([\w-]+)")
            .expect("video link pattern is valid")
    })
}

/// The resolved kind of a playback target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A path on the local filesystem.
    LocalFile,
    /// Any `http(s)` URL that is not a recognized video link.
    GenericUrl,
    /// A link to a video-sharing page with a video identifier.
    VideoLink,
}

/// Classifies a target string.
///
/// Matching order: video-sharing link first, then generic `http(s)://`,
/// otherwise a local file.
///
/// # Example
///
/// ```
/// use ptt_cast::{classify, SourceKind};
///
/// assert_eq!(classify("https://youtu.be/dQw4w9WgXcQ"), SourceKind::VideoLink);
/// assert_eq!(classify("https://example.com/track.mp3"), SourceKind::GenericUrl);
/// assert_eq!(classify("album/track.mp3"), SourceKind::LocalFile);
/// ```
pub fn classify(target: &str) -> SourceKind {
    if video_link_re().is_match(target) {
        SourceKind::VideoLink
    } else if target.starts_with("http://") || target.starts_with("https://") {
        SourceKind::GenericUrl
    } else {
        SourceKind::LocalFile
    }
}

/// Returns the captured video identifier for a video-sharing link.
pub fn video_id(target: &str) -> Option<&str> {
    video_link_re()
        .captures(target)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// An immutable description of one playback target.
///
/// Created once per invocation from the raw CLI target and the optional
/// start offset; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct TargetDescriptor {
    raw: String,
    kind: SourceKind,
    start_at: Option<Duration>,
}

impl TargetDescriptor {
    /// Classifies `raw` and couples it with the optional start offset.
    pub fn resolve(raw: impl Into<String>, start_at: Option<Duration>) -> Self {
        let raw = raw.into();
        let kind = classify(&raw);
        Self {
            raw,
            kind,
            start_at,
        }
    }

    /// The raw target string.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The resolved source kind.
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// The optional start offset.
    pub fn start_at(&self) -> Option<Duration> {
        self.start_at
    }

    /// The target as a filesystem path. Only meaningful for
    /// [`SourceKind::LocalFile`].
    pub fn path(&self) -> &Path {
        Path::new(&self.raw)
    }
}

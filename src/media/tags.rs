//! Best-effort tag metadata for local files.
//!
//! Reading is strictly best-effort: a file with no readable tags is not an
//! error, the caller falls back to a filename-derived caption instead.

use std::fs::File;
use std::path::Path;

use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{
    Limit, MetadataOptions, MetadataRevision, StandardTagKey, StandardVisualKey, Value,
};
use symphonia::core::probe::Hint;
use symphonia::default::get_probe;

/// Tag metadata extracted from a local audio file.
#[derive(Debug, Clone, Default)]
pub struct TrackTags {
    /// Track artist.
    pub artist: Option<String>,
    /// Album name.
    pub album: Option<String>,
    /// Release year.
    pub year: Option<String>,
    /// Track number, kept verbatim (may be `"3/12"`).
    pub track_number: Option<String>,
    /// Track title.
    pub title: Option<String>,
    /// Embedded front-cover image bytes.
    pub cover: Option<Vec<u8>>,
}

impl TrackTags {
    /// Returns `true` if no textual field was found.
    pub fn is_text_empty(&self) -> bool {
        self.artist.is_none()
            && self.album.is_none()
            && self.year.is_none()
            && self.track_number.is_none()
            && self.title.is_none()
    }
}

/// Reads tag metadata from `path`, returning `None` when the file cannot be
/// probed or carries no metadata at all.
pub fn read_tags(path: &Path) -> Option<TrackTags> {
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
        hint.with_extension(ext);
    }

    let src = File::open(path).ok()?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    // Allow reasonably-sized embedded artwork without blowing up memory.
    let meta_opts = MetadataOptions {
        limit_visual_bytes: Limit::Maximum(12 * 1024 * 1024),
        ..Default::default()
    };

    let mut probed = match get_probe().format(&hint, mss, &FormatOptions::default(), &meta_opts) {
        Ok(probed) => probed,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "tag probe failed");
            return None;
        }
    };

    let mut tags = TrackTags::default();

    // Metadata read during probing (e.g. ID3 before container instantiation).
    if let Some(mut metadata) = probed.metadata.get() {
        if let Some(revision) = metadata.skip_to_latest() {
            apply_revision(revision, &mut tags);
        }
    }

    // Metadata carried by the container itself.
    {
        let mut metadata = probed.format.metadata();
        if let Some(revision) = metadata.skip_to_latest() {
            apply_revision(revision, &mut tags);
        }
    }

    if tags.is_text_empty() && tags.cover.is_none() {
        None
    } else {
        Some(tags)
    }
}

fn apply_revision(revision: &MetadataRevision, tags: &mut TrackTags) {
    for tag in revision.tags() {
        match tag.std_key {
            Some(StandardTagKey::Artist) if tags.artist.is_none() => {
                tags.artist = value_to_string(&tag.value);
            }
            Some(StandardTagKey::Album) if tags.album.is_none() => {
                tags.album = value_to_string(&tag.value);
            }
            Some(StandardTagKey::Date) if tags.year.is_none() => {
                tags.year = value_to_string(&tag.value).map(|d| year_of(&d));
            }
            Some(StandardTagKey::TrackNumber) if tags.track_number.is_none() => {
                tags.track_number = value_to_string(&tag.value);
            }
            Some(StandardTagKey::TrackTitle) if tags.title.is_none() => {
                tags.title = value_to_string(&tag.value);
            }
            _ => {}
        }
    }

    if tags.cover.is_none() {
        let front = revision
            .visuals()
            .iter()
            .find(|v| v.usage == Some(StandardVisualKey::FrontCover));
        let chosen = front.or_else(|| revision.visuals().first());
        if let Some(visual) = chosen.filter(|v| !v.data.is_empty()) {
            tags.cover = Some(visual.data.as_ref().to_vec());
        }
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.clone(),
        _ => value.to_string(),
    };
    let s = s.trim().to_string();
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Extracts a 4-digit year from a date tag like `2003-10-21`.
fn year_of(date: &str) -> String {
    if date.len() > 4 && date.is_char_boundary(4) {
        date[..4].to_string()
    } else {
        date.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreadable_file_yields_none() {
        assert!(read_tags(Path::new("/definitely/not/here.mp3")).is_none());
    }

    #[test]
    fn test_garbage_file_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.mp3");
        std::fs::write(&path, b"this is not audio").unwrap();
        assert!(read_tags(&path).is_none());
    }

    #[test]
    fn test_year_extraction() {
        assert_eq!(year_of("2003-10-21"), "2003");
        assert_eq!(year_of("1999"), "1999");
        assert_eq!(year_of(""), "");
    }

    #[test]
    fn test_text_empty() {
        let mut tags = TrackTags::default();
        assert!(tags.is_text_empty());
        tags.title = Some("x".to_string());
        assert!(!tags.is_text_empty());
    }
}

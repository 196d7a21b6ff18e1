//! Caption formatting for tags and video metadata.

use std::path::Path;

use crate::media::extractor::VideoInfo;
use crate::media::tags::TrackTags;

/// Non-breaking space; keeps icon and value together when the service wraps
/// the caption.
const NBSP: char = '\u{a0}';

/// Abbreviates a count with k/M/B suffixes.
///
/// Values above a thousand/million/billion are divided and rounded to the
/// nearest unit; everything else is printed verbatim.
pub fn abbreviate_count(n: u64) -> String {
    if n > 1_000_000_000 {
        format!("{}B", div_round(n, 1_000_000_000))
    } else if n > 1_000_000 {
        format!("{}M", div_round(n, 1_000_000))
    } else if n > 1000 {
        format!("{}k", div_round(n, 1000))
    } else {
        n.to_string()
    }
}

fn div_round(n: u64, unit: u64) -> u64 {
    (n + unit / 2) / unit
}

/// Formats a duration in seconds as `MM:SS`, or `HH:MM:SS` beyond an hour.
pub fn format_duration(total_seconds: u64) -> String {
    let seconds = total_seconds % 60;
    let total_minutes = total_seconds / 60;
    let minutes = total_minutes % 60;
    let hours = total_minutes / 60;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

/// Builds a caption from file tags: artist, album with year, track and
/// title - one line per group, absent groups skipped. Returns `None` when no
/// textual tag is present.
pub fn caption_from_tags(tags: &TrackTags) -> Option<String> {
    let mut lines = Vec::new();

    if let Some(artist) = &tags.artist {
        lines.push(artist.clone());
    }

    if let Some(album) = &tags.album {
        let mut line = format!("\u{1f4bf}{NBSP}{album}");
        if let Some(year) = &tags.year {
            line.push_str(&format!(" ({year})"));
        }
        lines.push(line);
    }

    if tags.track_number.is_some() || tags.title.is_some() {
        let mut line = format!("\u{1f3b5}{NBSP}");
        if let Some(track) = &tags.track_number {
            line.push_str(&format!("{track} "));
        }
        if let Some(title) = &tags.title {
            line.push_str(&format!("- {title}"));
        }
        lines.push(line);
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// The caption used when a local file carries no readable tags: a music-note
/// marker plus the file's base name.
pub fn fallback_caption(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    format!("\u{1f3b5}{NBSP}{name}")
}

/// Builds the three-line caption for a video link: title, counters with the
/// formatted duration, channel and upload date.
pub fn caption_from_video(info: &VideoInfo) -> String {
    let views = abbreviate_count(info.view_count.unwrap_or(0));
    let likes = abbreviate_count(info.likes.unwrap_or(0));
    let dislikes = abbreviate_count(info.dislikes.unwrap_or(0));
    let length = format_duration(info.duration_seconds);

    let mut lines = vec![
        info.title.clone(),
        format!(
            "\u{1f441}{NBSP}{views}{NBSP}{NBSP}\u{1f44d}{NBSP}{likes}{NBSP}{NBSP}\u{1f44e}{NBSP}{dislikes}{NBSP}{NBSP}\u{1f552}{NBSP}{length}"
        ),
    ];

    let mut byline = format!("\u{24d8} Channel:{NBSP}{}", info.channel);
    if let Some(date) = &info.upload_date {
        byline.push_str(&format!("{NBSP}{NBSP}\u{2b06}{NBSP}{date}"));
    }
    lines.push(byline);

    lines.join("\n")
}

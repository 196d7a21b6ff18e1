//! The presentation payload: caption text and preview image.

mod caption;
mod preview;

pub use caption::{
    abbreviate_count, caption_from_tags, caption_from_video, fallback_caption, format_duration,
};
pub use preview::{render_video_preview, PREVIEW_HEIGHT, PREVIEW_WIDTH};

/// Optional caption and preview accompanying an audio send.
///
/// Derived once from source metadata by the pipeline builder and immutable
/// afterwards; it has no lifecycle beyond the single session script.
#[derive(Debug, Clone, Default)]
pub struct Presentation {
    /// Caption text, sent as a text message before the audio.
    pub caption: Option<String>,
    /// Preview image (JPEG or whatever the tags embedded), sent first.
    pub image: Option<Vec<u8>>,
}

impl Presentation {
    /// A payload with neither caption nor image.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns `true` when there is nothing to present.
    pub fn is_empty(&self) -> bool {
        self.caption.is_none() && self.image.is_none()
    }
}

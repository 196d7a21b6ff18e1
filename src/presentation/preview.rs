//! Preview card composition for video links.
//!
//! The widest thumbnail is resized to 800x450 and placed on a dark template
//! canvas, with the video duration stamped as a label in the lower-right
//! corner, then the whole card is flattened to a single JPEG buffer.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

use crate::error::CastError;
use crate::presentation::caption::format_duration;

/// Width the thumbnail is resized to.
pub const PREVIEW_WIDTH: u32 = 800;
/// Height the thumbnail is resized to.
pub const PREVIEW_HEIGHT: u32 = 450;

const CANVAS_WIDTH: u32 = 1020;
const CANVAS_HEIGHT: u32 = 450;
const THUMB_X: i64 = 110;
const THUMB_Y: i64 = 0;
const LABEL_X: i64 = 850;
const LABEL_Y: i64 = 380;

const CANVAS_COLOR: Rgba<u8> = Rgba([22, 22, 26, 255]);
const LABEL_BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 210]);
const LABEL_FOREGROUND: Rgba<u8> = Rgba([240, 240, 240, 255]);

/// Composes the preview card for a video.
///
/// # Errors
///
/// Returns [`CastError::StreamInitFailed`] when the thumbnail cannot be
/// decoded or the card cannot be encoded; preview failures are fatal for the
/// invocation like any other source-resolution failure.
pub fn render_video_preview(
    thumbnail: &[u8],
    duration_seconds: u64,
) -> Result<Vec<u8>, CastError> {
    let thumb = image::load_from_memory(thumbnail)
        .map_err(|e| CastError::stream_init(format!("failed to decode thumbnail: {e}")))?
        .resize_exact(PREVIEW_WIDTH, PREVIEW_HEIGHT, FilterType::Lanczos3)
        .to_rgba8();

    let mut canvas = RgbaImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, CANVAS_COLOR);
    imageops::overlay(&mut canvas, &thumb, THUMB_X, THUMB_Y);

    let label = duration_label(&format_duration(duration_seconds));
    imageops::overlay(&mut canvas, &label, LABEL_X, LABEL_Y);

    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(canvas)
        .to_rgb8()
        .write_to(&mut out, ImageFormat::Jpeg)
        .map_err(|e| CastError::stream_init(format!("failed to encode preview: {e}")))?;
    Ok(out.into_inner())
}

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
const GLYPH_SCALE: u32 = 2;
const LABEL_PADDING: u32 = 5;

/// Renders the duration text into a small badge image.
///
/// Only digits and `:` occur in a formatted duration, so the glyphs come
/// from a built-in 5x7 bitmap table rather than a font dependency.
fn duration_label(text: &str) -> RgbaImage {
    let advance = (GLYPH_WIDTH + 1) * GLYPH_SCALE;
    let width = LABEL_PADDING * 2 + advance * text.chars().count() as u32;
    let height = LABEL_PADDING * 2 + GLYPH_HEIGHT * GLYPH_SCALE;
    let mut label = RgbaImage::from_pixel(width, height, LABEL_BACKGROUND);

    let mut pen_x = LABEL_PADDING;
    for c in text.chars() {
        let rows = glyph(c);
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                for dy in 0..GLYPH_SCALE {
                    for dx in 0..GLYPH_SCALE {
                        let x = pen_x + col * GLYPH_SCALE + dx;
                        let y = LABEL_PADDING + row as u32 * GLYPH_SCALE + dy;
                        label.put_pixel(x, y, LABEL_FOREGROUND);
                    }
                }
            }
        }
        pen_x += advance;
    }
    label
}

/// 5x7 bitmap rows for the duration glyphs, most significant bit leftmost.
fn glyph(c: char) -> [u8; 7] {
    match c {
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        ':' => [0b00000, 0b00100, 0b00000, 0b00000, 0b00100, 0b00000, 0b00000],
        _ => [0; 7],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_thumbnail() -> Vec<u8> {
        let img = RgbaImage::from_pixel(64, 36, Rgba([200, 40, 40, 255]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_preview_card_dimensions() {
        let jpeg = render_video_preview(&sample_thumbnail(), 125).unwrap();
        let card = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(card.width(), CANVAS_WIDTH);
        assert_eq!(card.height(), CANVAS_HEIGHT);
        // JPEG magic bytes.
        assert_eq!(&jpeg[..2], &[0xff, 0xd8]);
    }

    #[test]
    fn test_preview_contains_thumbnail_pixels() {
        let jpeg = render_video_preview(&sample_thumbnail(), 45).unwrap();
        let card = image::load_from_memory(&jpeg).unwrap().to_rgb8();
        // Center of the thumbnail region is red-ish, far left is canvas.
        let center = card.get_pixel(THUMB_X as u32 + 400, 225);
        assert!(center[0] > 150 && center[1] < 100);
        let edge = card.get_pixel(10, 225);
        assert!(edge[0] < 60);
    }

    #[test]
    fn test_invalid_thumbnail_is_rejected() {
        let result = render_video_preview(b"not an image", 10);
        assert!(matches!(result, Err(CastError::StreamInitFailed { .. })));
    }

    #[test]
    fn test_duration_label_size_tracks_text() {
        let short = duration_label("00:45");
        let long = duration_label("01:02:05");
        assert!(long.width() > short.width());
        assert_eq!(short.height(), long.height());
        // Some foreground pixels were stamped.
        assert!(short.pixels().any(|p| p[0] > 200));
    }
}

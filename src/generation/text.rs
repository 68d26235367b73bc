//! Font loading and text layout helpers shared by the placeholder renderer
//! and the speech-bubble overlay.

use ab_glyph::{FontVec, PxScale};
use image::RgbImage;
use imageproc::drawing::{draw_text_mut, text_size};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Shared, immutable font
pub type SharedFont = Arc<FontVec>;

/// Fonts tried when no font is configured
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Loads the configured font, or the first system font found.
///
/// Returns `None` when nothing usable exists; callers then skip text.
pub fn load_font(configured: Option<&Path>) -> Option<SharedFont> {
    let candidates = configured
        .map(Path::to_path_buf)
        .into_iter()
        .chain(SYSTEM_FONT_CANDIDATES.iter().map(PathBuf::from));

    for path in candidates {
        match read_font(&path) {
            Ok(font) => {
                tracing::debug!(path = %path.display(), "Loaded font");
                return Some(Arc::new(font));
            }
            Err(e) => tracing::trace!(path = %path.display(), error = %e, "Font not usable"),
        }
    }

    tracing::warn!("No usable font found; panel text will not be drawn");
    None
}

fn read_font(path: &Path) -> anyhow::Result<FontVec> {
    let bytes = std::fs::read(path)?;
    let font = FontVec::try_from_vec(bytes)?;
    Ok(font)
}

/// Pixel width of `text` at `scale`
pub fn text_width(font: &FontVec, scale: f32, text: &str) -> u32 {
    text_size(PxScale::from(scale), font, text).0
}

/// Greedy word wrap so each line fits in `max_width` pixels.
///
/// Explicit newlines are kept. A single word wider than the limit gets a
/// line of its own.
pub fn wrap_text(font: &FontVec, scale: f32, text: &str, max_width: u32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };

            if !current.is_empty() && text_width(font, scale, &candidate) > max_width {
                lines.push(std::mem::take(&mut current));
                current = word.to_string();
            } else {
                current = candidate;
            }
        }
        lines.push(current);
    }

    lines
}

/// Draws pre-wrapped lines starting at (x, y)
pub fn draw_lines(
    image: &mut RgbImage,
    color: image::Rgb<u8>,
    x: i32,
    y: i32,
    scale: f32,
    font: &FontVec,
    lines: &[String],
) {
    let line_height = (scale * 1.2).ceil() as i32;
    for (i, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        draw_text_mut(
            image,
            color,
            x,
            y + i as i32 * line_height,
            PxScale::from(scale),
            font,
            line,
        );
    }
}

/// First `max_chars` characters of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

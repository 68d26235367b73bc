//! Placeholder backend
//!
//! Draws a flat grey panel with its index and the start of its prompt, so
//! the rest of the pipeline keeps working without a real image model.

use super::{BackendType, GenerationRequest, ImageBackend};
use crate::generation::text::{self, SharedFont};
use anyhow::Result;
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// Placeholder panels are always this size, whatever was requested
pub const PLACEHOLDER_SIZE: u32 = 512;

const BACKGROUND: Rgb<u8> = Rgb([240, 240, 240]);
const INK: Rgb<u8> = Rgb([10, 10, 10]);
const TEXT_OFFSET: i32 = 10;
const TEXT_SCALE: f32 = 14.0;
const PROMPT_PREVIEW_CHARS: usize = 150;

pub struct PlaceholderBackend {
    font: Option<SharedFont>,
}

impl PlaceholderBackend {
    pub fn new(font: Option<SharedFont>) -> Self {
        Self { font }
    }

    /// Render the placeholder image for panel `index`
    pub fn render(&self, index: usize, positive_prompt: &str) -> RgbImage {
        let mut image = RgbImage::from_pixel(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, BACKGROUND);

        if let Some(font) = &self.font {
            let label = format!(
                "Panel{}\n{}",
                index,
                text::truncate_chars(positive_prompt, PROMPT_PREVIEW_CHARS)
            );
            let max_width = PLACEHOLDER_SIZE - 2 * TEXT_OFFSET as u32;
            let lines = text::wrap_text(font, TEXT_SCALE, &label, max_width);
            text::draw_lines(
                &mut image,
                INK,
                TEXT_OFFSET,
                TEXT_OFFSET,
                TEXT_SCALE,
                font,
                &lines,
            );
        }

        image
    }

    /// Render and PNG-encode the placeholder for panel `index`
    pub fn render_png(&self, index: usize, positive_prompt: &str) -> Result<Vec<u8>> {
        let image = self.render(index, positive_prompt);
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl ImageBackend for PlaceholderBackend {
    fn name(&self) -> &str {
        "Placeholder"
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Placeholder
    }

    async fn is_available(&self) -> Result<bool> {
        Ok(true)
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<u8>> {
        self.render_png(request.index, &request.positive_prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(index: usize) -> GenerationRequest {
        GenerationRequest {
            index,
            positive_prompt: "manga panel, Hello, A quiet room".to_string(),
            negative_prompt: String::new(),
            seed: None,
            width: 768,
            height: 768,
            steps: 28,
            guidance_scale: 7.5,
        }
    }

    #[test]
    fn test_render_without_font_is_flat() {
        let backend = PlaceholderBackend::new(None);
        let image = backend.render(0, "anything");
        assert_eq!(image.dimensions(), (512, 512));
        assert!(image.pixels().all(|p| *p == BACKGROUND));
    }

    #[test]
    fn test_render_with_font_draws_ink() {
        let Some(font) = text::load_font(None) else {
            return;
        };
        let backend = PlaceholderBackend::new(Some(font));
        let image = backend.render(3, "a prompt");
        assert!(image.pixels().any(|p| *p != BACKGROUND));
    }

    #[tokio::test]
    async fn test_generate_returns_png_ignoring_requested_size() {
        let backend = PlaceholderBackend::new(None);
        assert!(backend.is_available().await.unwrap());

        let bytes = backend.generate(&request(1)).await.unwrap();
        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png).unwrap();
        assert_eq!(
            decoded.to_rgb8().dimensions(),
            (PLACEHOLDER_SIZE, PLACEHOLDER_SIZE)
        );
    }
}

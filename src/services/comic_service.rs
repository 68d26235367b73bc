//! Comic service - the story-to-panels pipeline shared by HTTP handlers
//! and CLI commands

use crate::generation::{
    apply_generation_params, apply_negative_override, build_prompts_for_panels,
    draw_speech_bubbles, panel_filename, ImageGenerator, SharedFont,
};
use crate::models::{GenerationParams, ParsedStory, Prompt, Style};
use crate::nlp::parse_story;
use crate::Result;
use anyhow::Context;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Input for a full story-to-comic run
#[derive(Debug, Clone)]
pub struct ComicInput {
    pub story: String,
    pub style: Style,
    /// Replaces every panel's negative prompt when non-empty
    pub negative_prompt: Option<String>,
    pub generation: GenerationParams,
    pub overlay_bubbles: bool,
    /// Overrides the configured image directory
    pub output_dir: Option<PathBuf>,
}

impl ComicInput {
    pub fn new(story: impl Into<String>, style: Style) -> Self {
        Self {
            story: story.into(),
            style,
            negative_prompt: None,
            generation: GenerationParams::default(),
            overlay_bubbles: true,
            output_dir: None,
        }
    }
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct ComicOutput {
    pub parsed: ParsedStory,
    pub prompts: Vec<Prompt>,
    /// One image per panel, in panel order
    pub image_paths: Vec<PathBuf>,
}

/// Base64 PNG as returned to HTTP clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedImage {
    pub b64: String,
    pub filename: String,
}

/// Parse the story, build prompts, generate panels and optionally draw
/// speech bubbles onto them.
///
/// A story without scenes yields an empty output and touches no files.
pub async fn generate_comic(
    generator: &ImageGenerator,
    font: Option<SharedFont>,
    input: &ComicInput,
) -> Result<ComicOutput> {
    let parsed = parse_story(&input.story);
    if parsed.panels.is_empty() {
        tracing::info!("Story has no scenes, nothing to generate");
        return Ok(ComicOutput {
            parsed,
            prompts: Vec::new(),
            image_paths: Vec::new(),
        });
    }

    tracing::info!(
        panels = parsed.panels.len(),
        characters = parsed.characters.len(),
        style = %input.style,
        "Parsed story"
    );

    let mut prompts = build_prompts_for_panels(&parsed.panels, input.style);
    apply_negative_override(&mut prompts, input.negative_prompt.as_deref());
    if !input.generation.is_empty() {
        apply_generation_params(&mut prompts, &input.generation);
    }

    let image_paths = generator
        .generate_images(&prompts, input.output_dir.as_deref())
        .await?;

    if input.overlay_bubbles {
        let jobs: Vec<_> = image_paths
            .iter()
            .zip(&parsed.panels)
            .filter(|(_, panel)| !panel.dialogues.is_empty())
            .map(|(path, panel)| (path.clone(), panel.dialogues.clone()))
            .collect();

        tokio::task::spawn_blocking(move || -> Result<()> {
            for (path, dialogues) in jobs {
                draw_speech_bubbles(&path, &dialogues, font.as_ref())?;
            }
            Ok(())
        })
        .await
        .context("Speech bubble task panicked")??;
    }

    Ok(ComicOutput {
        parsed,
        prompts,
        image_paths,
    })
}

/// Read and base64-encode one image
pub async fn encode_image(path: &Path, filename: impl Into<String>) -> Result<EncodedImage> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(EncodedImage {
        b64: BASE64.encode(bytes),
        filename: filename.into(),
    })
}

/// Encode images named by their path; unreadable files are skipped
pub async fn encode_images_lenient(paths: &[PathBuf]) -> Vec<EncodedImage> {
    let mut encoded = Vec::with_capacity(paths.len());
    for path in paths {
        match encode_image(path, path.display().to_string()).await {
            Ok(image) => encoded.push(image),
            Err(e) => tracing::warn!(error = %format!("{:#}", e), "Skipping unreadable image"),
        }
    }
    encoded
}

/// Encode panel images named `panel_{i}.png`
pub async fn encode_panels(paths: &[PathBuf]) -> Result<Vec<EncodedImage>> {
    let mut encoded = Vec::with_capacity(paths.len());
    for (index, path) in paths.iter().enumerate() {
        encoded.push(encode_image(path, panel_filename(index)).await?);
    }
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::BackendType;
    use crate::models::GenerationConfig;

    fn placeholder_generator(dir: &Path) -> ImageGenerator {
        let mut config = GenerationConfig::default();
        config.backend = BackendType::Placeholder;
        config.output_dir = dir.to_path_buf();
        ImageGenerator::new(config, None)
    }

    const STORY: &str = "Nora walked into the lab.\nNora: Is anyone here?\n\nThe lights flickered on.\n\n\"Welcome back,\" said a voice.";

    #[tokio::test]
    async fn test_generate_comic_end_to_end() {
        let temp = tempfile::tempdir().unwrap();
        let generator = placeholder_generator(temp.path());

        let mut input = ComicInput::new(STORY, Style::American);
        input.negative_prompt = Some("blurry".to_string());
        input.generation.steps = Some(12);

        let output = generate_comic(&generator, None, &input).await.unwrap();
        assert_eq!(output.parsed.panels.len(), 3);
        assert_eq!(output.prompts.len(), 3);
        assert_eq!(output.image_paths.len(), 3);
        assert!(output.prompts.iter().all(|p| p.negative_prompt == "blurry"));
        assert!(output.prompts.iter().all(|p| p.steps == Some(12)));
        assert!(output.prompts[0]
            .positive_prompt
            .starts_with("comic book style"));

        // Panel 0 has dialogue, so a bubble was drawn over the flat placeholder
        let panel0 = image::open(&output.image_paths[0]).unwrap().to_rgb8();
        assert_eq!(*panel0.get_pixel(256, 512 - 10 - 50 + 20), image::Rgb([255, 255, 255]));
        // Panel 1 has none and stays flat grey
        let panel1 = image::open(&output.image_paths[1]).unwrap().to_rgb8();
        assert_eq!(*panel1.get_pixel(256, 480), image::Rgb([240, 240, 240]));
    }

    #[tokio::test]
    async fn test_generate_comic_without_bubbles() {
        let temp = tempfile::tempdir().unwrap();
        let generator = placeholder_generator(temp.path());

        let mut input = ComicInput::new(STORY, Style::Manga);
        input.overlay_bubbles = false;

        let output = generate_comic(&generator, None, &input).await.unwrap();
        let panel0 = image::open(&output.image_paths[0]).unwrap().to_rgb8();
        assert_eq!(*panel0.get_pixel(256, 472), image::Rgb([240, 240, 240]));
    }

    #[tokio::test]
    async fn test_blank_story_yields_empty_comic() {
        let temp = tempfile::tempdir().unwrap();
        let out = temp.path().join("images");
        let generator = placeholder_generator(&out);

        let output = generate_comic(&generator, None, &ComicInput::new("  \n ", Style::Manga))
            .await
            .unwrap();
        assert!(output.parsed.panels.is_empty());
        assert!(output.prompts.is_empty());
        assert!(output.image_paths.is_empty());
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_encode_helpers() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("x.png");
        std::fs::write(&path, b"png-bytes").unwrap();

        let panels = encode_panels(&[path.clone()]).await.unwrap();
        assert_eq!(panels[0].filename, "panel_0.png");
        assert_eq!(BASE64.decode(&panels[0].b64).unwrap(), b"png-bytes");

        let lenient = encode_images_lenient(&[path.clone(), temp.path().join("gone.png")]).await;
        assert_eq!(lenient.len(), 1);
        assert_eq!(lenient[0].filename, path.display().to_string());
    }
}

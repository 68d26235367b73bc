use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Style
// =============================================================================

/// Visual style of the generated panels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    #[default]
    Manga,
    American,
    Webtoon,
}

impl Style {
    /// Parse a style name (case-insensitive). Unknown names fall back to manga.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "american" => Style::American,
            "webtoon" => Style::Webtoon,
            _ => Style::Manga,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Style::Manga => "manga",
            Style::American => "american",
            Style::Webtoon => "webtoon",
        }
    }

    /// Style keywords placed at the head of every positive prompt
    pub fn base_prompt(&self) -> &'static str {
        match self {
            Style::Manga => "black and white manga panel, screentones, expressive characters",
            Style::American => "comic book style, bold inks, dynamic poses, vibrant colors",
            Style::Webtoon => "vertical webtoon, clean colors, soft shading, modern style",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// Prompt
// =============================================================================

/// Text-to-image prompt for one panel plus optional generation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    #[serde(default, alias = "prompt")]
    pub positive_prompt: String,

    #[serde(default)]
    pub negative_prompt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidance_scale: Option<f32>,
}

impl Prompt {
    pub fn new(positive: impl Into<String>, negative: impl Into<String>) -> Self {
        Self {
            positive_prompt: positive.into(),
            negative_prompt: negative.into(),
            seed: None,
            width: None,
            height: None,
            steps: None,
            guidance_scale: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Generation parameters a caller may apply to every prompt of a batch.
///
/// Only these keys are copied; anything else in the request is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    #[serde(default)]
    pub width: Option<u32>,

    #[serde(default)]
    pub height: Option<u32>,

    #[serde(default)]
    pub steps: Option<u32>,

    #[serde(default)]
    pub guidance_scale: Option<f32>,

    #[serde(default)]
    pub seed: Option<u64>,
}

impl GenerationParams {
    pub fn is_empty(&self) -> bool {
        self.width.is_none()
            && self.height.is_none()
            && self.steps.is_none()
            && self.guidance_scale.is_none()
            && self.seed.is_none()
    }
}

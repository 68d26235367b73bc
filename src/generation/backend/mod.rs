//! Image generation backends
//!
//! Provides a unified interface over:
//! - ComfyUI (local or remote txt2img server)
//! - Placeholder (local drawing, always available)

pub mod comfyui;
pub mod placeholder;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use comfyui::ComfyUiBackend;
pub use placeholder::PlaceholderBackend;

use crate::generation::text::SharedFont;
use crate::models::GenerationConfig;

/// Backend type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// ComfyUI workflow server
    #[default]
    #[serde(rename = "comfyui")]
    ComfyUi,
    /// Locally drawn stand-in panels
    Placeholder,
}

impl BackendType {
    /// Parse from string (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "comfyui" | "comfy" => Some(BackendType::ComfyUi),
            "placeholder" | "none" => Some(BackendType::Placeholder),
            _ => None,
        }
    }
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ComfyUi => write!(f, "comfyui"),
            Self::Placeholder => write!(f, "placeholder"),
        }
    }
}

/// Fully resolved parameters for one panel image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    /// Panel index within the batch
    pub index: usize,
    pub positive_prompt: String,
    pub negative_prompt: String,
    pub seed: Option<u64>,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub guidance_scale: f32,
}

/// Image generation backend trait
#[async_trait::async_trait]
pub trait ImageBackend: Send + Sync {
    /// Backend name
    fn name(&self) -> &str;

    /// Backend type
    fn backend_type(&self) -> BackendType;

    /// Check if backend is reachable and ready
    async fn is_available(&self) -> Result<bool>;

    /// Generate one image, returned as encoded PNG bytes
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<u8>>;
}

/// Backend factory for creating backend instances
pub struct BackendFactory;

impl BackendFactory {
    /// Create backend from config
    pub fn create(
        config: &GenerationConfig,
        font: Option<SharedFont>,
    ) -> Result<Arc<dyn ImageBackend>> {
        match config.backend {
            BackendType::ComfyUi => Ok(Arc::new(ComfyUiBackend::new(config)?)),
            BackendType::Placeholder => Ok(Arc::new(PlaceholderBackend::new(font))),
        }
    }
}

//! Batch panel generation with lazy backend initialisation and a
//! placeholder fallback.

use super::backend::{BackendFactory, GenerationRequest, ImageBackend, PlaceholderBackend};
use super::text::SharedFont;
use crate::error::ComicError;
use crate::models::{GenerationConfig, Prompt};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Width and height are snapped to multiples of this
const SIZE_MULTIPLE: u32 = 8;

/// Largest width or height a panel may be generated at
pub const MAX_IMAGE_SIDE: u32 = 2048;

/// Output file name for panel `index`
pub fn panel_filename(index: usize) -> String {
    format!("panel_{}.png", index)
}

/// Nearest multiple of `base` (ties to even), never below `base`
pub fn round_to_multiple(value: u32, base: u32) -> u32 {
    let base = u64::from(base.max(1));
    let steps = (value as f64 / base as f64).round_ties_even() as u64;
    let rounded = (steps * base).max(base);
    // Values close to u32::MAX round up past it; take the multiple below
    u32::try_from(rounded).unwrap_or((u64::from(u32::MAX) / base * base) as u32)
}

/// Generates panel images, preferring the configured backend.
///
/// The backend is created and checked on first use. A successful check is
/// cached; a failed one is retried on the next call.
pub struct ImageGenerator {
    config: GenerationConfig,
    font: Option<SharedFont>,
    backend: Mutex<Option<Arc<dyn ImageBackend>>>,
    placeholder: PlaceholderBackend,
}

impl ImageGenerator {
    pub fn new(config: GenerationConfig, font: Option<SharedFont>) -> Self {
        Self {
            placeholder: PlaceholderBackend::new(font.clone()),
            config,
            font,
            backend: Mutex::new(None),
        }
    }

    /// Use an already constructed backend instead of the configured one
    pub fn with_backend(mut self, backend: Arc<dyn ImageBackend>) -> Self {
        self.backend = Mutex::new(Some(backend));
        self
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Return the ready backend, initialising it if needed
    pub async fn init_backend(&self) -> Option<Arc<dyn ImageBackend>> {
        let mut slot = self.backend.lock().await;
        if let Some(backend) = slot.as_ref() {
            return Some(backend.clone());
        }

        let backend = match BackendFactory::create(&self.config, self.font.clone()) {
            Ok(backend) => backend,
            Err(e) => {
                tracing::warn!(error = %e, "Could not create image backend");
                return None;
            }
        };

        match backend.is_available().await {
            Ok(true) => {
                tracing::info!(
                    backend = backend.name(),
                    model = %self.config.model_id,
                    "Initialized image backend"
                );
                *slot = Some(backend.clone());
                Some(backend)
            }
            Ok(false) => {
                tracing::warn!(
                    backend = backend.name(),
                    url = %self.config.api_url,
                    "Image backend is not reachable"
                );
                None
            }
            Err(e) => {
                tracing::warn!(backend = backend.name(), error = %e, "Image backend availability check failed");
                None
            }
        }
    }

    /// Resolve a prompt into concrete generation parameters
    pub fn resolve_request(&self, index: usize, prompt: &Prompt) -> GenerationRequest {
        let width = prompt.width.unwrap_or(self.config.width);
        let height = prompt.height.unwrap_or(self.config.height);

        GenerationRequest {
            index,
            positive_prompt: prompt.positive_prompt.clone(),
            negative_prompt: prompt.negative_prompt.clone(),
            seed: prompt.seed,
            width: round_to_multiple(width, SIZE_MULTIPLE),
            height: round_to_multiple(height, SIZE_MULTIPLE),
            steps: prompt.steps.unwrap_or(self.config.steps),
            guidance_scale: prompt.guidance_scale.unwrap_or(self.config.guidance_scale),
        }
    }

    /// Rejects a batch whose resolved width or height exceeds [`MAX_IMAGE_SIDE`]
    fn check_sizes(&self, prompts: &[Prompt]) -> std::result::Result<(), ComicError> {
        for (index, prompt) in prompts.iter().enumerate() {
            let request = self.resolve_request(index, prompt);
            if request.width > MAX_IMAGE_SIDE || request.height > MAX_IMAGE_SIDE {
                return Err(ComicError::InvalidImageSize(
                    request.width,
                    request.height,
                    MAX_IMAGE_SIDE,
                ));
            }
        }
        Ok(())
    }

    /// Generate one image per prompt into `output_dir` (or the configured
    /// directory). Always returns one path per prompt: any backend failure
    /// regenerates the whole batch as placeholders.
    pub async fn generate_images(
        &self,
        prompts: &[Prompt],
        output_dir: Option<&Path>,
    ) -> Result<Vec<PathBuf>> {
        self.check_sizes(prompts)?;

        let output_dir = output_dir.unwrap_or(self.config.output_dir.as_path());
        tokio::fs::create_dir_all(output_dir)
            .await
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;

        let Some(backend) = self.init_backend().await else {
            return self.placeholder_generate(prompts, output_dir).await;
        };

        match self.generate_with(backend.as_ref(), prompts, output_dir).await {
            Ok(paths) => Ok(paths),
            Err(e) => {
                tracing::error!(
                    backend = backend.name(),
                    error = %format!("{:#}", e),
                    "Image generation failed, falling back to placeholder"
                );
                self.placeholder_generate(prompts, output_dir).await
            }
        }
    }

    async fn generate_with(
        &self,
        backend: &dyn ImageBackend,
        prompts: &[Prompt],
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::with_capacity(prompts.len());
        for (index, prompt) in prompts.iter().enumerate() {
            let request = self.resolve_request(index, prompt);
            let bytes = backend
                .generate(&request)
                .await
                .with_context(|| format!("Backend failed on panel {}", index))?;

            let path = output_dir.join(panel_filename(index));
            tokio::fs::write(&path, bytes).await?;
            tracing::debug!(path = %path.display(), "Wrote panel");
            paths.push(path);
        }
        Ok(paths)
    }

    /// Write placeholder panels for every prompt
    pub async fn placeholder_generate(
        &self,
        prompts: &[Prompt],
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(output_dir).await?;

        let mut paths = Vec::with_capacity(prompts.len());
        for (index, prompt) in prompts.iter().enumerate() {
            let bytes = self.placeholder.render_png(index, &prompt.positive_prompt)?;
            let path = output_dir.join(panel_filename(index));
            tokio::fs::write(&path, bytes).await?;
            paths.push(path);
        }
        Ok(paths)
    }
}

use crate::generation::backend::BackendType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory
pub const CONFIG_FILE: &str = "storycomic.toml";

// =============================================================================
// Sections
// =============================================================================

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Image generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Which backend to use
    #[serde(default)]
    pub backend: BackendType,

    /// Backend endpoint (ComfyUI server URL)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Checkpoint / model identifier passed to the backend
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// Optional bearer token for the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// Directory where panel images are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_steps")]
    pub steps: u32,

    #[serde(default = "default_guidance_scale")]
    pub guidance_scale: f32,

    #[serde(default = "default_size")]
    pub width: u32,

    #[serde(default = "default_size")]
    pub height: u32,

    /// Upper bound for a single panel generation
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Delay between history polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upper bound for the availability check
    #[serde(default = "default_status_timeout_ms")]
    pub status_timeout_ms: u64,

    /// Upper bound for opening a connection to the backend
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://127.0.0.1:8188".to_string()
}

fn default_model_id() -> String {
    "runwayml/stable-diffusion-v1-5".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output/images")
}

fn default_steps() -> u32 {
    28
}

fn default_guidance_scale() -> f32 {
    7.5
}

fn default_size() -> u32 {
    512
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_status_timeout_ms() -> u64 {
    5_000
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            backend: BackendType::default(),
            api_url: default_api_url(),
            model_id: default_model_id(),
            api_token: None,
            output_dir: default_output_dir(),
            steps: default_steps(),
            guidance_scale: default_guidance_scale(),
            width: default_size(),
            height: default_size(),
            timeout_secs: default_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            status_timeout_ms: default_status_timeout_ms(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Local record storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("storage/db.json")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Drawing and page assembly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// TrueType/OpenType font for bubble and placeholder text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,

    /// Grid page output
    #[serde(default = "default_page_path")]
    pub page_path: PathBuf,

    /// PDF output
    #[serde(default = "default_pdf_path")]
    pub pdf_path: PathBuf,

    #[serde(default = "default_columns")]
    pub columns: u32,
}

fn default_page_path() -> PathBuf {
    PathBuf::from("output/comic_page.png")
}

fn default_pdf_path() -> PathBuf {
    PathBuf::from("output/comic.pdf")
}

fn default_columns() -> u32 {
    2
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            page_path: default_page_path(),
            pdf_path: default_pdf_path(),
            columns: default_columns(),
        }
    }
}

// =============================================================================
// ComicConfig
// =============================================================================

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComicConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub render: RenderConfig,
}

impl ComicConfig {
    /// Load `storycomic.toml` from `dir` and apply environment overrides
    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        let mut config = Self::load_file(&dir.join(CONFIG_FILE))?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load a config file; a missing file yields defaults
    pub fn load_file(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: ComicConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Override fields from environment-style lookups.
    ///
    /// Unparseable numeric values are ignored and the configured value kept.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let gen = &mut self.generation;

        if let Some(v) = lookup("SD_BACKEND") {
            if let Some(backend) = BackendType::from_name(&v) {
                gen.backend = backend;
            }
        }
        if let Some(v) = lookup("SD_API_URL") {
            gen.api_url = v;
        }
        if let Some(v) = lookup("SD_MODEL_ID") {
            gen.model_id = v;
        }
        if let Some(v) = lookup("HF_TOKEN") {
            if !v.is_empty() {
                gen.api_token = Some(v);
            }
        }
        if let Some(v) = lookup("SD_OUTPUT_DIR") {
            gen.output_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("SD_STEPS").and_then(|v| v.parse().ok()) {
            gen.steps = v;
        }
        if let Some(v) = lookup("SD_GUIDANCE").and_then(|v| v.parse().ok()) {
            gen.guidance_scale = v;
        }
        if let Some(v) = lookup("SD_WIDTH").and_then(|v| v.parse().ok()) {
            gen.width = v;
        }
        if let Some(v) = lookup("SD_HEIGHT").and_then(|v| v.parse().ok()) {
            gen.height = v;
        }

        if let Some(v) = lookup("STORYCOMIC_FONT") {
            self.render.font_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("STORYCOMIC_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("STORYCOMIC_PORT").and_then(|v| v.parse().ok()) {
            self.server.port = v;
        }
    }
}

pub mod config;
pub mod prompt;
pub mod story;

pub use config::{ComicConfig, GenerationConfig, RenderConfig, ServerConfig, StorageConfig};
pub use prompt::{GenerationParams, Prompt, Style};
pub use story::{DialogueLine, Panel, ParsedStory};

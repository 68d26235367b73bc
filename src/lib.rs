// Storycomic - story text to comic panels
// Scene splitting, prompt building, image generation and page assembly behind a small HTTP API

pub mod cli;
pub mod error;
pub mod generation;
pub mod logging;
pub mod models;
pub mod nlp;
pub mod server;
pub mod services;
pub mod storage;

pub use anyhow::{Context, Result};
pub use colored::Colorize;

// Re-export commonly used types
pub use error::ComicError;
pub use models::{ComicConfig, DialogueLine, Panel, ParsedStory, Prompt, Style};
pub use nlp::parse_story;

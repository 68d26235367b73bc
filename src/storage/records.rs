use crate::models::{ParsedStory, Style};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A generated comic as kept in the local store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComicRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub style: Style,
    pub story: String,
    pub parsed: ParsedStory,
    /// Panel image files, in panel order
    pub images: Vec<PathBuf>,
    pub overlay_bubbles: bool,
}

impl ComicRecord {
    /// Fresh record id
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn new(
        id: impl Into<String>,
        story: impl Into<String>,
        style: Style,
        parsed: ParsedStory,
        images: Vec<PathBuf>,
        overlay_bubbles: bool,
    ) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
            style,
            story: story.into(),
            parsed,
            images,
            overlay_bubbles,
        }
    }
}

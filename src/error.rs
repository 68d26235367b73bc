use std::path::PathBuf;

/// Domain errors that callers need to tell apart.
///
/// Everything else travels as plain `anyhow::Error`.
#[derive(Debug, thiserror::Error)]
pub enum ComicError {
    #[error("Story text is empty")]
    EmptyStory,

    #[error("No images to assemble")]
    NoImages,

    #[error("Column count must be at least 1, got {0}")]
    InvalidColumns(u32),

    #[error("Page of {0}x{1} pixels is too large")]
    PageTooLarge(u64, u64),

    #[error("Image size {0}x{1} is outside 1..={2} pixels")]
    InvalidImageSize(u32, u32, u32),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Failed to read image '{0}': {1}")]
    ImageRead(PathBuf, image::ImageError),

    #[error("Image backend error: {0}")]
    Backend(String),
}

impl ComicError {
    /// Whether the error was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ComicError::EmptyStory
                | ComicError::NoImages
                | ComicError::InvalidColumns(_)
                | ComicError::PageTooLarge(..)
                | ComicError::InvalidImageSize(..)
                | ComicError::ImageRead(..)
        )
    }
}

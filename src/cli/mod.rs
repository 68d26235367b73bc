pub mod assemble;
pub mod comic;
pub mod init;
pub mod parse;
pub mod prompts;
pub mod serve;

use crate::Result;
use anyhow::Context;
use std::io::Read;
use std::path::Path;

/// Read a story from a file, or from stdin when the path is `-`
pub fn read_story(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut story = String::new();
        std::io::stdin()
            .read_to_string(&mut story)
            .context("Failed to read story from stdin")?;
        return Ok(story);
    }

    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read story file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_story_from_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("story.txt");
        std::fs::write(&path, "Mira: Hi").unwrap();
        assert_eq!(read_story(&path).unwrap(), "Mira: Hi");
    }

    #[test]
    fn test_read_story_missing_file() {
        let err = read_story(Path::new("/nonexistent/story.txt")).unwrap_err();
        assert!(err.to_string().contains("Failed to read story file"));
    }
}

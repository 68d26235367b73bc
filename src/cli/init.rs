use crate::models::config::{ComicConfig, CONFIG_FILE};
use crate::Result;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Write a `storycomic.toml` with default settings into `dir`.
///
/// An existing file is left alone unless `force` is set.
pub fn run(dir: &Path, force: bool) -> Result<PathBuf> {
    let path = dir.join(CONFIG_FILE);

    if path.exists() && !force {
        println!(
            "{}",
            format!("⚠ {} already exists (use --force to overwrite)", path.display()).yellow()
        );
        return Ok(path);
    }

    ComicConfig::default().save(&path)?;
    println!("{}", format!("✓ Wrote {}", path.display()).green());
    println!("   Edit it, or override values with SD_* / STORYCOMIC_* environment variables.");
    Ok(path)
}

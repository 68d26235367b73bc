use crate::error::ComicError;
use crate::generation::{assemble_grid, export_pdf, load_font, ImageGenerator, DEFAULT_THUMB_SIZE};
use crate::models::{ComicConfig, Style};
use crate::services::comic_service::{generate_comic, ComicInput};
use crate::storage::{ComicRecord, LocalDb};
use crate::Result;
use anyhow::Context;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

/// Options for a local story-to-page run
#[derive(Debug, Clone)]
pub struct ComicArgs {
    pub file: PathBuf,
    pub style: String,
    pub no_bubbles: bool,
    pub columns: Option<u32>,
    /// Puts images, page and PDF under one directory
    pub output_dir: Option<PathBuf>,
}

pub async fn run(mut config: ComicConfig, args: ComicArgs) -> Result<()> {
    let story = super::read_story(&args.file)?;
    if story.trim().is_empty() {
        return Err(ComicError::EmptyStory.into());
    }
    let style = Style::from_name(&args.style);

    if let Some(dir) = &args.output_dir {
        config.generation.output_dir = dir.join("images");
        config.render.page_path = dir.join("comic_page.png");
        config.render.pdf_path = dir.join("comic.pdf");
    }
    let columns = args.columns.unwrap_or(config.render.columns);

    println!(
        "{}",
        format!("🎨 Generating {} comic from {}", style, args.file.display()).cyan()
    );

    let font = load_font(config.render.font_path.as_deref());
    let generator = ImageGenerator::new(config.generation.clone(), font.clone());

    let mut input = ComicInput::new(story, style);
    input.overlay_bubbles = !args.no_bubbles;

    let spinner = spinner("Generating panels...");
    let output = generate_comic(&generator, font, &input).await;
    spinner.finish_and_clear();
    let output = output?;

    println!(
        "{}",
        format!(
            "✓ {} panels, characters: {}",
            output.image_paths.len(),
            display_characters(&output.parsed.characters)
        )
        .green()
    );

    let page_path = config.render.page_path.clone();
    let pdf_path = config.render.pdf_path.clone();
    let images = output.image_paths.clone();
    let (png, pdf) = tokio::task::spawn_blocking(move || -> Result<(PathBuf, PathBuf)> {
        let png = assemble_grid(&images, columns, DEFAULT_THUMB_SIZE, &page_path)?;
        let pdf = export_pdf(&png, &pdf_path)?;
        Ok((png, pdf))
    })
    .await
    .context("Page assembly task panicked")??;

    store_record(&config.storage.db_path, input, output.parsed, output.image_paths);

    println!("{}", "✅ Comic ready".green().bold());
    println!("   Page: {}", png.display());
    println!("   PDF:  {}", pdf.display());
    Ok(())
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn display_characters(characters: &[String]) -> String {
    if characters.is_empty() {
        "none".to_string()
    } else {
        characters.join(", ")
    }
}

fn store_record(
    db_path: &Path,
    input: ComicInput,
    parsed: crate::models::ParsedStory,
    images: Vec<PathBuf>,
) {
    let record = ComicRecord::new(
        ComicRecord::generate_id(),
        input.story,
        input.style,
        parsed,
        images,
        input.overlay_bubbles,
    );

    let saved = LocalDb::new(db_path).and_then(|db| db.save(&record.id, &record));
    match saved {
        Ok(()) => println!("   Record: {}", record.id),
        Err(e) => eprintln!("{}", format!("⚠ Failed to store comic record: {:#}", e).yellow()),
    }
}

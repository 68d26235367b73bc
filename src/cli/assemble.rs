use crate::generation::{assemble_grid, export_pdf, DEFAULT_THUMB_SIZE};
use crate::Result;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Lay out existing panel images on one page, optionally exporting a PDF
pub fn run(images: &[PathBuf], columns: u32, output: &Path, pdf: Option<&Path>) -> Result<()> {
    println!(
        "{}",
        format!("🧩 Assembling {} panels into {} columns", images.len(), columns).cyan()
    );

    let page = assemble_grid(images, columns, DEFAULT_THUMB_SIZE, output)?;
    println!("{}", format!("✓ Page written to {}", page.display()).green());

    if let Some(pdf_path) = pdf {
        let pdf = export_pdf(&page, pdf_path)?;
        println!("{}", format!("✓ PDF written to {}", pdf.display()).green());
    }

    Ok(())
}

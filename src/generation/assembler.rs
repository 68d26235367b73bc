//! Page assembly: panel grid PNG and a one-page PDF export.

use crate::error::ComicError;
use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Panel size inside the grid
pub const DEFAULT_THUMB_SIZE: (u32, u32) = (512, 512);

/// US Letter in PDF points
pub const LETTER_SIZE: (u32, u32) = (612, 792);

const JPEG_QUALITY: u8 = 90;

/// Largest page canvas, in pixels, that assembly will allocate
pub const MAX_PAGE_PIXELS: u64 = 128 * 1024 * 1024;

/// Arranges images row-major in a grid and saves it as a PNG.
///
/// Every image is resized to `thumb_size`. The last row is padded with
/// white when the image count does not fill it. Columns beyond the image
/// count stay white too, as long as the page fits in [`MAX_PAGE_PIXELS`].
pub fn assemble_grid(
    image_paths: &[PathBuf],
    columns: u32,
    thumb_size: (u32, u32),
    output_path: &Path,
) -> Result<PathBuf> {
    if image_paths.is_empty() {
        return Err(ComicError::NoImages.into());
    }
    // Checked before any file is read
    page_size(image_paths.len(), columns, thumb_size)?;

    let images = image_paths
        .iter()
        .map(|path| {
            image::open(path)
                .map(|img| img.to_rgb8())
                .map_err(|e| ComicError::ImageRead(path.clone(), e))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let page = compose_grid(&images, columns, thumb_size)?;

    ensure_parent(output_path)?;
    page.save(output_path)
        .with_context(|| format!("Failed to save {}", output_path.display()))?;
    tracing::info!(path = %output_path.display(), panels = images.len(), "Assembled comic page");

    Ok(output_path.to_path_buf())
}

/// Canvas size for `count` panels laid out in `columns` columns
pub fn page_size(
    count: usize,
    columns: u32,
    thumb_size: (u32, u32),
) -> std::result::Result<(u32, u32), ComicError> {
    if columns == 0 {
        return Err(ComicError::InvalidColumns(columns));
    }

    let (w, h) = (u64::from(thumb_size.0), u64::from(thumb_size.1));
    let rows = (count as u64).div_ceil(u64::from(columns));
    let width = w.saturating_mul(u64::from(columns));
    let height = h.saturating_mul(rows);

    let too_large = width
        .checked_mul(height)
        .map_or(true, |pixels| pixels > MAX_PAGE_PIXELS);
    if too_large {
        return Err(ComicError::PageTooLarge(width, height));
    }

    // Both sides fit in u32 once the pixel budget holds
    Ok((width as u32, height as u32))
}

/// Paste already decoded panels into a white grid canvas
pub fn compose_grid(images: &[RgbImage], columns: u32, thumb_size: (u32, u32)) -> Result<RgbImage> {
    let (page_w, page_h) = page_size(images.len(), columns, thumb_size)?;
    let (w, h) = thumb_size;
    let mut page = RgbImage::from_pixel(page_w, page_h, Rgb([255, 255, 255]));

    for (idx, img) in images.iter().enumerate() {
        let idx = idx as u64;
        let thumb = imageops::resize(img, w, h, FilterType::CatmullRom);
        let x = (idx % u64::from(columns)) * u64::from(w);
        let y = (idx / u64::from(columns)) * u64::from(h);
        imageops::replace(&mut page, &thumb, x as i64, y as i64);
    }

    Ok(page)
}

/// Embeds the image into a single US Letter PDF page, stretched to fill it
pub fn export_pdf(image_path: &Path, pdf_path: &Path) -> Result<PathBuf> {
    let image = image::open(image_path)
        .map_err(|e| ComicError::ImageRead(image_path.to_path_buf(), e))?
        .to_rgb8();

    let mut jpeg = Vec::new();
    image
        .write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY))
        .context("Failed to encode page as JPEG")?;

    let pdf = single_image_pdf(&jpeg, image.width(), image.height(), LETTER_SIZE);

    ensure_parent(pdf_path)?;
    std::fs::write(pdf_path, pdf)
        .with_context(|| format!("Cannot export PDF to {}", pdf_path.display()))?;
    tracing::info!(path = %pdf_path.display(), "Exported PDF");

    Ok(pdf_path.to_path_buf())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Minimal PDF 1.4 document: one page, one DCT-encoded image XObject
fn single_image_pdf(jpeg: &[u8], width: u32, height: u32, page: (u32, u32)) -> Vec<u8> {
    let (page_w, page_h) = page;
    let content = format!("q\n{} 0 0 {} 0 0 cm\n/Im0 Do\nQ\n", page_w, page_h);

    let mut out: Vec<u8> = Vec::new();
    let mut offsets: Vec<usize> = Vec::new();

    out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    let mut object = |out: &mut Vec<u8>, body: &[u8]| {
        offsets.push(out.len());
        let id = offsets.len();
        let _ = write!(out, "{} 0 obj\n", id);
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    };

    object(&mut out, b"<< /Type /Catalog /Pages 2 0 R >>");
    object(&mut out, b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>");
    object(
        &mut out,
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
             /Resources << /XObject << /Im0 4 0 R >> >> /Contents 5 0 R >>",
            page_w, page_h
        )
        .as_bytes(),
    );

    let mut image_obj = format!(
        "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceRGB \
         /BitsPerComponent 8 /Filter /DCTDecode /Length {} >>\nstream\n",
        width,
        height,
        jpeg.len()
    )
    .into_bytes();
    image_obj.extend_from_slice(jpeg);
    image_obj.extend_from_slice(b"\nendstream");
    object(&mut out, &image_obj);

    let mut content_obj = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
    content_obj.extend_from_slice(content.as_bytes());
    content_obj.extend_from_slice(b"endstream");
    object(&mut out, &content_obj);

    let xref_offset = out.len();
    let _ = write!(out, "xref\n0 {}\n0000000000 65535 f \n", offsets.len() + 1);
    for offset in &offsets {
        let _ = write!(out, "{:010} 00000 n \n", offset);
    }
    let _ = write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        offsets.len() + 1,
        xref_offset
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_panel(dir: &Path, name: &str, size: (u32, u32), color: [u8; 3]) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(size.0, size.1, Rgb(color)).save(&path).unwrap();
        path
    }

    #[test]
    fn test_assemble_grid_layout() {
        let temp = tempfile::tempdir().unwrap();
        let paths = vec![
            write_panel(temp.path(), "a.png", (100, 80), [255, 0, 0]),
            write_panel(temp.path(), "b.png", (64, 64), [0, 255, 0]),
            write_panel(temp.path(), "c.png", (30, 90), [0, 0, 255]),
        ];
        let out = temp.path().join("out/page.png");

        let saved = assemble_grid(&paths, 2, (50, 40), &out).unwrap();
        assert_eq!(saved, out);

        let page = image::open(&out).unwrap().to_rgb8();
        assert_eq!(page.dimensions(), (100, 80));
        assert_eq!(*page.get_pixel(25, 20), Rgb([255, 0, 0]));
        assert_eq!(*page.get_pixel(75, 20), Rgb([0, 255, 0]));
        assert_eq!(*page.get_pixel(25, 60), Rgb([0, 0, 255]));
        // Empty cell of the last row stays white
        assert_eq!(*page.get_pixel(75, 60), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_assemble_grid_rejects_empty_input() {
        let temp = tempfile::tempdir().unwrap();
        let err = assemble_grid(&[], 2, DEFAULT_THUMB_SIZE, &temp.path().join("p.png")).unwrap_err();
        assert!(matches!(err.downcast_ref::<ComicError>(), Some(ComicError::NoImages)));
    }

    #[test]
    fn test_assemble_grid_rejects_zero_columns() {
        let temp = tempfile::tempdir().unwrap();
        let paths = vec![write_panel(temp.path(), "a.png", (8, 8), [0, 0, 0])];
        let err = assemble_grid(&paths, 0, DEFAULT_THUMB_SIZE, &temp.path().join("p.png")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ComicError>(),
            Some(ComicError::InvalidColumns(0))
        ));
    }

    #[test]
    fn test_assemble_grid_missing_image() {
        let temp = tempfile::tempdir().unwrap();
        let paths = vec![temp.path().join("missing.png")];
        let err = assemble_grid(&paths, 1, (8, 8), &temp.path().join("p.png")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ComicError>(),
            Some(ComicError::ImageRead(..))
        ));
    }

    #[test]
    fn test_compose_grid_single_column() {
        let images = vec![RgbImage::new(4, 4), RgbImage::new(4, 4)];
        let page = compose_grid(&images, 1, (10, 10)).unwrap();
        assert_eq!(page.dimensions(), (10, 20));
    }

    #[test]
    fn test_extra_columns_stay_white() {
        let images = vec![RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]))];
        let page = compose_grid(&images, 3, (10, 10)).unwrap();
        assert_eq!(page.dimensions(), (30, 10));
        assert_eq!(*page.get_pixel(25, 5), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_page_size_limits() {
        assert_eq!(page_size(3, 2, (512, 512)).unwrap(), (1024, 1024));
        assert!(matches!(
            page_size(1, 1_000_000, (512, 512)),
            Err(ComicError::PageTooLarge(512_000_000, 512))
        ));
        assert!(matches!(
            page_size(usize::MAX, 1, (u32::MAX, u32::MAX)),
            Err(ComicError::PageTooLarge(..))
        ));
        assert!(matches!(page_size(1, 0, (8, 8)), Err(ComicError::InvalidColumns(0))));
    }

    #[test]
    fn test_assemble_grid_rejects_huge_column_count() {
        let temp = tempfile::tempdir().unwrap();
        let paths = vec![write_panel(temp.path(), "a.png", (4, 4), [0, 0, 0])];
        let out = temp.path().join("p.png");
        let err = assemble_grid(&paths, 1_000_000, DEFAULT_THUMB_SIZE, &out).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ComicError>(),
            Some(ComicError::PageTooLarge(..))
        ));
        assert!(!out.exists());
    }

    #[test]
    fn test_export_pdf_structure() {
        let temp = tempfile::tempdir().unwrap();
        let png = write_panel(temp.path(), "page.png", (40, 20), [10, 20, 30]);
        let pdf_path = temp.path().join("out/comic.pdf");

        let saved = export_pdf(&png, &pdf_path).unwrap();
        assert_eq!(saved, pdf_path);

        let bytes = std::fs::read(&pdf_path).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(bytes.ends_with(b"%%EOF\n"));

        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/MediaBox [0 0 612 792]"));
        assert!(text.contains("/Width 40 /Height 20"));
        assert!(text.contains("/Filter /DCTDecode"));
    }

    #[test]
    fn test_pdf_xref_offsets_point_at_objects() {
        let pdf = single_image_pdf(b"\xFF\xD8fakejpeg\xFF\xD9", 1, 1, LETTER_SIZE);

        let marker = b"startxref\n";
        let pos = pdf
            .windows(marker.len())
            .rposition(|w| w == marker)
            .unwrap()
            + marker.len();
        let tail = std::str::from_utf8(&pdf[pos..]).unwrap();
        let xref_offset: usize = tail.lines().next().unwrap().parse().unwrap();

        let xref = std::str::from_utf8(&pdf[xref_offset..]).unwrap();
        assert!(xref.starts_with("xref"));

        let entries: Vec<usize> = xref
            .lines()
            .skip(3)
            .take(5)
            .map(|l| l[..10].parse().unwrap())
            .collect();
        assert_eq!(entries.len(), 5);
        for (i, offset) in entries.iter().enumerate() {
            let header = format!("{} 0 obj", i + 1);
            assert!(pdf[*offset..].starts_with(header.as_bytes()));
        }
    }
}

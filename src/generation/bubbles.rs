//! Speech-bubble overlay drawn straight into panel images.

use crate::error::ComicError;
use crate::generation::text::{self, SharedFont};
use crate::models::DialogueLine;
use ab_glyph::PxScale;
use anyhow::Result;
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_polygon_mut, draw_polygon_mut,
    draw_text_mut,
};
use imageproc::point::Point;
use imageproc::rect::Rect;
use std::path::Path;

const MARGIN: i32 = 10;
const SLOT_HEIGHT: i32 = 50;
const BUBBLE_HEIGHT: i32 = SLOT_HEIGHT - 10;
const CORNER_RADIUS: i32 = 20;
const OUTLINE_WIDTH: i32 = 2;
const TAIL_HALF_WIDTH: i32 = 10;
const TAIL_HEIGHT: i32 = 15;
const TEXT_INSET_X: i32 = 15;
const TEXT_INSET_Y: i32 = 5;
const FONT_SCALE: f32 = 18.0;

const FILL: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);

/// Overlay one bubble per dialogue line onto the image at `path`, in place.
///
/// Bubbles stack upward from the bottom edge. Without a font only the
/// bubble shapes are drawn.
pub fn draw_speech_bubbles(
    path: &Path,
    dialogues: &[DialogueLine],
    font: Option<&SharedFont>,
) -> Result<()> {
    let mut image = image::open(path)
        .map_err(|e| ComicError::ImageRead(path.to_path_buf(), e))?
        .to_rgb8();

    overlay_bubbles(&mut image, dialogues, font);
    image.save(path)?;
    Ok(())
}

/// Draw the bubbles onto an in-memory image
pub fn overlay_bubbles(image: &mut RgbImage, dialogues: &[DialogueLine], font: Option<&SharedFont>) {
    let (width, height) = (image.width() as i32, image.height() as i32);
    let bubble_width = width - 2 * MARGIN;
    if bubble_width <= 2 * OUTLINE_WIDTH {
        return;
    }

    let mut y = height - MARGIN - SLOT_HEIGHT * dialogues.len() as i32;
    for dialogue in dialogues {
        let x = MARGIN;
        draw_bubble(image, x, y, bubble_width, BUBBLE_HEIGHT);
        draw_tail(image, x + bubble_width / 2, y + BUBBLE_HEIGHT);

        if let Some(font) = font {
            let mut text_x = x + TEXT_INSET_X;
            if dialogue.has_speaker() {
                let label = format!("{}: ", dialogue.speaker);
                draw_text_mut(
                    image,
                    INK,
                    text_x,
                    y + TEXT_INSET_Y,
                    PxScale::from(FONT_SCALE),
                    font.as_ref(),
                    &label,
                );
                text_x += text::text_width(font, FONT_SCALE, &label) as i32;
            }
            draw_text_mut(
                image,
                INK,
                text_x,
                y + TEXT_INSET_Y,
                PxScale::from(FONT_SCALE),
                font.as_ref(),
                &dialogue.line,
            );
        }

        y += SLOT_HEIGHT;
    }
}

/// Outlined rounded rectangle: ink body, then the fill inset by the outline
fn draw_bubble(image: &mut RgbImage, x: i32, y: i32, w: i32, h: i32) {
    fill_rounded_rect(image, x, y, w, h, CORNER_RADIUS, INK);
    fill_rounded_rect(
        image,
        x + OUTLINE_WIDTH,
        y + OUTLINE_WIDTH,
        w - 2 * OUTLINE_WIDTH,
        h - 2 * OUTLINE_WIDTH,
        CORNER_RADIUS - OUTLINE_WIDTH,
        FILL,
    );
}

/// Triangle pointing down from the bubble's bottom edge
fn draw_tail(image: &mut RgbImage, tip_x: i32, top_y: i32) {
    let filled = [
        Point::new(tip_x - TAIL_HALF_WIDTH, top_y),
        Point::new(tip_x + TAIL_HALF_WIDTH, top_y),
        Point::new(tip_x, top_y + TAIL_HEIGHT),
    ];
    draw_polygon_mut(image, &filled, FILL);

    let outline = filled.map(|p| Point::new(p.x as f32, p.y as f32));
    draw_hollow_polygon_mut(image, &outline, INK);
}

fn fill_rounded_rect(image: &mut RgbImage, x: i32, y: i32, w: i32, h: i32, radius: i32, color: Rgb<u8>) {
    if w <= 0 || h <= 0 {
        return;
    }
    let r = radius.clamp(0, w.min(h) / 2);

    if w - 2 * r > 0 {
        draw_filled_rect_mut(
            image,
            Rect::at(x + r, y).of_size((w - 2 * r) as u32, h as u32),
            color,
        );
    }
    if h - 2 * r > 0 {
        draw_filled_rect_mut(
            image,
            Rect::at(x, y + r).of_size(w as u32, (h - 2 * r) as u32),
            color,
        );
    }
    if r > 0 {
        for (cx, cy) in [
            (x + r, y + r),
            (x + w - 1 - r, y + r),
            (x + r, y + h - 1 - r),
            (x + w - 1 - r, y + h - 1 - r),
        ] {
            draw_filled_circle_mut(image, (cx, cy), r, color);
        }
    }
}

//! One-shot generator for the default certificate background.

use ab_glyph::{FontVec, PxScale};
use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::path::Path;

use super::fonts::{FontSource, NameFont};
use super::layout::{PLAIN_BACKGROUND, PLAIN_SIZE};
use crate::error::AppResult;

const GOLD: Rgb<u8> = Rgb([0xd4, 0xaf, 0x37]);
const DARK_GOLD: Rgb<u8> = Rgb([0xb8, 0x94, 0x1e]);
const HEADING: Rgb<u8> = Rgb([0x2c, 0x3e, 0x50]);
const SUBTITLE: Rgb<u8> = Rgb([0x55, 0x55, 0x55]);
const RULE: Rgb<u8> = Rgb([0xcc, 0xcc, 0xcc]);

const BORDER_WIDTH: u32 = 20;
const INNER_OFFSET: u32 = 50;
const CORNER_SIZE: u32 = 100;
const CORNER_THICKNESS: u32 = 8;

pub fn create_template(output: &Path, font_sources: &[FontSource]) -> AppResult<()> {
    let image = draw_template(&NameFont::resolve(font_sources));
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    image.save_with_format(output, ImageFormat::Jpeg)?;
    tracing::info!(
        "Certificate template written to {} ({}x{})",
        output.display(),
        image.width(),
        image.height()
    );
    Ok(())
}

pub fn draw_template(font: &NameFont) -> RgbImage {
    let (width, height) = PLAIN_SIZE;
    let mut img = RgbImage::from_pixel(width, height, PLAIN_BACKGROUND);

    // Outer border as four solid bands.
    let w = BORDER_WIDTH;
    for (x, y, bw, bh) in [
        (0, 0, width, w),
        (0, height - w, width, w),
        (0, 0, w, height),
        (width - w, 0, w, height),
    ] {
        draw_filled_rect_mut(&mut img, Rect::at(x as i32, y as i32).of_size(bw, bh), GOLD);
    }

    for inset in 0..5 {
        let o = INNER_OFFSET + inset;
        draw_hollow_rect_mut(
            &mut img,
            Rect::at(o as i32, o as i32).of_size(width - 2 * o, height - 2 * o),
            DARK_GOLD,
        );
    }

    draw_corners(&mut img);

    let rule_y = (height / 2 + 50) as i32;
    draw_filled_rect_mut(&mut img, Rect::at(400, rule_y).of_size(width - 800, 2), RULE);

    if let NameFont::Outline(face) = font {
        draw_centered(&mut img, face, "CERTIFICATE OF ACHIEVEMENT", 100.0, 150, HEADING);
        draw_centered(&mut img, face, "This is to certify that", 50.0, 320, SUBTITLE);
        draw_centered(
            &mut img,
            face,
            "has successfully completed the program",
            50.0,
            (height / 2 + 200) as i32,
            SUBTITLE,
        );
    } else {
        tracing::warn!("No font file available, template drawn without captions");
    }

    img
}

fn draw_corners(img: &mut RgbImage) {
    let (width, height) = img.dimensions();
    let (o, c, t) = (INNER_OFFSET, CORNER_SIZE, CORNER_THICKNESS);
    let far_x = width - o - t;
    let far_y = height - o - t;

    for (x, y) in [(o, o), (far_x, o), (o, far_y), (far_x, far_y)] {
        let arm_x = if x == o { x } else { width - o - c };
        let arm_y = if y == o { y } else { height - o - c };
        draw_filled_rect_mut(img, Rect::at(arm_x as i32, y as i32).of_size(c, t), GOLD);
        draw_filled_rect_mut(img, Rect::at(x as i32, arm_y as i32).of_size(t, c), GOLD);
    }
}

fn draw_centered(img: &mut RgbImage, font: &FontVec, text: &str, size: f32, y: i32, color: Rgb<u8>) {
    let scale = PxScale::from(size);
    let (text_width, _) = text_size(scale, font, text);
    let x = (img.width() as i32 - text_width as i32).div_euclid(2);
    draw_text_mut(img, color, x, y, scale, font, text);
}

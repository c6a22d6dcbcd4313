use ab_glyph::{Font, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::models::{BoundingBox, Category};

pub const FALLBACK_COLOR: Rgb<u8> = Rgb([255, 165, 0]); // orange
pub const TEXT_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
pub const PANEL_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Horizontal padding on each side of the label text
pub const LABEL_PADDING: u32 = 4;
/// Average glyph width used when no font is available to measure text
const FALLBACK_CHAR_WIDTH: f32 = 10.0;

pub fn category_color(category: Option<Category>) -> Rgb<u8> {
    match category {
        Some(Category::Matang) => Rgb([255, 0, 0]),
        Some(Category::Mentah) => Rgb([0, 255, 0]),
        Some(Category::Berbunga) => Rgb([255, 255, 0]),
        None => FALLBACK_COLOR,
    }
}

fn canvas_rect(image: &RgbImage) -> Option<Rect> {
    if image.width() == 0 || image.height() == 0 {
        return None;
    }
    Some(Rect::at(0, 0).of_size(image.width(), image.height()))
}

/// Box outline of `stroke` pixels, drawn inwards from the box edges and
/// clipped to the canvas.
pub fn draw_box(image: &mut RgbImage, bbox: &BoundingBox, stroke: u32, color: Rgb<u8>) {
    let (w, h) = (image.width() as i32, image.height() as i32);
    if w == 0 || h == 0 {
        return;
    }
    let x1 = bbox.x1.clamp(0, w - 1);
    let y1 = bbox.y1.clamp(0, h - 1);
    let x2 = bbox.x2.clamp(0, w - 1);
    let y2 = bbox.y2.clamp(0, h - 1);
    if x1 >= x2 || y1 >= y2 {
        return;
    }

    for t in 0..stroke as i32 {
        let rw = x2 - x1 + 1 - 2 * t;
        let rh = y2 - y1 + 1 - 2 * t;
        if rw <= 0 || rh <= 0 {
            break;
        }
        let rect = Rect::at(x1 + t, y1 + t).of_size(rw as u32, rh as u32);
        draw_hollow_rect_mut(image, rect, color);
    }
}

/// Width of `text` in pixels, measured with `font` when there is one.
pub fn measure_text<F: Font>(font: Option<&F>, scale: PxScale, text: &str) -> u32 {
    match font {
        Some(font) => text_size(scale, font, text).0,
        None => (text.chars().count() as f32 * FALLBACK_CHAR_WIDTH).ceil() as u32,
    }
}

/// Where the label background for `bbox` goes.
///
/// Above the box when there is room, otherwise just inside its top edge; the
/// result is always fully on the canvas.
pub fn label_rect(canvas: (u32, u32), bbox: &BoundingBox, text_width: u32, height: u32) -> Option<Rect> {
    let (cw, ch) = canvas;
    let w = (text_width + 2 * LABEL_PADDING).min(cw);
    let h = height.min(ch);
    if w == 0 || h == 0 {
        return None;
    }

    let top = bbox
        .y1
        .checked_sub(height as i32)
        .filter(|t| *t > 0)
        .unwrap_or(bbox.y1);
    let top = top.clamp(0, (ch - h) as i32);
    let left = bbox.x1.clamp(0, (cw - w) as i32);
    Some(Rect::at(left, top).of_size(w, h))
}

pub fn draw_label<F: Font>(
    image: &mut RgbImage,
    bbox: &BoundingBox,
    caption: &str,
    color: Rgb<u8>,
    font: Option<&F>,
    scale: PxScale,
    height: u32,
) {
    let text_width = measure_text(font, scale, caption);
    let Some(rect) = label_rect(image.dimensions(), bbox, text_width, height) else {
        return;
    };
    draw_filled_rect_mut(image, rect, color);

    if let Some(font) = font {
        let text_height = text_size(scale, font, caption).1.min(rect.height());
        let y = rect.top() + ((rect.height() - text_height) / 2) as i32;
        draw_text_mut(
            image,
            TEXT_COLOR,
            rect.left() + LABEL_PADDING as i32,
            y,
            scale,
            font,
            caption,
        );
    }
}

/// Darken `rect` towards black by `alpha`, clipped to the canvas.
pub fn shade_rect(image: &mut RgbImage, rect: Rect, alpha: f32) {
    let Some(area) = canvas_rect(image).and_then(|c| c.intersect(rect)) else {
        return;
    };
    let keep = 1.0 - alpha.clamp(0.0, 1.0);
    for y in area.top()..=area.bottom() {
        for x in area.left()..=area.right() {
            let pixel = image.get_pixel_mut(x as u32, y as u32);
            for c in pixel.0.iter_mut() {
                *c = (*c as f32 * keep).round() as u8;
            }
        }
    }
}

/// One line of the summary panel
pub struct PanelLine {
    pub text: String,
    pub color: Rgb<u8>,
}

pub fn draw_panel<F: Font>(
    image: &mut RgbImage,
    origin: (i32, i32),
    size: (u32, u32),
    alpha: f32,
    lines: &[PanelLine],
    font: Option<&F>,
    scale: PxScale,
    line_height: u32,
) {
    if size.0 == 0 || size.1 == 0 {
        return;
    }
    shade_rect(image, Rect::at(origin.0, origin.1).of_size(size.0, size.1), alpha);

    let Some(font) = font else {
        return;
    };
    let left = origin.0 + LABEL_PADDING as i32 * 2;
    for (i, line) in lines.iter().enumerate() {
        let y = origin.1 + LABEL_PADDING as i32 + (i as u32 * line_height) as i32;
        if y >= image.height() as i32 {
            break;
        }
        draw_text_mut(image, line.color, left, y, scale, font, &line.text);
    }
}

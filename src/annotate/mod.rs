pub mod draw;
pub mod font;

use std::io::Cursor;
use std::path::PathBuf;

use ab_glyph::{FontVec, PxScale};
use base64::{Engine, prelude::BASE64_STANDARD};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageReader, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{Category, CategoryStats, Detection, percent, top_detection};
use draw::{PANEL_TEXT_COLOR, PanelLine, category_color};

/// Drawing and encoding parameters. Fixed per process, never per call, so
/// identical pixels always encode to identical bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    /// Box outline width in pixels
    pub stroke_width: u32,
    /// Height of the filled label background
    pub label_height: u32,
    pub font_size: f32,
    pub jpeg_quality: u8,
    pub panel_origin: (i32, i32),
    pub panel_size: (u32, u32),
    /// Opacity of the summary panel backdrop
    pub panel_alpha: f32,
    pub panel_line_height: u32,
    /// TrueType font for captions; system fonts, then the embedded one, are
    /// tried when unset
    pub font_path: Option<PathBuf>,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            stroke_width: 2,
            label_height: 25,
            font_size: 18.0,
            jpeg_quality: 95,
            panel_origin: (10, 10),
            panel_size: (200, 112),
            panel_alpha: 0.55,
            panel_line_height: 26,
            font_path: None,
        }
    }
}

/// Result of annotating one image
#[derive(Debug, Clone)]
pub struct Annotation {
    /// JPEG-encoded annotated image
    pub image: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub stats: CategoryStats,
    pub top_detection: Option<Detection>,
}

impl Annotation {
    pub fn image_base64(&self) -> String {
        BASE64_STANDARD.encode(&self.image)
    }
}

pub struct Annotator {
    config: AnnotatorConfig,
    font: Option<FontVec>,
}

impl std::fmt::Debug for Annotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Annotator")
            .field("config", &self.config)
            .field("font", &self.font.is_some())
            .finish()
    }
}

/// Decode uploaded bytes, guessing the format from the content.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| Error::InvalidImage(image::ImageError::IoError(e)))?
        .decode()
        .map_err(Error::InvalidImage)
}

impl Annotator {
    pub fn new(config: AnnotatorConfig, font: Option<FontVec>) -> Self {
        Self { config, font }
    }

    /// Build an annotator, loading the label font described by `config`.
    pub fn from_config(config: AnnotatorConfig) -> Self {
        let font = font::load_font(config.font_path.as_deref());
        Self::new(config, font)
    }

    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Draw boxes, labels and the summary panel onto `image` in place.
    pub fn render(&self, image: &mut RgbImage, detections: &[Detection], confidence: f32) -> CategoryStats {
        let scale = PxScale::from(self.config.font_size);
        let font = self.font.as_ref();
        let mut stats = CategoryStats::default();

        for detection in detections {
            let category = detection.category();
            let color = category_color(category);
            draw::draw_box(image, &detection.bbox, self.config.stroke_width, color);
            draw::draw_label(
                image,
                &detection.bbox,
                &detection.caption(),
                color,
                font,
                scale,
                self.config.label_height,
            );
            if let Some(category) = category {
                stats.record(category);
            }
        }

        let mut lines = vec![PanelLine {
            text: format!("Confidence: {}%", percent(confidence as f64)),
            color: PANEL_TEXT_COLOR,
        }];
        lines.extend(Category::ALL.iter().map(|&c| PanelLine {
            text: format!("{}: {}", c.title(), stats.get(c)),
            color: category_color(Some(c)),
        }));
        draw::draw_panel(
            image,
            self.config.panel_origin,
            self.config.panel_size,
            self.config.panel_alpha,
            &lines,
            font,
            scale,
            self.config.panel_line_height,
        );

        stats
    }

    pub fn encode(&self, image: &RgbImage) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let quality = self.config.jpeg_quality.clamp(1, 100);
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
        encoder.encode_image(image).map_err(Error::Encode)?;
        Ok(buf)
    }

    pub fn annotate(&self, image: DynamicImage, detections: &[Detection], confidence: f32) -> Result<Annotation> {
        let mut canvas = image.into_rgb8();
        let stats = self.render(&mut canvas, detections, confidence);
        let encoded = self.encode(&canvas)?;
        debug!(
            detections = detections.len(),
            matang = stats.matang,
            mentah = stats.mentah,
            berbunga = stats.berbunga,
            bytes = encoded.len(),
            "annotated image"
        );
        Ok(Annotation {
            image: encoded,
            width: canvas.width(),
            height: canvas.height(),
            stats,
            top_detection: top_detection(detections).cloned(),
        })
    }

    pub fn annotate_bytes(&self, bytes: &[u8], detections: &[Detection], confidence: f32) -> Result<Annotation> {
        let image = decode_image(bytes)?;
        self.annotate(image, detections, confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BoundingBox;
    use image::Rgb;

    fn annotator() -> Annotator {
        Annotator::new(AnnotatorConfig::default(), None)
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_image(b"definitely not an image"),
            Err(Error::InvalidImage(_))
        ));
        assert!(matches!(decode_image(&[]), Err(Error::InvalidImage(_))));
    }

    #[test]
    fn test_render_counts_and_colors() {
        let mut image = RgbImage::from_pixel(400, 300, Rgb([200, 200, 200]));
        let detections = vec![
            Detection::new("Matang", 0.92, BoundingBox::new(250, 150, 320, 220)),
            Detection::new("Unknown", 0.5, BoundingBox::new(60, 200, 120, 260)),
        ];
        let stats = annotator().render(&mut image, &detections, 0.4);

        assert_eq!(stats, CategoryStats { matang: 1, mentah: 0, berbunga: 0 });
        assert_eq!(*image.get_pixel(285, 220), Rgb([255, 0, 0]));
        assert_eq!(*image.get_pixel(60, 240), draw::FALLBACK_COLOR);
        // label background sits above the box
        assert_eq!(*image.get_pixel(252, 140), Rgb([255, 0, 0]));
        // summary panel darkens the corner
        let panel = image.get_pixel(12, 12);
        assert!(panel[0] < 200);
        // untouched area
        assert_eq!(*image.get_pixel(380, 20), Rgb([200, 200, 200]));
    }

    #[test]
    fn test_render_tiny_image_does_not_panic() {
        let mut image = RgbImage::from_pixel(8, 6, Rgb([10, 10, 10]));
        let detections = vec![Detection::new("Mentah", 0.7, BoundingBox::new(1, 1, 7, 5))];
        let stats = annotator().render(&mut image, &detections, 0.4);
        assert_eq!(stats.mentah, 1);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 48, Rgb([30, 120, 60])));
        let a = annotator().annotate(image.clone(), &[], 0.4).unwrap();
        let b = annotator().annotate(image, &[], 0.4).unwrap();
        assert_eq!(a.image, b.image);
        assert_eq!((a.width, a.height), (64, 48));
    }
}

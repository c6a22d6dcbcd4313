//! Integration tests for the annotation and statistics path.

mod common;

use ab_glyph::PxScale;
use common::*;
use image::{Rgb, RgbImage};
use lacaktani::annotate::{draw, font};
use lacaktani::models::top_detection;

fn annotator() -> Annotator {
    Annotator::new(AnnotatorConfig::default(), None)
}

#[test]
fn test_scenario_matang_and_unknown() -> anyhow::Result<()> {
    let image = create_test_image(120, 100);
    let annotation = annotator().annotate_bytes(&image, &sample_detections(), 0.4)?;

    assert_eq!(
        annotation.stats,
        CategoryStats {
            matang: 1,
            mentah: 0,
            berbunga: 0
        }
    );
    let top = annotation.top_detection.expect("top detection present");
    assert_eq!(top.label, "Matang");
    assert_eq!(top.confidence, 0.92);
    Ok(())
}

#[test]
fn test_empty_detections_keep_dimensions() -> anyhow::Result<()> {
    let image = create_test_image(97, 61);
    let annotation = annotator().annotate_bytes(&image, &[], 0.4)?;

    assert_eq!(annotation.stats, CategoryStats::default());
    assert!(annotation.top_detection.is_none());

    let decoded = image::load_from_memory(&annotation.image)?;
    assert_eq!((decoded.width(), decoded.height()), (97, 61));
    assert_eq!(
        image::guess_format(&annotation.image)?,
        image::ImageFormat::Jpeg
    );
    Ok(())
}

#[test]
fn test_stats_never_exceed_detections() -> anyhow::Result<()> {
    let image = create_test_image(200, 200);
    let cases = vec![
        vec![],
        vec![detection("matang", 0.3, 1, 1, 20, 20)],
        vec![
            detection("MENTAH", 0.6, 1, 1, 20, 20),
            detection(" berbunga", 0.6, 30, 30, 60, 60),
            detection("Berbunga", 0.8, 70, 70, 120, 120),
        ],
        vec![
            detection("Matang", 0.6, 1, 1, 20, 20),
            detection("Mentah", 0.7, 30, 30, 60, 60),
            detection("Berbunga", 0.8, 70, 70, 120, 120),
        ],
    ];

    for detections in cases {
        let annotation = annotator().annotate_bytes(&image, &detections, 0.25)?;
        let total = annotation.stats.total() as usize;
        assert!(total <= detections.len());
        let all_known = detections.iter().all(|d| d.category().is_some());
        assert_eq!(total == detections.len(), all_known);

        let max = detections
            .iter()
            .map(|d| d.confidence)
            .fold(None, |m: Option<f32>, c| Some(m.map_or(c, |m| m.max(c))));
        assert_eq!(annotation.top_detection.map(|d| d.confidence), max);
        assert_eq!(
            top_detection(&detections).map(|d| d.confidence),
            max
        );
    }
    Ok(())
}

#[test]
fn test_padded_label_is_not_counted() -> anyhow::Result<()> {
    let image = create_test_image(80, 80);
    let detections = vec![detection("Matang ", 0.9, 5, 5, 40, 40)];
    let annotation = annotator().annotate_bytes(&image, &detections, 0.4)?;
    assert_eq!(annotation.stats.total(), 0);
    assert_eq!(annotation.top_detection.unwrap().label, "Matang ");
    Ok(())
}

#[test]
fn test_invalid_image_is_rejected() {
    let result = annotator().annotate_bytes(b"\x89PNG but not really", &sample_detections(), 0.4);
    assert!(matches!(result, Err(Error::InvalidImage(_))));
}

#[test]
fn test_panel_drawn_without_detections() {
    // 1. Render nothing onto a flat image
    let annotator = annotator();
    let mut image = RgbImage::from_pixel(300, 200, Rgb([200, 200, 200]));
    let stats = annotator.render(&mut image, &[], 0.4);
    assert_eq!(stats, CategoryStats::default());

    // 2. Every pixel of the panel is darkened
    let (ox, oy) = annotator.config().panel_origin;
    let (pw, ph) = annotator.config().panel_size;
    for y in oy as u32..oy as u32 + ph {
        for x in ox as u32..ox as u32 + pw {
            let p = image.get_pixel(x, y);
            assert!(p[0] < 200 && p[1] < 200 && p[2] < 200, "({x}, {y}) not shaded");
        }
    }

    // 3. Outside the panel nothing changed
    assert_eq!(*image.get_pixel(ox as u32 - 1, oy as u32), Rgb([200, 200, 200]));
    assert_eq!(*image.get_pixel(ox as u32 + pw, oy as u32 + ph), Rgb([200, 200, 200]));
    assert_eq!(*image.get_pixel(299, 199), Rgb([200, 200, 200]));
}

#[test]
fn test_text_drawn_with_embedded_font() -> anyhow::Result<()> {
    // 1. Annotator with a real font
    let annotator = Annotator::new(AnnotatorConfig::default(), font::embedded_font());
    assert!(annotator.has_font());
    let config = annotator.config().clone();

    let mut image = RgbImage::from_pixel(400, 300, Rgb([200, 200, 200]));
    let matang = detection("Matang", 0.92, 250, 150, 320, 220);
    annotator.render(&mut image, std::slice::from_ref(&matang), 0.4);

    // 2. Black caption pixels inside the label background
    let font = font::embedded_font().expect("embedded font parses");
    let scale = PxScale::from(config.font_size);
    let width = draw::measure_text(Some(&font), scale, &matang.caption());
    let rect = draw::label_rect(image.dimensions(), &matang.bbox, width, config.label_height)
        .expect("label fits on the canvas");
    let mut label_pixels = Vec::new();
    for y in rect.top()..=rect.bottom() {
        for x in rect.left()..=rect.right() {
            label_pixels.push(*image.get_pixel(x as u32, y as u32));
        }
    }
    assert!(label_pixels.iter().any(|p| p.0.iter().all(|&c| c < 60)));
    assert!(label_pixels.iter().any(|p| *p == Rgb([255, 0, 0])));

    // 3. Panel lines in white and in each category color
    let (ox, oy) = config.panel_origin;
    let (pw, ph) = config.panel_size;
    let mut panel_pixels = Vec::new();
    for y in oy as u32..oy as u32 + ph {
        for x in ox as u32..ox as u32 + pw {
            panel_pixels.push(*image.get_pixel(x, y));
        }
    }
    let has = |f: fn(&Rgb<u8>) -> bool| panel_pixels.iter().any(f);
    assert!(has(|p| p[0] > 200 && p[1] > 200 && p[2] > 200), "no white text");
    assert!(has(|p| p[0] > 200 && p[1] < 80 && p[2] < 80), "no red text");
    assert!(has(|p| p[0] < 80 && p[1] > 200 && p[2] < 80), "no green text");
    assert!(has(|p| p[0] > 200 && p[1] > 200 && p[2] < 80), "no yellow text");
    Ok(())
}

#[test]
fn test_render_box_at_coordinate_extremes() -> anyhow::Result<()> {
    // 1. The detector accepts the box since it has a positive extent
    let detector =
        SidecarDetector::from_json(r#"[{"label":"Matang","confidence":0.9,"box":[0,-2147483648,10,0]}]"#)?;
    let detections = detector.detect(&[], 0.4)?;
    assert_eq!(detections.len(), 1);

    // 2. Drawing it stays on the canvas, with and without a font
    for label_font in [None, font::embedded_font()] {
        let annotator = Annotator::new(AnnotatorConfig::default(), label_font);
        let mut image = RgbImage::from_pixel(50, 50, Rgb([200, 200, 200]));
        let stats = annotator.render(&mut image, &detections, 0.4);
        assert_eq!(stats.matang, 1);
    }
    Ok(())
}

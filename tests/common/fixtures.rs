use std::io::Cursor;

use image::{ImageBuffer, ImageFormat, Rgb};
use lacaktani::core::db::{HistoryDb, NewHistoryRecord};
use lacaktani::{BoundingBox, Detection};

/// Encodes a solid-colored PNG of the given size.
pub fn create_test_image(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |_, _| Rgb([120u8, 90u8, 60u8]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("Failed to encode test image");
    bytes
}

/// Creates a HistoryDb in a temporary directory.
/// Returns both the database and the temp directory (which must be kept alive).
pub async fn create_test_db() -> (HistoryDb, tempfile::TempDir) {
    let dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("history.db");
    let db = HistoryDb::new(&path)
        .await
        .expect("Failed to create test database");
    (db, dir)
}

/// Creates a NewHistoryRecord with test data
pub fn make_test_record(created_at: &str, matang: u32, top_label: &str, top_confidence: f64) -> NewHistoryRecord {
    NewHistoryRecord {
        created_at: created_at.to_string(),
        original_image: "b3JpZ2luYWw=".to_string(),
        result_image: "cmVzdWx0".to_string(),
        matang,
        mentah: 1,
        berbunga: 2,
        top_label: top_label.to_string(),
        top_confidence,
    }
}

pub fn detection(label: &str, confidence: f32, x1: i32, y1: i32, x2: i32, y2: i32) -> Detection {
    Detection::new(label, confidence, BoundingBox::new(x1, y1, x2, y2))
}

/// The two detections used throughout the scenario tests
pub fn sample_detections() -> Vec<Detection> {
    vec![
        detection("Matang", 0.92, 10, 10, 50, 50),
        detection("Unknown", 0.5, 60, 60, 90, 90),
    ]
}

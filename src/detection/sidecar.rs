use std::path::{Path, PathBuf};

use tracing::debug;

use crate::detection::Detector;
use crate::error::{Error, Result};
use crate::models::Detection;

/// Detector fed by an external model process.
///
/// The model runs elsewhere and writes its raw detections as a JSON array of
/// `{"label", "confidence", "box": [x1, y1, x2, y2]}`; this type only applies
/// the confidence threshold.
#[derive(Debug, Clone)]
pub struct SidecarDetector {
    source: Option<PathBuf>,
    detections: Vec<Detection>,
}

impl SidecarDetector {
    pub fn from_detections(detections: Vec<Detection>) -> Result<Self> {
        validate(&detections)?;
        Ok(Self {
            source: None,
            detections,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let detections: Vec<Detection> = serde_json::from_str(json)
            .map_err(|e| Error::DetectorFailed(format!("malformed detections: {}", e)))?;
        Self::from_detections(detections)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::DetectorUnavailable(format!("cannot read detections {:?}: {}", path, e))
        })?;
        let mut detector = Self::from_json(&json)?;
        detector.source = Some(path.to_path_buf());
        debug!(
            path = ?path,
            count = detector.detections.len(),
            "loaded sidecar detections"
        );
        Ok(detector)
    }
}

fn validate(detections: &[Detection]) -> Result<()> {
    for (i, d) in detections.iter().enumerate() {
        if !(0.0..=1.0).contains(&d.confidence) {
            return Err(Error::DetectorFailed(format!(
                "detection {} has confidence {} outside [0, 1]",
                i, d.confidence
            )));
        }
        if !d.bbox.is_valid() {
            return Err(Error::DetectorFailed(format!(
                "detection {} has an empty box {:?}",
                i, d.bbox
            )));
        }
    }
    Ok(())
}

impl Detector for SidecarDetector {
    fn detect(&self, _image: &[u8], confidence: f32) -> Result<Vec<Detection>> {
        Ok(self
            .detections
            .iter()
            .filter(|d| d.confidence >= confidence)
            .cloned()
            .collect())
    }

    fn name(&self) -> &str {
        self.source
            .as_deref()
            .and_then(|p| p.to_str())
            .unwrap_or("sidecar")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"label": "Matang", "confidence": 0.92, "box": [10, 10, 50, 50]},
        {"label": "Mentah", "confidence": 0.35, "box": [60, 60, 90, 90]}
    ]"#;

    #[test]
    fn test_threshold_filters_detections() {
        let detector = SidecarDetector::from_json(SAMPLE).unwrap();
        assert_eq!(detector.detect(b"", 0.4).unwrap().len(), 1);
        assert_eq!(detector.detect(b"", 0.35).unwrap().len(), 2);
        assert_eq!(detector.detect(b"", 0.95).unwrap().len(), 0);
    }

    #[test]
    fn test_rejects_inverted_box() {
        let json = r#"[{"label": "Matang", "confidence": 0.9, "box": [50, 10, 10, 50]}]"#;
        assert!(matches!(
            SidecarDetector::from_json(json),
            Err(Error::DetectorFailed(_))
        ));
    }

    #[test]
    fn test_rejects_confidence_out_of_range() {
        let json = r#"[{"label": "Matang", "confidence": 1.2, "box": [0, 0, 10, 10]}]"#;
        assert!(SidecarDetector::from_json(json).is_err());
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let err = SidecarDetector::from_file("/nonexistent/detections.json").unwrap_err();
        assert!(matches!(err, Error::DetectorUnavailable(_)));
    }
}

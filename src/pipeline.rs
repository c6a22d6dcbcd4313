use std::sync::Arc;

use base64::{Engine, prelude::BASE64_STANDARD};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::annotate::{Annotator, decode_image};
use crate::core::db::NewHistoryRecord;
use crate::detection::{Detector, DetectorHandle, detect_with};
use crate::error::Result;
use crate::models::{CategoryStats, Detection, widen_confidence};
use crate::settings::{Settings, SharedSettings};

/// Highest-confidence detection as reported to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopDetection {
    pub label: String,
    pub confidence: f32,
    /// Ripe cherries in the same image, i.e. ready to harvest
    pub matang_siap_panen: u32,
}

/// JSON body returned for one prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Base64 JPEG of the annotated image
    pub image_data: String,
    pub stats: CategoryStats,
    pub top_detection: Option<TopDetection>,
}

impl PredictionResponse {
    fn new(image_data: String, stats: CategoryStats, top: Option<&Detection>) -> Self {
        Self {
            image_data,
            stats,
            top_detection: top.map(|d| TopDetection {
                label: d.label.clone(),
                confidence: d.confidence,
                matang_siap_panen: stats.matang,
            }),
        }
    }

    /// History entry for this prediction, keeping the uploaded bytes alongside.
    pub fn to_history(&self, original: &[u8], created_at: impl Into<String>) -> NewHistoryRecord {
        let (top_label, top_confidence) = match &self.top_detection {
            Some(top) => (top.label.clone(), widen_confidence(top.confidence)),
            None => (String::new(), 0.0),
        };
        NewHistoryRecord {
            created_at: created_at.into(),
            original_image: BASE64_STANDARD.encode(original),
            result_image: self.image_data.clone(),
            matang: self.stats.matang,
            mentah: self.stats.mentah,
            berbunga: self.stats.berbunga,
            top_label,
            top_confidence,
        }
    }
}

/// Decode, detect, annotate.
///
/// Settings and the detector are injected rather than global; each call works
/// on a settings snapshot and holds the detector for its whole inference.
#[derive(Debug)]
pub struct PredictionPipeline {
    annotator: Arc<Annotator>,
    detector: DetectorHandle,
    settings: SharedSettings,
}

impl PredictionPipeline {
    pub fn new(annotator: Annotator, detector: DetectorHandle, settings: Settings) -> Self {
        Self {
            annotator: Arc::new(annotator),
            detector,
            settings: SharedSettings::new(settings),
        }
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    pub fn detector(&self) -> &DetectorHandle {
        &self.detector
    }

    /// Swap in a new model; waits for in-flight predictions to finish first.
    pub async fn change_model(&self, model_id: &str, detector: impl Detector + 'static) -> Option<String> {
        let previous = self.detector.swap(model_id, detector).await;
        self.settings.set_model(model_id).await;
        previous
    }

    pub async fn predict(&self, image: Vec<u8>) -> Result<PredictionResponse> {
        let settings = self.settings.snapshot().await;
        self.predict_with(image, &settings).await
    }

    pub async fn predict_with(&self, image: Vec<u8>, settings: &Settings) -> Result<PredictionResponse> {
        let guard = self.detector.acquire().await;
        let annotator = self.annotator.clone();
        let confidence = settings.confidence;

        let response = tokio::task::spawn_blocking(move || -> Result<PredictionResponse> {
            let decoded = decode_image(&image)?;
            let detections = detect_with(&guard, &image, confidence)?;
            drop(guard);
            let annotation = annotator.annotate(decoded, &detections, confidence)?;
            Ok(PredictionResponse::new(
                annotation.image_base64(),
                annotation.stats,
                annotation.top_detection.as_ref(),
            ))
        })
        .await??;

        info!(
            confidence,
            matang = response.stats.matang,
            mentah = response.stats.mentah,
            berbunga = response.stats.berbunga,
            top = response.top_detection.as_ref().map(|t| t.label.as_str()),
            "prediction complete"
        );
        Ok(response)
    }
}

pub mod sidecar;

use std::sync::Arc;

use tokio::sync::{OwnedRwLockReadGuard, RwLock};
use tracing::info;

use crate::error::{Error, Result};
use crate::models::Detection;

pub use sidecar::SidecarDetector;

/// Object detector backing the prediction path.
///
/// Implementations wrap a pretrained model; inference is opaque to this crate.
pub trait Detector: Send + Sync {
    /// Run inference over raw image bytes, keeping detections whose confidence
    /// is at least `confidence`.
    fn detect(&self, image: &[u8], confidence: f32) -> Result<Vec<Detection>>;

    /// Human-readable name for this detector (used in logs)
    fn name(&self) -> &str;
}

pub struct LoadedDetector {
    pub model_id: String,
    pub detector: Box<dyn Detector>,
}

/// Shared slot holding the active detector.
///
/// Predictions hold a read guard for their whole inference, and swapping takes
/// the write guard, so a swap waits for in-flight predictions instead of
/// replacing weights under them.
#[derive(Clone, Default)]
pub struct DetectorHandle {
    slot: Arc<RwLock<Option<LoadedDetector>>>,
}

impl std::fmt::Debug for DetectorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorHandle").finish_non_exhaustive()
    }
}

pub type DetectorGuard = OwnedRwLockReadGuard<Option<LoadedDetector>>;

impl DetectorHandle {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_detector(model_id: impl Into<String>, detector: impl Detector + 'static) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Some(LoadedDetector {
                model_id: model_id.into(),
                detector: Box::new(detector),
            }))),
        }
    }

    /// Replace the active detector, returning the previous model id.
    pub async fn swap(
        &self,
        model_id: impl Into<String>,
        detector: impl Detector + 'static,
    ) -> Option<String> {
        let model_id = model_id.into();
        let mut slot = self.slot.write().await;
        let previous = slot.replace(LoadedDetector {
            model_id: model_id.clone(),
            detector: Box::new(detector),
        });
        info!(model = %model_id, "detector swapped");
        previous.map(|p| p.model_id)
    }

    pub async fn unload(&self) -> Option<String> {
        let previous = self.slot.write().await.take();
        if let Some(p) = &previous {
            info!(model = %p.model_id, "detector unloaded");
        }
        previous.map(|p| p.model_id)
    }

    pub async fn active_model(&self) -> Option<String> {
        self.slot.read().await.as_ref().map(|d| d.model_id.clone())
    }

    /// Owned read guard, suitable for moving into a blocking task.
    pub async fn acquire(&self) -> DetectorGuard {
        self.slot.clone().read_owned().await
    }
}

/// Run the detector behind `guard`, or report that none is loaded.
pub fn detect_with(
    guard: &Option<LoadedDetector>,
    image: &[u8],
    confidence: f32,
) -> Result<Vec<Detection>> {
    let loaded = guard
        .as_ref()
        .ok_or_else(|| Error::DetectorUnavailable("no model is loaded".to_string()))?;
    loaded.detector.detect(image, confidence)
}

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::error::{Error, Result};

pub const DEFAULT_CONFIDENCE: f32 = 0.4;
pub const DEFAULT_MODEL: &str = "best.pt";

/// Runtime settings read by every prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Minimum confidence a detection needs to be reported
    pub confidence: f32,
    /// Identifier of the model the detector was loaded from
    pub model: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            confidence: DEFAULT_CONFIDENCE,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl Settings {
    pub fn with_confidence(mut self, confidence: f32) -> Result<Self> {
        validate_confidence(confidence)?;
        self.confidence = confidence;
        Ok(self)
    }
}

fn validate_confidence(confidence: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&confidence) {
        return Err(Error::InvalidSettings(format!(
            "confidence must be within [0, 1], got {}",
            confidence
        )));
    }
    Ok(())
}

/// Settings shared between callers. Writes are last-write-wins; readers take
/// a snapshot so one prediction never sees a half-applied update.
#[derive(Debug, Default)]
pub struct SharedSettings {
    inner: RwLock<Settings>,
}

impl SharedSettings {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: RwLock::new(settings),
        }
    }

    pub async fn snapshot(&self) -> Settings {
        self.inner.read().await.clone()
    }

    pub async fn set_confidence(&self, confidence: f32) -> Result<()> {
        validate_confidence(confidence)?;
        self.inner.write().await.confidence = confidence;
        info!(confidence, "confidence threshold updated");
        Ok(())
    }

    pub(crate) async fn set_model(&self, model: &str) {
        self.inner.write().await.model = model.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.confidence, 0.4);
        assert_eq!(settings.model, "best.pt");
    }

    #[test]
    fn test_settings_from_partial_json() {
        let settings: Settings = serde_json::from_str(r#"{"confidence": 0.65}"#).unwrap();
        assert_eq!(settings.confidence, 0.65);
        assert_eq!(settings.model, DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn test_set_confidence_rejects_out_of_range() {
        let shared = SharedSettings::default();
        assert!(matches!(
            shared.set_confidence(1.5).await,
            Err(Error::InvalidSettings(_))
        ));
        assert!(shared.set_confidence(-0.1).await.is_err());
        assert!(shared.set_confidence(f32::NAN).await.is_err());

        shared.set_confidence(0.25).await.unwrap();
        assert_eq!(shared.snapshot().await.confidence, 0.25);
    }
}

pub mod annotate;
pub mod core;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod settings;

pub use annotate::{Annotation, Annotator, AnnotatorConfig};
pub use detection::{Detector, DetectorHandle, SidecarDetector};
pub use error::{Error, Result, StorageError};
pub use models::{BoundingBox, Category, CategoryStats, Detection};
pub use pipeline::{PredictionPipeline, PredictionResponse, TopDetection};
pub use settings::{Settings, SharedSettings};

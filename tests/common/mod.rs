#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from lacaktani for tests
pub use lacaktani::core::db::{
    DEFAULT_LIST_LIMIT, HistoryDb, HistoryRecord, HistoryRepository, NewHistoryRecord,
};
pub use lacaktani::{
    Annotator, AnnotatorConfig, CategoryStats, Detection, Detector, DetectorHandle, Error,
    PredictionPipeline, Settings, SidecarDetector,
};

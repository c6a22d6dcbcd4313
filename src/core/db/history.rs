use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const DEFAULT_LIST_LIMIT: u32 = 100;

/// One saved prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct HistoryRecord {
    pub id: i64,
    pub created_at: String,
    pub original_image: String,
    /// Serialized as `result_b64`, the name history clients read
    #[serde(rename = "result_b64", alias = "result_image")]
    pub result_image: String,
    pub matang: u32,
    pub mentah: u32,
    pub berbunga: u32,
    /// Empty when the prediction had no detections
    pub top_label: String,
    pub top_confidence: f64,
}

/// A prediction to be saved; the store assigns the id
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewHistoryRecord {
    /// ISO-8601 timestamp supplied by the client
    pub created_at: String,
    #[serde(default)]
    pub original_image: String,
    #[serde(alias = "result_b64")]
    pub result_image: String,
    #[serde(default)]
    pub matang: u32,
    #[serde(default)]
    pub mentah: u32,
    #[serde(default)]
    pub berbunga: u32,
    #[serde(default)]
    pub top_label: String,
    #[serde(default)]
    pub top_confidence: f64,
}

impl NewHistoryRecord {
    pub fn with_id(self, id: i64) -> HistoryRecord {
        HistoryRecord {
            id,
            created_at: self.created_at,
            original_image: self.original_image,
            result_image: self.result_image,
            matang: self.matang,
            mentah: self.mentah,
            berbunga: self.berbunga,
            top_label: self.top_label,
            top_confidence: self.top_confidence,
        }
    }
}

/// Append-only prediction log with delete-by-id
pub trait HistoryRepository {
    fn save(&self, record: &NewHistoryRecord) -> impl Future<Output = Result<i64>>;
    /// Newest first, at most `limit` records
    fn list(&self, limit: u32) -> impl Future<Output = Result<Vec<HistoryRecord>>>;
    fn get(&self, id: i64) -> impl Future<Output = Result<Option<HistoryRecord>>>;
    /// Returns whether a record was removed; unknown ids are not an error.
    fn delete(&self, id: i64) -> impl Future<Output = Result<bool>>;
    /// All records as CSV, newest first
    fn export_csv(&self) -> impl Future<Output = Result<String>>;
}

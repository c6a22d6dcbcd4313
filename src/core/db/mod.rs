mod export;
mod history;
mod state;

use std::{path::Path, sync::Arc};

use state::HistoryState;
use tracing::{debug, info};

use crate::error::{Error, Result};

pub use export::{EXPORT_HEADER, NO_LABEL, export_date, export_row, write_csv};
pub use history::{DEFAULT_LIST_LIMIT, HistoryRecord, HistoryRepository, NewHistoryRecord};

const SELECT_COLUMNS: &str = "id, created_at, original_image, result_image, \
     matang, mentah, berbunga, top_label, top_confidence";

#[derive(Debug, Clone)]
pub struct HistoryDb {
    state: Arc<HistoryState>,
}

impl HistoryDb {
    pub async fn new<P: AsRef<Path>>(db_file: P) -> Result<Self> {
        Ok(Self {
            state: Arc::new(HistoryState::new(db_file).await?),
        })
    }

    pub fn db_file(&self) -> &Path {
        self.state.db_file()
    }

    /// Close all pooled connections. Further calls fail.
    pub async fn close(&self) {
        self.state.close().await
    }
}

fn validate(record: &NewHistoryRecord) -> Result<()> {
    if !(0.0..=1.0).contains(&record.top_confidence) {
        return Err(Error::InvalidRecord(format!(
            "top_confidence must be within [0, 1], got {}",
            record.top_confidence
        )));
    }
    Ok(())
}

impl HistoryRepository for HistoryDb {
    async fn save(&self, record: &NewHistoryRecord) -> Result<i64> {
        validate(record)?;
        let mut conn = self.state.conn().await?;
        let id = sqlx::query(
            r#"INSERT INTO history
            (created_at, original_image, result_image, matang, mentah, berbunga, top_label, top_confidence)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
        )
        .bind(&record.created_at)
        .bind(&record.original_image)
        .bind(&record.result_image)
        .bind(record.matang)
        .bind(record.mentah)
        .bind(record.berbunga)
        .bind(&record.top_label)
        .bind(record.top_confidence)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();
        info!(id, top_label = %record.top_label, "history record saved");
        Ok(id)
    }

    async fn list(&self, limit: u32) -> Result<Vec<HistoryRecord>> {
        let mut conn = self.state.conn().await?;
        let records = sqlx::query_as::<_, HistoryRecord>(&format!(
            "SELECT {SELECT_COLUMNS} FROM history ORDER BY id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&mut *conn)
        .await?;
        debug!(limit, count = records.len(), "listed history");
        Ok(records)
    }

    async fn get(&self, id: i64) -> Result<Option<HistoryRecord>> {
        let mut conn = self.state.conn().await?;
        Ok(sqlx::query_as::<_, HistoryRecord>(&format!(
            "SELECT {SELECT_COLUMNS} FROM history WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut conn = self.state.conn().await?;
        let removed = sqlx::query("DELETE FROM history WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?
            .rows_affected()
            > 0;
        info!(id, removed, "history record deleted");
        Ok(removed)
    }

    async fn export_csv(&self) -> Result<String> {
        let mut conn = self.state.conn().await?;
        let records = sqlx::query_as::<_, HistoryRecord>(&format!(
            "SELECT {SELECT_COLUMNS} FROM history ORDER BY id DESC"
        ))
        .fetch_all(&mut *conn)
        .await?;
        info!(count = records.len(), "exporting history");
        write_csv(&records)
    }
}

use sqlx::{
    Sqlite,
    pool::PoolConnection,
    sqlite::{
        SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
    },
};
use tracing::debug;

use std::path::{Path, PathBuf};

use crate::error::{Result, StorageError};

pub(super) struct HistoryState {
    db_file: PathBuf,
    pool: SqlitePool,
}

impl std::fmt::Debug for HistoryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryState")
            .field("db_file", &self.db_file)
            .finish()
    }
}

impl HistoryState {
    /// Open (creating if missing) the database and bring the schema up to date.
    pub(super) async fn new<P: AsRef<Path>>(db_file: P) -> Result<Self> {
        let db_file = db_file.as_ref().to_path_buf();

        if let Some(parent) = db_file.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(StorageError::from)?;
        }

        // FULL: a save is on disk before it returns
        let connect_opts = SqliteConnectOptions::new()
            .filename(&db_file)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_opts)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        debug!(db_file = ?db_file, "history database ready");

        Ok(Self { db_file, pool })
    }

    pub(super) async fn conn(&self) -> Result<PoolConnection<Sqlite>> {
        Ok(self.pool.acquire().await?)
    }

    pub(super) fn db_file(&self) -> &Path {
        &self.db_file
    }

    pub(super) async fn close(&self) {
        self.pool.close().await;
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The uploaded bytes could not be decoded as an image.
    #[error("invalid image: {0}")]
    InvalidImage(#[source] image::ImageError),

    /// No detector is loaded, or the loaded one is not ready.
    #[error("detector unavailable: {0}")]
    DetectorUnavailable(String),

    #[error("detector failed: {0}")]
    DetectorFailed(String),

    #[error("storage failure: {0}")]
    StorageFailure(#[from] StorageError),

    #[error("failed to encode annotated image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("invalid history record: {0}")]
    InvalidRecord(String),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("background task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("export error: {0}")]
    Export(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        Error::StorageFailure(e.into())
    }
}

impl From<sqlx::migrate::MigrateError> for Error {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        Error::StorageFailure(e.into())
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::StorageFailure(e.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

use std::time::Duration;
use thiserror::Error;

/// Run-level failures. Row-level problems never surface here; they are
/// reported on the candidates themselves.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Missing or malformed actor identity")]
    Unauthenticated,

    #[error("Actor {0} is not allowed to modify glosas")]
    Forbidden(i64),

    #[error("Glosa {0} not found")]
    DisputeNotFound(i64),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::XlsxError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type AppResult<T> = Result<T, AppError>;

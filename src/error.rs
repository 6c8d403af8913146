use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BacktestError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Train or test segment is empty for cutoff {cutoff} (train: {train_rows} rows, test: {test_rows} rows)")]
    EmptySegment {
        cutoff: DateTime<Utc>,
        train_rows: usize,
        test_rows: usize,
    },
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

impl BacktestError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        BacktestError::InvalidParameter(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, BacktestError>;

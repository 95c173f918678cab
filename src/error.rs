//! The error type shared by the persistence layer and both front ends.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] diesel::ConnectionError),

    #[error("query failed: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("malformed roster file: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn student_not_found(id: i32) -> Self {
        Self::NotFound {
            entity: "student",
            id,
        }
    }

    pub(crate) fn record_not_found(id: i32) -> Self {
        Self::NotFound {
            entity: "attendance record",
            id,
        }
    }

    /// Stable error code, independent of the message text.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            Self::Query(_) => "DB_ERROR",
            Self::Csv(_) => "CSV_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

use crate::mapping::Shape;

#[derive(Debug, Error)]
pub enum SqlRecordError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Driver error: {0}")]
    DriverError(String),

    #[error("destination must be {}, got {found}", .expected.describe())]
    ShapeInvalid { expected: Shape, found: Shape },

    #[error("No data found")]
    NoDataFound,

    #[error("Value conversion failed for column `{column}` into {target} (value {value:?}): {reason}")]
    ConversionFailed {
        column: String,
        target: &'static str,
        value: String,
        reason: String,
    },

    #[error("Transaction start failed: {0}")]
    TransactionStartFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),
}

/// Coarse classification of [`SqlRecordError`], independent of the driver in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ShapeInvalid,
    NoDataFound,
    ConversionFailed,
    TransactionStartFailed,
    DriverError,
    Config,
}

impl SqlRecordError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            SqlRecordError::ShapeInvalid { .. } => ErrorKind::ShapeInvalid,
            SqlRecordError::NoDataFound => ErrorKind::NoDataFound,
            SqlRecordError::ConversionFailed { .. } => ErrorKind::ConversionFailed,
            SqlRecordError::TransactionStartFailed(_) => ErrorKind::TransactionStartFailed,
            SqlRecordError::ConfigError(_) => ErrorKind::Config,
            #[cfg(feature = "sqlite")]
            SqlRecordError::SqliteError(_) => ErrorKind::DriverError,
            SqlRecordError::DriverError(_)
            | SqlRecordError::ConnectionError(_)
            | SqlRecordError::ExecutionError(_) => ErrorKind::DriverError,
        }
    }

    /// Wrap any driver-specific failure as an opaque passthrough error.
    pub fn driver(err: impl std::fmt::Display) -> Self {
        SqlRecordError::DriverError(err.to_string())
    }
}

//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::config::{DbOptions, DbOptionsBuilder, DriverKind};
pub use crate::driver::{Connection, ExecOutcome, Executor, Transaction};
pub use crate::error::{ErrorKind, SqlRecordError};
pub use crate::handle::DbHandle;
pub use crate::mapping::{Destination, FromRowValue, Record, RowMapper, Shape};
pub use crate::results::{ResultSet, Row};
pub use crate::types::RowValues;

#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteConnection;

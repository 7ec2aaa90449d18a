//! The boundary between the handle and a concrete SQL driver.
//!
//! A driver supplies a shared [`Connection`] that can run statements and open
//! [`Transaction`]s. Both implement [`Executor`], so the handle routes every
//! statement through whichever one is active without caring which it is.

use std::ops::ControlFlow;

use crate::error::SqlRecordError;
use crate::results::Row;
use crate::types::RowValues;

/// Callback fed one [`Row`] at a time, in the order the driver produces them.
///
/// Returning `ControlFlow::Break(())` stops the cursor; remaining rows are not read.
pub type RowVisitor<'a> = dyn FnMut(Row) -> Result<ControlFlow<()>, SqlRecordError> + 'a;

/// Result of a statement that does not return rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    /// Rows inserted, updated or deleted by the statement
    pub rows_affected: usize,
    /// Rowid of the most recent successful insert, if the driver reports one
    pub last_insert_id: Option<i64>,
}

/// Something statements can be run against: a base connection or an open transaction.
pub trait Executor {
    /// Run a statement that does not return rows.
    ///
    /// # Errors
    /// Returns the driver's error unchanged.
    fn execute(&self, query: &str, params: &[RowValues]) -> Result<ExecOutcome, SqlRecordError>;

    /// Run a semicolon separated script with no parameters.
    ///
    /// # Errors
    /// Returns the driver's error unchanged.
    fn execute_batch(&self, query: &str) -> Result<(), SqlRecordError>;

    /// Run a query and feed every produced row to `visit` until it breaks.
    ///
    /// # Errors
    /// Returns the driver's error, or the first error returned by `visit`.
    fn query_rows(
        &self,
        query: &str,
        params: &[RowValues],
        visit: &mut RowVisitor<'_>,
    ) -> Result<(), SqlRecordError>;
}

/// A shared, long-lived database connection.
///
/// Implementations must tolerate concurrent non-transactional use; the handle
/// never takes exclusive ownership of it.
pub trait Connection: Executor + Send + Sync {
    /// Open a new transaction.
    ///
    /// # Errors
    /// Returns the driver's error if the transaction cannot be started.
    fn begin(&self) -> Result<Box<dyn Transaction>, SqlRecordError>;
}

/// An open transaction, owned by exactly one handle until it is finished.
pub trait Transaction: Executor + Send {
    /// Commit and release the transaction.
    ///
    /// # Errors
    /// Returns the driver's error if the commit fails; the transaction is gone either way.
    fn commit(self: Box<Self>) -> Result<(), SqlRecordError>;

    /// Roll back and release the transaction.
    ///
    /// # Errors
    /// Returns the driver's error if the rollback fails; the transaction is gone either way.
    fn rollback(self: Box<Self>) -> Result<(), SqlRecordError>;
}

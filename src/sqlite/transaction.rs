use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::warn;

use tempfile::TempDir;

use super::connection::SqlitePooledConnection;
use super::query;
use crate::driver::{ExecOutcome, Executor, RowVisitor, Transaction};
use crate::error::SqlRecordError;
use crate::types::RowValues;

const ROLLBACK_BUSY_RETRIES: &[Duration] = &[
    Duration::from_millis(10),
    Duration::from_millis(25),
    Duration::from_millis(50),
];

pub(crate) fn rollback_with_busy_retries(
    conn: &rusqlite::Connection,
) -> Result<(), SqlRecordError> {
    for (idx, delay) in ROLLBACK_BUSY_RETRIES.iter().copied().enumerate() {
        match conn.execute_batch("ROLLBACK") {
            Ok(()) => return Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::DatabaseBusy
                    && idx + 1 < ROLLBACK_BUSY_RETRIES.len() =>
            {
                thread::sleep(delay);
            }
            Err(e) => return Err(SqlRecordError::SqliteError(e)),
        }
    }

    Err(SqlRecordError::ExecutionError(
        "rollback retries exhausted".into(),
    ))
}

/// Transaction handle that holds one pooled `SQLite` connection until completion.
///
/// The connection returns to the pool when the transaction finishes; a connection
/// left inside a transaction is rolled back on its next checkout.
pub struct SqliteTx {
    conn: Option<SqlitePooledConnection>,
    // keeps a `:memory:` scratch database alive while the transaction is open
    _scratch: Option<Arc<TempDir>>,
}

impl SqliteTx {
    pub(crate) fn new(conn: SqlitePooledConnection, scratch: Option<Arc<TempDir>>) -> Self {
        Self {
            conn: Some(conn),
            _scratch: scratch,
        }
    }

    fn conn(&self) -> Result<&SqlitePooledConnection, SqlRecordError> {
        self.conn.as_ref().ok_or_else(|| {
            SqlRecordError::ExecutionError("SQLite transaction already completed".into())
        })
    }

    fn take_conn(&mut self) -> Result<SqlitePooledConnection, SqlRecordError> {
        self.conn.take().ok_or_else(|| {
            SqlRecordError::ExecutionError("SQLite transaction already completed".into())
        })
    }
}

impl Executor for SqliteTx {
    fn execute(&self, query: &str, params: &[RowValues]) -> Result<ExecOutcome, SqlRecordError> {
        query::execute(self.conn()?, query, params)
    }

    fn execute_batch(&self, query: &str) -> Result<(), SqlRecordError> {
        self.conn()?.execute_batch(query)?;
        Ok(())
    }

    fn query_rows(
        &self,
        query: &str,
        params: &[RowValues],
        visit: &mut RowVisitor<'_>,
    ) -> Result<(), SqlRecordError> {
        query::query_rows(self.conn()?, query, params, visit)
    }
}

impl Transaction for SqliteTx {
    fn commit(mut self: Box<Self>) -> Result<(), SqlRecordError> {
        let conn = self.take_conn()?;
        conn.execute_batch("COMMIT").map_err(|e| {
            // A failed COMMIT can leave the transaction open on the pooled connection.
            let _ = rollback_with_busy_retries(&conn);
            SqlRecordError::SqliteError(e)
        })
    }

    fn rollback(mut self: Box<Self>) -> Result<(), SqlRecordError> {
        let conn = self.take_conn()?;
        rollback_with_busy_retries(&conn)
    }
}

impl Drop for SqliteTx {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            warn!("sqlite transaction dropped while open; rolling back");
            let _ = rollback_with_busy_retries(&conn);
        }
    }
}

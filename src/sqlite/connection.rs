use std::fmt;
use std::time::Duration;

use r2d2::ManageConnection;
use r2d2_sqlite::SqliteConnectionManager;
use tracing::{debug, warn};

use super::config::SqliteTarget;
use super::query;
use super::transaction::{SqliteTx, rollback_with_busy_retries};
use crate::config::DbOptions;
use crate::driver::{Connection, ExecOutcome, Executor, RowVisitor, Transaction};
use crate::error::SqlRecordError;
use crate::types::RowValues;

pub type SqlitePool = r2d2::Pool<SqliteConnectionManager>;
pub type SqlitePooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

const POOL_MAX_SIZE: u32 = 10;
const POOL_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(30);

/// `SQLite` implementation of [`Connection`].
///
/// Every non-transactional call checks a connection out of an r2d2 pool for
/// its own duration, so independent sessions run side by side. A transaction
/// keeps its pooled connection until it commits or rolls back.
pub struct SqliteConnection {
    pool: SqlitePool,
    target: SqliteTarget,
}

impl SqliteConnection {
    /// Open the pool described by `opts`.
    ///
    /// One connection is opened up front so a bad DSN fails here rather than
    /// on the first query.
    ///
    /// # Errors
    /// Returns `SqlRecordError::SqliteError` if the database cannot be opened or configured,
    /// or `SqlRecordError::ConnectionError` if a scratch database cannot be created.
    pub fn open(opts: &DbOptions) -> Result<Self, SqlRecordError> {
        let target = SqliteTarget::from_options(opts)?;
        let manager = target.manager();
        drop(manager.connect()?);

        debug!(path = %target.path, scratch = target.is_scratch(), "sqlite pool ready");
        let pool = r2d2::Pool::builder()
            .max_size(POOL_MAX_SIZE)
            .min_idle(Some(1))
            .connection_timeout(POOL_CHECKOUT_TIMEOUT)
            .build_unchecked(manager);
        Ok(Self { pool, target })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Take a connection from the pool, ending any transaction a previous holder left open.
    pub(crate) fn checkout(&self) -> Result<SqlitePooledConnection, SqlRecordError> {
        let conn = self
            .pool
            .get()
            .map_err(|e| SqlRecordError::ConnectionError(format!("sqlite pool checkout failed: {e}")))?;
        if !conn.is_autocommit() {
            warn!("pooled sqlite connection still inside a transaction; rolling back");
            rollback_with_busy_retries(&conn)?;
        }
        Ok(conn)
    }

    /// Run `func` against a pooled connection.
    ///
    /// # Errors
    /// Returns the checkout error, or whatever `func` returns.
    pub fn with_connection<F, R>(&self, func: F) -> Result<R, SqlRecordError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlRecordError>,
    {
        let mut conn = self.checkout()?;
        func(&mut *conn)
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.pool.state();
        f.debug_struct("SqliteConnection")
            .field("target", &self.target)
            .field("connections", &state.connections)
            .field("idle", &state.idle_connections)
            .finish()
    }
}

impl Executor for SqliteConnection {
    fn execute(&self, query: &str, params: &[RowValues]) -> Result<ExecOutcome, SqlRecordError> {
        query::execute(&*self.checkout()?, query, params)
    }

    fn execute_batch(&self, query: &str) -> Result<(), SqlRecordError> {
        self.checkout()?.execute_batch(query)?;
        Ok(())
    }

    fn query_rows(
        &self,
        query: &str,
        params: &[RowValues],
        visit: &mut RowVisitor<'_>,
    ) -> Result<(), SqlRecordError> {
        query::query_rows(&*self.checkout()?, query, params, visit)
    }
}

impl Connection for SqliteConnection {
    fn begin(&self) -> Result<Box<dyn Transaction>, SqlRecordError> {
        let conn = self.checkout()?;
        conn.execute_batch("BEGIN")?;
        Ok(Box::new(SqliteTx::new(conn, self.target.scratch.clone())))
    }
}

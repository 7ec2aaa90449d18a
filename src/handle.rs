use std::any::Any;
use std::fmt;
use std::ops::ControlFlow;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::{DEFAULT_TAG, DbOptions, DriverKind};
use crate::driver::{Connection, ExecOutcome, RowVisitor, Transaction};
use crate::error::{ErrorKind, SqlRecordError};
use crate::mapping::{Destination, FromRowValue, Record, RowMapper, Shape, apply};
use crate::results::ResultSet;
use crate::types::RowValues;

/// A database connection plus, optionally, the transaction currently open on it.
///
/// Every statement goes to the open transaction if there is one, otherwise to the
/// shared connection. The connection is never owned by the handle:
/// [`DbHandle::session`] gives out further handles over the same connection.
///
/// A handle with an open transaction belongs to one unit of work; the `&mut self`
/// receivers of [`begin_transaction`](Self::begin_transaction),
/// [`commit`](Self::commit) and [`rollback`](Self::rollback) keep it that way.
///
/// ```rust,no_run
/// use sql_record::prelude::*;
///
/// sql_record::record! {
///     #[derive(Debug, Default)]
///     pub struct User {
///         pub id: i64 => r#"db:"id""#,
///         pub name: String => r#"db:"name""#,
///     }
/// }
///
/// # fn main() -> Result<(), SqlRecordError> {
/// let mut db = DbHandle::init("sqlite", "db", "app.db")?;
/// db.begin_transaction()?;
/// let outcome = db.execute("UPDATE users SET name = ?1 WHERE id = ?2", &["Ann".into(), RowValues::Int(7)]);
/// db.submit(&outcome)?;
///
/// let mut users: Vec<User> = Vec::new();
/// db.fetch_many(&mut users, "SELECT id, name FROM users ORDER BY id", &[])?;
/// # Ok(())
/// # }
/// ```
pub struct DbHandle {
    conn: Arc<dyn Connection>,
    tx: Option<Box<dyn Transaction>>,
    mapper: RowMapper,
}

impl DbHandle {
    /// Open a handle from options.
    ///
    /// # Errors
    /// Returns `SqlRecordError::ConfigError` for invalid options and the driver's
    /// error if the connection cannot be opened.
    pub fn connect(opts: &DbOptions) -> Result<Self, SqlRecordError> {
        opts.validate()?;
        let conn = open_connection(opts).inspect_err(|e| {
            error!(driver = ?opts.driver, error = %e, "error while opening database");
        })?;
        info!(driver = ?opts.driver, tag = %opts.tag, "database handle initialized");
        Ok(Self::from_connection(conn, opts.tag.as_str()))
    }

    /// Open a handle from a driver name, the tag key record fields are annotated
    /// with, and a data source name.
    ///
    /// # Errors
    /// Returns `SqlRecordError::ConfigError` for an unknown driver and the driver's
    /// error if the connection cannot be opened.
    pub fn init(driver: &str, tag: &str, dsn: &str) -> Result<Self, SqlRecordError> {
        let driver = DriverKind::from_name(driver)?;
        Self::connect(&DbOptions::new(driver, tag, dsn))
    }

    /// [`DbHandle::init`] with the `db` tag key.
    ///
    /// # Errors
    /// As [`DbHandle::init`].
    pub fn init_with_default_tag(driver: &str, dsn: &str) -> Result<Self, SqlRecordError> {
        Self::init(driver, DEFAULT_TAG, dsn)
    }

    /// Wrap an already open connection, e.g. from a custom driver.
    #[must_use]
    pub fn from_connection(conn: Arc<dyn Connection>, tag: impl Into<Arc<str>>) -> Self {
        Self {
            conn,
            tx: None,
            mapper: RowMapper::new(tag),
        }
    }

    /// A new handle over the same base connection, with no transaction.
    #[must_use]
    pub fn session(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            tx: None,
            mapper: self.mapper.clone(),
        }
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        self.mapper.tag()
    }

    #[must_use]
    pub fn mapper(&self) -> &RowMapper {
        &self.mapper
    }

    #[must_use]
    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.conn
    }

    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    /// Run a statement that returns no rows.
    ///
    /// # Errors
    /// Returns the driver's error unchanged.
    pub fn execute(&self, query: &str, params: &[RowValues]) -> Result<ExecOutcome, SqlRecordError> {
        let result = match &self.tx {
            Some(tx) => tx.execute(query, params),
            None => self.conn.execute(query, params),
        };
        result.inspect_err(|e| log_driver_failure(query, e))
    }

    /// Run a semicolon separated script with no parameters.
    ///
    /// # Errors
    /// Returns the driver's error unchanged.
    pub fn execute_batch(&self, query: &str) -> Result<(), SqlRecordError> {
        let result = match &self.tx {
            Some(tx) => tx.execute_batch(query),
            None => self.conn.execute_batch(query),
        };
        result.inspect_err(|e| log_driver_failure(query, e))
    }

    fn query_rows(
        &self,
        query: &str,
        params: &[RowValues],
        visit: &mut RowVisitor<'_>,
    ) -> Result<(), SqlRecordError> {
        let result = match &self.tx {
            Some(tx) => tx.query_rows(query, params, visit),
            None => self.conn.query_rows(query, params, visit),
        };
        result.inspect_err(|e| log_driver_failure(query, e))
    }

    /// Map the first row the query produces into `dest`.
    ///
    /// Only the first row is read. Columns missing from it, and NULL values, leave
    /// the corresponding fields as they were.
    ///
    /// # Errors
    /// - `SqlRecordError::ShapeInvalid` if `dest` is not a single record
    /// - `SqlRecordError::NoDataFound` if the query produced no rows
    /// - `SqlRecordError::ConversionFailed` if a value cannot be coerced
    /// - the driver's error if the query fails
    pub fn fetch_one<D: Destination>(
        &self,
        dest: &mut D,
        query: &str,
        params: &[RowValues],
    ) -> Result<(), SqlRecordError> {
        let found = dest.shape();
        let record = dest.as_record_mut().ok_or(SqlRecordError::ShapeInvalid {
            expected: Shape::Record,
            found,
        })?;
        let descriptor = self.mapper.descriptor::<D::Record>();

        let mut seen = false;
        self.query_rows(query, params, &mut |row| {
            seen = true;
            apply(&descriptor, &row, &mut *record)?;
            Ok(ControlFlow::Break(()))
        })?;

        if seen {
            Ok(())
        } else {
            Err(SqlRecordError::NoDataFound)
        }
    }

    /// Map every row the query produces and append the records to `dest`, in row order.
    ///
    /// Records are appended only once every row has converted; on error `dest`
    /// is left as it was. Zero rows is not an error.
    ///
    /// # Errors
    /// - `SqlRecordError::ShapeInvalid` if `dest` is not a sequence of records
    /// - `SqlRecordError::ConversionFailed` if a value in any row cannot be coerced
    /// - the driver's error if the query fails
    pub fn fetch_many<D: Destination>(
        &self,
        dest: &mut D,
        query: &str,
        params: &[RowValues],
    ) -> Result<(), SqlRecordError> {
        let found = dest.shape();
        let records = dest.as_sequence_mut().ok_or(SqlRecordError::ShapeInvalid {
            expected: Shape::Sequence,
            found,
        })?;
        let staged = self.collect::<D::Record>(query, params)?;
        records.extend(staged);
        Ok(())
    }

    /// Fetch the first row as a new `T`.
    ///
    /// # Errors
    /// As [`DbHandle::fetch_one`], without the shape check.
    pub fn get<T: Record>(&self, query: &str, params: &[RowValues]) -> Result<T, SqlRecordError> {
        let descriptor = self.mapper.descriptor::<T>();
        let mut record = None;
        self.query_rows(query, params, &mut |row| {
            let mut first = T::default();
            apply(&descriptor, &row, &mut first)?;
            record = Some(first);
            Ok(ControlFlow::Break(()))
        })?;
        record.ok_or(SqlRecordError::NoDataFound)
    }

    /// Fetch every row as a new `Vec<T>`.
    ///
    /// # Errors
    /// As [`DbHandle::fetch_many`], without the shape check.
    pub fn select<T: Record>(&self, query: &str, params: &[RowValues]) -> Result<Vec<T>, SqlRecordError> {
        self.collect(query, params)
    }

    fn collect<T: Record>(&self, query: &str, params: &[RowValues]) -> Result<Vec<T>, SqlRecordError> {
        let descriptor = self.mapper.descriptor::<T>();
        let mut records = Vec::new();
        self.query_rows(query, params, &mut |row| {
            let mut record = T::default();
            apply(&descriptor, &row, &mut record)?;
            records.push(record);
            Ok(ControlFlow::Continue(()))
        })?;
        Ok(records)
    }

    /// Read the first column of the first row as a scalar, e.g. a `COUNT(*)`.
    ///
    /// # Errors
    /// - `SqlRecordError::NoDataFound` if the query produced no rows or no columns
    /// - `SqlRecordError::ConversionFailed` if the value cannot be represented as `V`
    /// - the driver's error if the query fails
    pub fn fetch_value<V: FromRowValue>(&self, query: &str, params: &[RowValues]) -> Result<V, SqlRecordError> {
        let mut value = None;
        self.query_rows(query, params, &mut |row| {
            if let (Some(column), Some(raw)) = (row.column_names.first(), row.get_by_index(0)) {
                value = Some(V::from_row_value(column, raw)?);
            }
            Ok(ControlFlow::Break(()))
        })?;
        value.ok_or(SqlRecordError::NoDataFound)
    }

    /// Run a query and return its rows unmapped.
    ///
    /// # Errors
    /// Returns the driver's error unchanged.
    pub fn fetch_rows(&self, query: &str, params: &[RowValues]) -> Result<ResultSet, SqlRecordError> {
        let mut result_set = ResultSet::default();
        self.query_rows(query, params, &mut |row| {
            result_set.add_row(row);
            Ok(ControlFlow::Continue(()))
        })?;
        Ok(result_set)
    }

    /// Start a transaction. Does nothing if one is already open on this handle.
    ///
    /// # Errors
    /// Returns `SqlRecordError::TransactionStartFailed` for any failure to begin,
    /// including a panic inside the driver; no transaction is open afterwards.
    pub fn begin_transaction(&mut self) -> Result<(), SqlRecordError> {
        if self.tx.is_some() {
            return Ok(());
        }

        let conn = Arc::clone(&self.conn);
        match panic::catch_unwind(AssertUnwindSafe(|| conn.begin())) {
            Ok(Ok(tx)) => {
                debug!("transaction started");
                self.tx = Some(tx);
                Ok(())
            }
            Ok(Err(e)) => {
                error!(error = %e, "transaction start failed");
                Err(SqlRecordError::TransactionStartFailed(e.to_string()))
            }
            Err(payload) => {
                let message = panic_message(&*payload);
                error!(panic = %message, "recovered from panic while starting transaction");
                Err(SqlRecordError::TransactionStartFailed(format!(
                    "recovered from panic: {message}"
                )))
            }
        }
    }

    /// Commit the open transaction, if any.
    ///
    /// The handle has no open transaction afterwards, whether or not the commit succeeded.
    ///
    /// # Errors
    /// Returns the driver's error if the commit fails.
    pub fn commit(&mut self) -> Result<(), SqlRecordError> {
        let Some(tx) = self.tx.take() else {
            return Ok(());
        };
        tx.commit()
            .inspect(|_| debug!("transaction committed"))
            .inspect_err(|e| error!(error = %e, "transaction commit failed"))
    }

    /// Roll back the open transaction, if any.
    ///
    /// The handle has no open transaction afterwards, whether or not the rollback succeeded.
    ///
    /// # Errors
    /// Returns the driver's error if the rollback fails.
    pub fn rollback(&mut self) -> Result<(), SqlRecordError> {
        let Some(tx) = self.tx.take() else {
            return Ok(());
        };
        tx.rollback()
            .inspect(|_| debug!("transaction rolled back"))
            .inspect_err(|e| error!(error = %e, "transaction rollback failed"))
    }

    /// Finish the unit of work: roll back if `outcome` is an error, commit otherwise.
    ///
    /// # Errors
    /// Returns the result of the commit or rollback, not `outcome`'s error.
    pub fn submit<T, E>(&mut self, outcome: &Result<T, E>) -> Result<(), SqlRecordError> {
        if outcome.is_err() {
            self.rollback()
        } else {
            self.commit()
        }
    }

    /// Run `work` inside a transaction and submit it with the result.
    ///
    /// If a transaction is already open on this handle, `work` joins it and it is
    /// submitted when `work` returns.
    ///
    /// # Errors
    /// Returns `work`'s error (after rolling back), or the begin/commit error.
    pub fn transaction<T, F>(&mut self, work: F) -> Result<T, SqlRecordError>
    where
        F: FnOnce(&mut DbHandle) -> Result<T, SqlRecordError>,
    {
        self.begin_transaction()?;
        let outcome = work(self);
        match outcome {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = self.rollback() {
                    warn!(error = %rollback_err, "rollback after failed unit of work also failed");
                }
                Err(e)
            }
        }
    }
}

impl fmt::Debug for DbHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbHandle")
            .field("tag", &self.mapper.tag())
            .field("in_transaction", &self.tx.is_some())
            .finish_non_exhaustive()
    }
}

fn open_connection(opts: &DbOptions) -> Result<Arc<dyn Connection>, SqlRecordError> {
    match opts.driver {
        #[cfg(feature = "sqlite")]
        DriverKind::Sqlite => Ok(Arc::new(crate::sqlite::SqliteConnection::open(opts)?)),
        #[cfg(not(feature = "sqlite"))]
        DriverKind::Sqlite => Err(SqlRecordError::ConfigError(
            "sqlite support is not compiled in (enable the `sqlite` feature)".into(),
        )),
    }
}

fn log_driver_failure(query: &str, err: &SqlRecordError) {
    if err.kind() == ErrorKind::DriverError {
        error!(query, error = %err, "query failed");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

use std::sync::Arc;
use std::time::Duration;

use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use tempfile::TempDir;

use crate::config::DbOptions;
use crate::error::SqlRecordError;

const MEMORY_DSN: &str = ":memory:";
const SCRATCH_FILE: &str = "scratch.db";

/// Where pooled connections for one handle are opened, and how they are set up.
#[derive(Debug, Clone)]
pub struct SqliteTarget {
    /// Path or `file:` URI passed to `sqlite3_open_v2`
    pub path: String,
    pub wal: bool,
    pub busy_timeout: Duration,
    /// Private directory backing a `:memory:` DSN; removed once the last holder drops it.
    pub scratch: Option<Arc<TempDir>>,
}

impl SqliteTarget {
    /// Resolve the DSN from `opts`.
    ///
    /// `:memory:` becomes a throwaway database file in a private temporary
    /// directory, opened in WAL mode. Every pooled connection sees the same data,
    /// and readers on other sessions see the last committed snapshot while a
    /// transaction is open.
    ///
    /// # Errors
    /// Returns `SqlRecordError::ConnectionError` if the scratch directory cannot be created.
    pub fn from_options(opts: &DbOptions) -> Result<Self, SqlRecordError> {
        let dsn = opts.dsn.trim();
        let busy_timeout = Duration::from_millis(opts.busy_timeout_ms);

        if dsn == MEMORY_DSN {
            let dir = tempfile::Builder::new()
                .prefix("sql_record_")
                .tempdir()
                .map_err(|e| {
                    SqlRecordError::ConnectionError(format!("cannot create scratch database: {e}"))
                })?;
            let path = dir.path().join(SCRATCH_FILE).to_string_lossy().into_owned();
            return Ok(Self {
                path,
                wal: true,
                busy_timeout,
                scratch: Some(Arc::new(dir)),
            });
        }

        Ok(Self {
            path: dsn.to_string(),
            // journal_mode cannot leave `memory` for a `mode=memory` URI
            wal: opts.wal && !dsn.contains("mode=memory"),
            busy_timeout,
            scratch: None,
        })
    }

    #[must_use]
    pub fn is_scratch(&self) -> bool {
        self.scratch.is_some()
    }

    /// Connection manager for the pool; every new connection gets the busy
    /// timeout and, when enabled, WAL.
    #[must_use]
    pub fn manager(&self) -> SqliteConnectionManager {
        let busy_timeout = self.busy_timeout;
        let wal = self.wal;
        SqliteConnectionManager::file(&self.path)
            .with_flags(
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .with_init(move |conn| {
                conn.busy_timeout(busy_timeout)?;
                if wal {
                    apply_wal_pragmas(conn)?;
                }
                Ok(())
            })
    }
}

/// Apply WAL pragmas to a connection.
///
/// # Errors
/// Returns the rusqlite error if the PRAGMA statement cannot be executed.
pub fn apply_wal_pragmas(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    // journal_mode reports the resulting mode as a row.
    let _mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    Ok(())
}

use clap::ValueEnum;
use serde::Deserialize;

use crate::error::SqlRecordError;

/// Tag key used when none is configured: fields are annotated `db:"column"`.
pub const DEFAULT_TAG: &str = "db";

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// The drivers a handle can be opened with by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// `SQLite` through rusqlite
    #[value(alias = "sqlite3")]
    Sqlite,
}

impl DriverKind {
    /// Resolve a driver from its name, ignoring case.
    ///
    /// # Errors
    /// Returns `SqlRecordError::ConfigError` for unknown driver names.
    pub fn from_name(name: &str) -> Result<Self, SqlRecordError> {
        <DriverKind as ValueEnum>::from_str(name.trim(), true)
            .map_err(|_| SqlRecordError::ConfigError(format!("unknown driver `{name}`")))
    }
}

/// Options for opening a [`DbHandle`](crate::DbHandle).
#[derive(Debug, Clone, Deserialize)]
pub struct DbOptions {
    pub driver: DriverKind,
    /// Annotation key the mapper reads column names from
    #[serde(default = "default_tag")]
    pub tag: String,
    /// Data source name; for `SQLite` a path, a `file:` URI or `:memory:`
    pub dsn: String,
    /// Switch file databases to write-ahead logging
    #[serde(default = "default_wal")]
    pub wal: bool,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_tag() -> String {
    DEFAULT_TAG.to_string()
}

fn default_wal() -> bool {
    true
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

impl DbOptions {
    #[must_use]
    pub fn new(driver: DriverKind, tag: impl Into<String>, dsn: impl Into<String>) -> Self {
        Self {
            driver,
            tag: tag.into(),
            dsn: dsn.into(),
            wal: default_wal(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }

    /// Parse options from a JSON document such as
    /// `{"driver": "sqlite", "tag": "db", "dsn": ":memory:"}`.
    ///
    /// # Errors
    /// Returns `SqlRecordError::ConfigError` if the document is malformed or fails validation.
    pub fn from_json(json: &str) -> Result<Self, SqlRecordError> {
        let opts: DbOptions = serde_json::from_str(json)
            .map_err(|e| SqlRecordError::ConfigError(format!("invalid options: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Reject options that could never produce a working handle.
    ///
    /// # Errors
    /// Returns `SqlRecordError::ConfigError` naming the offending field.
    pub fn validate(&self) -> Result<(), SqlRecordError> {
        if self.tag.trim().is_empty() {
            return Err(SqlRecordError::ConfigError("tag key must not be empty".into()));
        }
        if self.dsn.trim().is_empty() {
            return Err(SqlRecordError::ConfigError("dsn must not be empty".into()));
        }
        Ok(())
    }

    #[must_use]
    pub fn builder(driver: DriverKind, dsn: impl Into<String>) -> DbOptionsBuilder {
        DbOptionsBuilder::new(driver, dsn)
    }
}

/// Fluent builder for [`DbOptions`].
#[derive(Debug, Clone)]
pub struct DbOptionsBuilder {
    opts: DbOptions,
}

impl DbOptionsBuilder {
    #[must_use]
    pub fn new(driver: DriverKind, dsn: impl Into<String>) -> Self {
        Self {
            opts: DbOptions::new(driver, DEFAULT_TAG, dsn),
        }
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.opts.tag = tag.into();
        self
    }

    #[must_use]
    pub fn wal(mut self, wal: bool) -> Self {
        self.opts.wal = wal;
        self
    }

    #[must_use]
    pub fn busy_timeout_ms(mut self, millis: u64) -> Self {
        self.opts.busy_timeout_ms = millis;
        self
    }

    #[must_use]
    pub fn finish(self) -> DbOptions {
        self.opts
    }
}

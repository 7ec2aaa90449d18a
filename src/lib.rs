//! Thin SQL access layer that maps result rows onto caller-defined record types.
//!
//! A [`DbHandle`] owns an optional transaction over a shared connection and routes
//! every statement through whichever is active. Fetched rows are handed to the
//! [`mapping`] engine, which finds each record field's column through its tag
//! annotation and coerces the raw value into the field's type.
//!
//! ```rust
//! use sql_record::prelude::*;
//!
//! sql_record::record! {
//!     #[derive(Debug, Default, PartialEq)]
//!     pub struct Item {
//!         pub id: i64 => r#"db:"id""#,
//!         pub label: String => r#"db:"label""#,
//!     }
//! }
//!
//! # fn main() -> Result<(), SqlRecordError> {
//! let db = DbHandle::init("sqlite", "db", ":memory:")?;
//! db.execute_batch("CREATE TABLE items (id INTEGER PRIMARY KEY, label TEXT);")?;
//! db.execute("INSERT INTO items (id, label) VALUES (?1, ?2)", &[RowValues::Int(1), "one".into()])?;
//!
//! let mut item = Item::default();
//! db.fetch_one(&mut item, "SELECT id, label FROM items WHERE id = ?1", &[RowValues::Int(1)])?;
//! assert_eq!(item, Item { id: 1, label: "one".into() });
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod handle;
pub mod helpers;
pub mod mapping;
pub mod prelude;
pub mod results;
pub mod types;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use config::{DbOptions, DbOptionsBuilder, DriverKind};
pub use error::{ErrorKind, SqlRecordError};
pub use handle::DbHandle;
pub use results::{ResultSet, Row};
pub use types::RowValues;

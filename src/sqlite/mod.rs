// SQLite driver - the built-in `Connection` implementation, over rusqlite
//
// This module is split into several sub-modules for better organization:
// - config: DSN resolution, scratch databases and the pool's per-connection setup
// - params: Parameter conversion between middleware and SQLite types
// - query: Row extraction, cursor iteration and result building
// - connection: the r2d2 pool every statement and transaction checks out from
// - transaction: a transaction pinned to one checked-out connection

pub mod config;
pub mod connection;
pub mod params;
pub mod query;
pub mod transaction;

pub use connection::{SqliteConnection, SqlitePool, SqlitePooledConnection};
pub use params::Params;
pub use query::{build_result_set, sqlite_extract_value};
pub use transaction::SqliteTx;

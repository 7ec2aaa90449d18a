use std::ops::ControlFlow;
use std::sync::Arc;

use rusqlite::Statement;
use rusqlite::types::Value;

use super::params::Params;
use crate::driver::{ExecOutcome, RowVisitor};
use crate::error::SqlRecordError;
use crate::results::{ResultSet, Row, index_columns};
use crate::types::RowValues;

/// Extract a `RowValues` from a `SQLite` row.
///
/// # Errors
///
/// Returns `SqlRecordError` if the value cannot be read.
pub fn sqlite_extract_value(row: &rusqlite::Row, idx: usize) -> Result<RowValues, SqlRecordError> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Null => RowValues::Null,
        Value::Integer(i) => RowValues::Int(i),
        Value::Real(f) => RowValues::Float(f),
        Value::Text(s) => RowValues::Text(s),
        Value::Blob(b) => RowValues::Blob(b),
    })
}

fn column_names(stmt: &Statement<'_>) -> Arc<Vec<String>> {
    Arc::new(
        stmt.column_names()
            .iter()
            .map(std::string::ToString::to_string)
            .collect(),
    )
}

/// Run `stmt` and hand each row to `visit` until it breaks or the rows run out.
///
/// # Errors
/// Returns the first rusqlite error or the first error returned by `visit`.
pub fn stream_rows(
    stmt: &mut Statement<'_>,
    params: &Params,
    visit: &mut RowVisitor<'_>,
) -> Result<(), SqlRecordError> {
    let column_names = column_names(stmt);
    let index = Arc::new(index_columns(&column_names));
    let col_count = column_names.len();

    let mut rows = stmt.query(params.as_params())?;
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            values.push(sqlite_extract_value(row, i)?);
        }
        let row = Row::with_index(Arc::clone(&column_names), Arc::clone(&index), values);
        if let ControlFlow::Break(()) = visit(row)? {
            break;
        }
    }
    Ok(())
}

/// Build a result set from a `SQLite` query
///
/// # Errors
/// Returns `SqlRecordError` if query execution or result processing fails.
pub fn build_result_set(stmt: &mut Statement<'_>, params: &Params) -> Result<ResultSet, SqlRecordError> {
    let mut result_set = ResultSet::with_capacity(10);
    result_set.set_column_names(column_names(stmt));
    stream_rows(stmt, params, &mut |row| {
        result_set.add_row(row);
        Ok(ControlFlow::Continue(()))
    })?;
    Ok(result_set)
}

pub(crate) fn query_rows(
    conn: &rusqlite::Connection,
    query: &str,
    params: &[RowValues],
    visit: &mut RowVisitor<'_>,
) -> Result<(), SqlRecordError> {
    let params = Params::convert(params);
    let mut stmt = conn.prepare(query)?;
    stream_rows(&mut stmt, &params, visit)
}

pub(crate) fn execute(
    conn: &rusqlite::Connection,
    query: &str,
    params: &[RowValues],
) -> Result<ExecOutcome, SqlRecordError> {
    let params = Params::convert(params);
    let mut stmt = conn.prepare(query)?;
    let rows_affected = stmt.execute(params.as_params())?;
    Ok(ExecOutcome {
        rows_affected,
        last_insert_id: Some(conn.last_insert_rowid()),
    })
}

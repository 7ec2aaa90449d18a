//! Helper utilities for testing and development.

use crate::results::Row;
use crate::types::RowValues;
use std::sync::Arc;

/// Create a row with the given column names and values.
///
/// Handy for exercising a [`RowMapper`](crate::mapping::RowMapper) without a database.
#[must_use]
pub fn create_test_row(column_names: &[&str], values: Vec<RowValues>) -> Row {
    Row::new(
        Arc::new(column_names.iter().map(|c| (*c).to_string()).collect()),
        values,
    )
}

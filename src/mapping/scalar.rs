use chrono::{DateTime, Utc};

use super::coerce::{parse_bool, parse_integer, parse_timestamp};
use crate::error::SqlRecordError;
use crate::types::RowValues;

/// Scalar types a single column can be read into, with the same coercion
/// rules record fields use.
pub trait FromRowValue: Sized {
    /// Convert `value`, read from `column`.
    ///
    /// # Errors
    /// Returns `SqlRecordError::ConversionFailed` if the value cannot be represented.
    fn from_row_value(column: &str, value: &RowValues) -> Result<Self, SqlRecordError>;
}

fn conversion_failed(column: &str, target: &'static str, value: &RowValues, reason: impl ToString) -> SqlRecordError {
    SqlRecordError::ConversionFailed {
        column: column.to_string(),
        target,
        value: value.to_text().into_owned(),
        reason: reason.to_string(),
    }
}

fn reject_null(column: &str, target: &'static str, value: &RowValues) -> Result<(), SqlRecordError> {
    if value.is_null() {
        Err(conversion_failed(column, target, value, "value is NULL"))
    } else {
        Ok(())
    }
}

impl FromRowValue for i64 {
    fn from_row_value(column: &str, value: &RowValues) -> Result<Self, SqlRecordError> {
        reject_null(column, "i64", value)?;
        parse_integer(&value.to_text()).map_err(|e| conversion_failed(column, "i64", value, e))
    }
}

impl FromRowValue for f64 {
    fn from_row_value(column: &str, value: &RowValues) -> Result<Self, SqlRecordError> {
        reject_null(column, "f64", value)?;
        match value {
            RowValues::Float(f) => Ok(*f),
            #[allow(clippy::cast_precision_loss)]
            RowValues::Int(i) => Ok(*i as f64),
            other => other
                .to_text()
                .parse::<f64>()
                .map_err(|e| conversion_failed(column, "f64", value, e)),
        }
    }
}

impl FromRowValue for String {
    fn from_row_value(column: &str, value: &RowValues) -> Result<Self, SqlRecordError> {
        reject_null(column, "String", value)?;
        Ok(value.to_text().into_owned())
    }
}

impl FromRowValue for bool {
    fn from_row_value(column: &str, value: &RowValues) -> Result<Self, SqlRecordError> {
        reject_null(column, "bool", value)?;
        Ok(parse_bool(&value.to_text()))
    }
}

impl FromRowValue for DateTime<Utc> {
    fn from_row_value(column: &str, value: &RowValues) -> Result<Self, SqlRecordError> {
        reject_null(column, "DateTime<Utc>", value)?;
        parse_timestamp(&value.to_text())
            .map_err(|e| conversion_failed(column, "DateTime<Utc>", value, e))
    }
}

impl<T: FromRowValue> FromRowValue for Option<T> {
    fn from_row_value(column: &str, value: &RowValues) -> Result<Self, SqlRecordError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_row_value(column, value).map(Some)
        }
    }
}

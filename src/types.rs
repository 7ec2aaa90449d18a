use std::borrow::Cow;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value as JsonValue;

/// Layout used when a timestamp is rendered as text: `2023-05-01 12:00:00 +0000 UTC`.
pub const TIMESTAMP_TEXT_LAYOUT: &str = "%Y-%m-%d %H:%M:%S%.f %z UTC";

/// Values that can be stored in a database row or used as query parameters.
///
/// Every driver hands rows to the mapper in this shape, and every statement
/// accepts its parameters in it:
/// ```rust
/// use sql_record::prelude::*;
///
/// let params = vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
///     RowValues::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value, interpreted as UTC
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let RowValues::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValues::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Render the value in its default textual form.
    ///
    /// Integers and floats use their decimal form, booleans render as `1`/`0`,
    /// timestamps use [`TIMESTAMP_TEXT_LAYOUT`], blobs are decoded as lossy UTF-8
    /// and `NULL` renders as the empty string.
    #[must_use]
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            RowValues::Int(i) => Cow::Owned(i.to_string()),
            RowValues::Float(f) => Cow::Owned(f.to_string()),
            RowValues::Text(s) => Cow::Borrowed(s.as_str()),
            RowValues::Bool(b) => Cow::Borrowed(if *b { "1" } else { "0" }),
            RowValues::Timestamp(dt) => {
                Cow::Owned(dt.and_utc().format(TIMESTAMP_TEXT_LAYOUT).to_string())
            }
            RowValues::Null => Cow::Borrowed(""),
            RowValues::JSON(jval) => Cow::Owned(jval.to_string()),
            RowValues::Blob(bytes) => String::from_utf8_lossy(bytes),
        }
    }
}

impl From<i64> for RowValues {
    fn from(value: i64) -> Self {
        RowValues::Int(value)
    }
}

impl From<i32> for RowValues {
    fn from(value: i32) -> Self {
        RowValues::Int(i64::from(value))
    }
}

impl From<f64> for RowValues {
    fn from(value: f64) -> Self {
        RowValues::Float(value)
    }
}

impl From<bool> for RowValues {
    fn from(value: bool) -> Self {
        RowValues::Bool(value)
    }
}

impl From<String> for RowValues {
    fn from(value: String) -> Self {
        RowValues::Text(value)
    }
}

impl From<&str> for RowValues {
    fn from(value: &str) -> Self {
        RowValues::Text(value.to_owned())
    }
}

impl From<NaiveDateTime> for RowValues {
    fn from(value: NaiveDateTime) -> Self {
        RowValues::Timestamp(value)
    }
}

impl From<DateTime<Utc>> for RowValues {
    fn from(value: DateTime<Utc>) -> Self {
        RowValues::Timestamp(value.naive_utc())
    }
}

impl From<JsonValue> for RowValues {
    fn from(value: JsonValue) -> Self {
        RowValues::JSON(value)
    }
}

impl From<Vec<u8>> for RowValues {
    fn from(value: Vec<u8>) -> Self {
        RowValues::Blob(value)
    }
}

impl<T: Into<RowValues>> From<Option<T>> for RowValues {
    fn from(value: Option<T>) -> Self {
        value.map_or(RowValues::Null, Into::into)
    }
}

use chrono::{DateTime, Utc};

use super::record::FieldSlot;
use crate::error::SqlRecordError;
use crate::types::RowValues;

// Date and time of the timestamp layout; the offset and zone abbreviation are split off first.
const TIMESTAMP_PARSE_LAYOUT: &str = "%Y-%m-%d %H:%M:%S%.f %z";

/// Parse the decimal text form of an integer.
///
/// # Errors
/// Returns the parser's message if `text` is not a base-10 integer.
pub fn parse_integer(text: &str) -> Result<i64, String> {
    text.parse::<i64>().map_err(|e| e.to_string())
}

/// Only the exact text `1` is true.
#[must_use]
pub fn parse_bool(text: &str) -> bool {
    text == "1"
}

/// Parse `YYYY-MM-DD HH:MM:SS <numeric-offset> <zone-abbrev>`,
/// e.g. `2023-05-01 12:00:00 +0000 UTC`.
///
/// Fractional seconds after the seconds field are accepted, `Z` stands for a
/// zero offset, and the abbreviation must be alphabetic. The offset decides
/// the instant; the abbreviation is not interpreted.
///
/// # Errors
/// Returns a description of what did not match the layout.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, String> {
    let (stamp, zone) = text
        .rsplit_once(' ')
        .ok_or_else(|| "missing zone abbreviation".to_string())?;
    if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(format!("invalid zone abbreviation `{zone}`"));
    }
    let (datetime, offset) = stamp
        .rsplit_once(' ')
        .ok_or_else(|| "missing numeric offset".to_string())?;
    let offset = if offset == "Z" { "+0000" } else { offset };
    DateTime::parse_from_str(&format!("{datetime} {offset}"), TIMESTAMP_PARSE_LAYOUT)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| e.to_string())
}

/// Write `raw` into `slot`, converting it to the slot's type.
///
/// `raw` must not be NULL; callers skip NULLs before getting here.
pub(crate) fn assign(
    slot: FieldSlot<'_>,
    column: &str,
    raw: &RowValues,
) -> Result<(), SqlRecordError> {
    let target = slot.target_name();
    let text = raw.to_text();
    let failed = |reason: String| SqlRecordError::ConversionFailed {
        column: column.to_string(),
        target,
        value: text.to_string(),
        reason,
    };

    match slot {
        FieldSlot::Int64(field) => {
            *field = parse_integer(&text).map_err(failed)?;
        }
        FieldSlot::Int32(field) => {
            let wide = parse_integer(&text).map_err(failed)?;
            *field = i32::try_from(wide).map_err(|e| failed(e.to_string()))?;
        }
        FieldSlot::Text(field) => {
            *field = text.into_owned();
        }
        FieldSlot::Bool(field) => {
            *field = parse_bool(&text);
        }
        FieldSlot::Timestamp(field) => {
            *field = parse_timestamp(&text).map_err(failed)?;
        }
        FieldSlot::Unsupported => {}
    }
    Ok(())
}

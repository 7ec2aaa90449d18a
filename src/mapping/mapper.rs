use std::sync::Arc;

use super::coerce;
use super::descriptor::{RecordDescriptor, describe};
use super::record::Record;
use crate::error::SqlRecordError;
use crate::results::{ResultSet, Row};

/// Maps rows into records using the column names declared under one tag key.
#[derive(Debug, Clone)]
pub struct RowMapper {
    tag: Arc<str>,
}

impl RowMapper {
    #[must_use]
    pub fn new(tag: impl Into<Arc<str>>) -> Self {
        Self { tag: tag.into() }
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Cached descriptor for `T` under this mapper's tag key.
    #[must_use]
    pub fn descriptor<T: Record>(&self) -> Arc<RecordDescriptor> {
        describe::<T>(&self.tag)
    }

    /// Copy the bound columns of `row` into `dest`.
    ///
    /// Columns missing from the row and NULL values leave the field untouched.
    ///
    /// # Errors
    /// Returns `SqlRecordError::ConversionFailed` on the first value that cannot be
    /// coerced; fields bound before it have already been written.
    pub fn map_row<T: Record>(&self, row: &Row, dest: &mut T) -> Result<(), SqlRecordError> {
        apply(&self.descriptor::<T>(), row, dest)
    }

    /// Map `row` into a freshly defaulted `T`.
    ///
    /// # Errors
    /// Returns `SqlRecordError::ConversionFailed` if any bound value cannot be coerced.
    pub fn map_new<T: Record>(&self, row: &Row) -> Result<T, SqlRecordError> {
        let mut record = T::default();
        self.map_row(row, &mut record)?;
        Ok(record)
    }

    /// Map every row of a result set, in order.
    ///
    /// # Errors
    /// Returns the first conversion failure; no records are returned in that case.
    pub fn map_result_set<T: Record>(&self, result_set: &ResultSet) -> Result<Vec<T>, SqlRecordError> {
        let descriptor = self.descriptor::<T>();
        result_set
            .results
            .iter()
            .map(|row| {
                let mut record = T::default();
                apply(&descriptor, row, &mut record)?;
                Ok(record)
            })
            .collect()
    }
}

pub(crate) fn apply<T: Record>(
    descriptor: &RecordDescriptor,
    row: &Row,
    dest: &mut T,
) -> Result<(), SqlRecordError> {
    for binding in descriptor.bindings() {
        let Some(raw) = row.get(&binding.column) else {
            continue;
        };
        if raw.is_null() {
            continue;
        }
        if let Some(slot) = dest.field_mut(binding.field_index) {
            coerce::assign(slot, &binding.column, raw)?;
        }
    }
    Ok(())
}

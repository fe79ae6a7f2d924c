//! Typed access to query result rows.

use datafusion::arrow::array::{
    Array, BooleanArray, Float64Array, Int32Array, Int64Array, ListArray, StringArray,
    TimestampNanosecondArray,
};
use datafusion::arrow::record_batch::RecordBatch;

use crate::error::Error;

/// One row of a query result.
///
/// Row mappers receive this view and pull columns out by name with the
/// typed getters. An unknown column, a type mismatch, or a SQL NULL is an
/// [`Error::Column`].
pub struct SqlRow<'a> {
    batch: &'a RecordBatch,
    row: usize,
}

impl<'a> SqlRow<'a> {
    pub(crate) fn new(batch: &'a RecordBatch, row: usize) -> Self {
        Self { batch, row }
    }

    fn typed_column<T: 'static>(&self, column: &str) -> Result<&T, Error> {
        let index = self
            .batch
            .schema()
            .index_of(column)
            .map_err(|_| Error::Column {
                column: column.to_string(),
                message: "no such column".to_string(),
            })?;
        self.batch
            .column(index)
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| Error::Column {
                column: column.to_string(),
                message: format!(
                    "unexpected type {}",
                    self.batch.schema().field(index).data_type()
                ),
            })
    }

    fn non_null<T: Array + 'static>(&self, column: &str) -> Result<&T, Error> {
        let array = self.typed_column::<T>(column)?;
        if array.is_null(self.row) {
            return Err(Error::Column {
                column: column.to_string(),
                message: "unexpected NULL".to_string(),
            });
        }
        Ok(array)
    }

    /// Read a 32-bit integer column.
    pub fn get_i32(&self, column: &str) -> Result<i32, Error> {
        Ok(self.non_null::<Int32Array>(column)?.value(self.row))
    }

    /// Read a 64-bit integer column.
    pub fn get_i64(&self, column: &str) -> Result<i64, Error> {
        Ok(self.non_null::<Int64Array>(column)?.value(self.row))
    }

    /// Read a 64-bit float column.
    pub fn get_f64(&self, column: &str) -> Result<f64, Error> {
        Ok(self.non_null::<Float64Array>(column)?.value(self.row))
    }

    /// Read a boolean column.
    pub fn get_bool(&self, column: &str) -> Result<bool, Error> {
        Ok(self.non_null::<BooleanArray>(column)?.value(self.row))
    }

    /// Read a string column.
    pub fn get_str(&self, column: &str) -> Result<String, Error> {
        Ok(self.non_null::<StringArray>(column)?.value(self.row).to_string())
    }

    /// Read a nanosecond timestamp column.
    pub fn get_timestamp_nanos(&self, column: &str) -> Result<i64, Error> {
        Ok(self
            .non_null::<TimestampNanosecondArray>(column)?
            .value(self.row))
    }

    /// Read a list-of-strings column.
    pub fn get_str_list(&self, column: &str) -> Result<Vec<String>, Error> {
        let list = self.non_null::<ListArray>(column)?;
        let values = list.value(self.row);
        let strings = values
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| Error::Column {
                column: column.to_string(),
                message: format!("unexpected list element type {}", values.data_type()),
            })?;
        Ok((0..strings.len())
            .filter(|&index| !strings.is_null(index))
            .map(|index| strings.value(index).to_string())
            .collect())
    }
}

//! Per-table storage.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use datafusion::arrow::datatypes::SchemaRef;
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::common::ScalarValue;

use crate::error::Error;
use crate::row::{Row, RowValue};
use crate::storage::backend::CacheBackend;

/// Encodes one stored value into its column scalars.
///
/// Returns `None` when the value is not of the table's declared row type;
/// such entries are skipped when the table is scanned.
pub(crate) type RowEncoder = Arc<dyn Fn(&RowValue) -> Option<Vec<ScalarValue>> + Send + Sync>;

/// Pairs a table's declared row type with its bound cache.
///
/// Built exactly once at schema build time and never mutated afterward;
/// owned by the registry that built it.
pub struct TableStorage {
    row_type: TypeId,
    row_label: &'static str,
    columns: SchemaRef,
    encoder: RowEncoder,
    backend: Arc<dyn CacheBackend>,
}

impl TableStorage {
    pub(crate) fn new<V: Row>(backend: Arc<dyn CacheBackend>) -> Self {
        let encoder: RowEncoder =
            Arc::new(|value: &RowValue| value.downcast_ref::<V>().map(Row::values));
        Self {
            row_type: TypeId::of::<V>(),
            row_label: std::any::type_name::<V>(),
            columns: V::columns(),
            encoder,
            backend,
        }
    }

    /// The bound cache.
    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    /// The columns this table exposes to the query engine.
    pub fn columns(&self) -> SchemaRef {
        Arc::clone(&self.columns)
    }

    /// Whether this table stores rows of type `V`.
    pub fn stores<V: Row>(&self) -> bool {
        self.row_type == TypeId::of::<V>()
    }

    /// Encode the cache's current contents into one record batch.
    ///
    /// Entries whose value is not of the declared row type are skipped.
    pub(crate) fn snapshot_batch(&self) -> Result<RecordBatch, Error> {
        let rows: Vec<Vec<ScalarValue>> = self
            .backend
            .entries()
            .into_iter()
            .filter_map(|(_, value)| (self.encoder)(&value))
            .collect();
        if rows.is_empty() {
            return Ok(RecordBatch::new_empty(self.columns()));
        }

        let column_count = self.columns.fields().len();
        let mut arrays = Vec::with_capacity(column_count);
        for index in 0..column_count {
            let column = ScalarValue::iter_to_array(rows.iter().map(|row| row[index].clone()))?;
            arrays.push(column);
        }
        Ok(RecordBatch::try_new(self.columns(), arrays)?)
    }
}

impl fmt::Debug for TableStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableStorage")
            .field("row_type", &self.row_label)
            .field("columns", &self.columns)
            .finish()
    }
}

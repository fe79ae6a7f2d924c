//! Built schemas.

use std::collections::HashMap;
use std::sync::Arc;

use datafusion::logical_expr::ScalarUDF;
use tracing::debug;

use crate::row::RowValue;
use crate::schema::provider::RegistrySchemaProvider;
use crate::storage::{CacheStats, TableStorage};

/// One independently namespaced collection of named tables and their caches.
///
/// Produced by a successful [`SchemaBuilder::build`](crate::SchemaBuilder::build);
/// every declared table has exactly one storage here and exactly one table
/// in the engine-facing schema, derived from the same map.
#[derive(Debug)]
pub struct CacheRegistry {
    schema_name: String,
    shape: Arc<RegistrySchemaProvider>,
    tables: HashMap<String, Arc<TableStorage>>,
    functions: HashMap<String, ScalarUDF>,
}

impl CacheRegistry {
    pub(crate) fn new(
        schema_name: String,
        tables: HashMap<String, Arc<TableStorage>>,
        functions: HashMap<String, ScalarUDF>,
    ) -> Self {
        let shape = Arc::new(RegistrySchemaProvider::new(&tables));
        Self {
            schema_name,
            shape,
            tables,
            functions,
        }
    }

    /// The schema name as given at builder construction.
    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    /// The name this schema is registered under in the query engine.
    ///
    /// Lower-cased, matching the engine's identifier normalization, so SQL
    /// text may spell the schema in any case.
    pub fn namespace(&self) -> String {
        self.schema_name.to_lowercase()
    }

    /// The engine-facing schema.
    pub fn shape(&self) -> Arc<RegistrySchemaProvider> {
        Arc::clone(&self.shape)
    }

    /// Declared table names.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    /// Look up a table's storage.
    pub fn table_storage(&self, name: &str) -> Option<&Arc<TableStorage>> {
        self.tables.get(name)
    }

    /// Snapshot of every value held by a table.
    ///
    /// `Some(vec![])` for an existing empty table, `None` for an unknown
    /// name.
    pub fn get_all(&self, name: &str) -> Option<Vec<RowValue>> {
        self.tables.get(name).map(|storage| {
            storage
                .backend()
                .entries()
                .into_iter()
                .map(|(_, value)| value)
                .collect()
        })
    }

    /// Statistics of a table's cache.
    pub fn stats(&self, name: &str) -> Option<CacheStats> {
        self.tables.get(name).map(|storage| storage.backend().stats())
    }

    /// Declared scalar functions.
    pub fn functions(&self) -> impl Iterator<Item = &ScalarUDF> {
        self.functions.values()
    }

    /// Clear every table's cache.
    ///
    /// The registry stays structurally intact; tables are merely empty
    /// afterwards.
    pub fn invalidate_all(&self) {
        debug!(schema = %self.schema_name, "invalidating all table caches");
        for storage in self.tables.values() {
            storage.backend().invalidate_all();
        }
    }
}

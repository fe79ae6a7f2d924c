//! Query engine bindings for a built schema.
//!
//! The registry is handed to the engine as a programmatic catalog: one
//! schema provider per registry, one table provider per table. Scans read
//! the backing cache at execution time, so query results always reflect
//! the cache's current contents.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use datafusion::catalog::memory::MemTable;
use datafusion::catalog::{SchemaProvider, Session, TableProvider};
use datafusion::common::{DataFusionError, Result as DFResult};
use datafusion::arrow::datatypes::SchemaRef;
use datafusion::logical_expr::{Expr, TableType};
use datafusion::physical_plan::ExecutionPlan;

use crate::storage::TableStorage;

/// One cached table as seen by the query engine.
#[derive(Debug)]
pub(crate) struct StorageTableProvider {
    storage: Arc<TableStorage>,
}

impl StorageTableProvider {
    pub(crate) fn new(storage: Arc<TableStorage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl TableProvider for StorageTableProvider {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn schema(&self) -> SchemaRef {
        self.storage.columns()
    }

    fn table_type(&self) -> TableType {
        TableType::Base
    }

    async fn scan(
        &self,
        state: &dyn Session,
        projection: Option<&Vec<usize>>,
        _filters: &[Expr],
        limit: Option<usize>,
    ) -> DFResult<Arc<dyn ExecutionPlan>> {
        let batch = self
            .storage
            .snapshot_batch()
            .map_err(|error| DataFusionError::External(Box::new(error)))?;
        let mem = MemTable::try_new(self.schema(), vec![vec![batch]])?;
        mem.scan(state, projection, &[], limit).await
    }
}

/// The relational face of one registry.
///
/// Registered with the engine under the registry's namespace; its table set
/// is derived from the registry's storage map, so the engine and the facade
/// always agree on what a table name means.
#[derive(Debug)]
pub struct RegistrySchemaProvider {
    tables: HashMap<String, Arc<dyn TableProvider>>,
}

impl RegistrySchemaProvider {
    pub(crate) fn new(storages: &HashMap<String, Arc<TableStorage>>) -> Self {
        let tables = storages
            .iter()
            .map(|(name, storage)| {
                let provider: Arc<dyn TableProvider> =
                    Arc::new(StorageTableProvider::new(Arc::clone(storage)));
                (name.clone(), provider)
            })
            .collect();
        Self { tables }
    }
}

#[async_trait]
impl SchemaProvider for RegistrySchemaProvider {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    async fn table(&self, name: &str) -> DFResult<Option<Arc<dyn TableProvider>>> {
        Ok(self.tables.get(name).cloned())
    }

    fn table_exist(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }
}

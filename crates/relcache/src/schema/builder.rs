//! Schema definition builder.

use std::collections::HashMap;
use std::sync::Arc;

use datafusion::logical_expr::ScalarUDF;
use moka::sync::Cache;
use tracing::{debug, error};

use crate::error::Error;
use crate::outcome::Outcome;
use crate::row::{CacheKey, Row, RowValue};
use crate::schema::registry::CacheRegistry;
use crate::storage::{CacheBackend, MokaBackend, StorageBuilder, TableStorage};

type StorageConstructor = Box<dyn Fn(Arc<dyn CacheBackend>) -> TableStorage + Send + Sync>;

struct TableDeclaration {
    name: String,
    make_storage: StorageConstructor,
    backend: Option<Arc<dyn CacheBackend>>,
}

/// Accumulates table and scalar function declarations for one named schema.
///
/// Tables are declared in two steps: [`SchemaBuilder::add_table`] names the
/// table and its row type, and the returned [`TableBuilder`] binds the
/// cache that backs it. A table left without storage fails the whole
/// build.
pub struct SchemaBuilder {
    schema_name: String,
    declarations: Vec<TableDeclaration>,
    functions: Vec<ScalarUDF>,
}

impl SchemaBuilder {
    /// Start a schema under the given name.
    pub fn new(schema_name: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            declarations: Vec::new(),
            functions: Vec::new(),
        }
    }

    /// Declare a table of `V` rows under the row type's default name.
    pub fn add_table<V: Row>(&mut self) -> TableBuilder<'_> {
        let name = V::table_name();
        self.add_table_as::<V>(name)
    }

    /// Declare a table of `V` rows under an explicit name.
    ///
    /// Use distinct explicit names to host the same row type in several
    /// tables of one schema.
    pub fn add_table_as<V: Row>(&mut self, name: impl Into<String>) -> TableBuilder<'_> {
        self.declarations.push(TableDeclaration {
            name: name.into(),
            make_storage: Box::new(|backend| TableStorage::new::<V>(backend)),
            backend: None,
        });
        let index = self.declarations.len() - 1;
        TableBuilder {
            schema: self,
            index,
        }
    }

    /// Declare a scalar function callable from SQL text.
    ///
    /// The function is registered under the name the UDF itself carries.
    pub fn add_function(&mut self, function: ScalarUDF) -> &mut Self {
        self.functions.push(function);
        self
    }

    /// Build the registry from the accumulated declarations.
    ///
    /// Validates that every table has storage and that no table name is
    /// declared twice, then materializes one storage per table and the
    /// engine-facing schema over them. Any failure short-circuits; a
    /// partial registry is never returned. May be called more than once;
    /// each call yields a fresh registry over the same cache instances.
    pub fn build(&self) -> Outcome<CacheRegistry> {
        let mut tables: HashMap<String, Arc<TableStorage>> = HashMap::new();
        for declaration in &self.declarations {
            if tables.contains_key(&declaration.name) {
                error!(table = %declaration.name, "table declared more than once");
                return Outcome::err(Error::DuplicateTable(declaration.name.clone()));
            }
            let backend = match &declaration.backend {
                Some(backend) => Arc::clone(backend),
                None => {
                    error!(table = %declaration.name, "table has no storage configured");
                    return Outcome::err(Error::MissingStorage(declaration.name.clone()));
                }
            };
            debug!(table = %declaration.name, "binding table storage");
            tables.insert(
                declaration.name.clone(),
                Arc::new((declaration.make_storage)(backend)),
            );
        }

        let functions = self
            .functions
            .iter()
            .map(|function| (function.name().to_string(), function.clone()))
            .collect();
        Outcome::ok(CacheRegistry::new(
            self.schema_name.clone(),
            tables,
            functions,
        ))
    }
}

/// Completes one table declaration by binding its storage.
pub struct TableBuilder<'a> {
    schema: &'a mut SchemaBuilder,
    index: usize,
}

impl<'a> TableBuilder<'a> {
    /// Bind a `moka` cache built by the given factory.
    ///
    /// The factory receives the cache builder and configures the eviction
    /// policy: `|b| b.build()` for an unbounded cache,
    /// `|b| b.max_capacity(..).time_to_live(..).build()` and so on.
    pub fn with_storage<F>(self, build: F) -> &'a mut SchemaBuilder
    where
        F: FnOnce(StorageBuilder) -> Cache<CacheKey, RowValue>,
    {
        let cache = build(Cache::builder());
        self.with_backend(Arc::new(MokaBackend::new(cache)))
    }

    /// Bind any conforming cache backend.
    pub fn with_backend(self, backend: Arc<dyn CacheBackend>) -> &'a mut SchemaBuilder {
        self.schema.declarations[self.index].backend = Some(backend);
        self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datafusion::arrow::datatypes::{DataType, Field, Schema, SchemaRef};
    use datafusion::catalog::SchemaProvider;
    use datafusion::common::ScalarValue;

    #[derive(Debug, Clone)]
    struct Employee {
        id: i32,
    }

    #[derive(Debug, Clone)]
    struct Department {
        id: i32,
    }

    impl Row for Employee {
        fn columns() -> SchemaRef {
            Arc::new(Schema::new(vec![Field::new("id", DataType::Int32, false)]))
        }

        fn values(&self) -> Vec<ScalarValue> {
            vec![ScalarValue::Int32(Some(self.id))]
        }
    }

    impl Row for Department {
        fn columns() -> SchemaRef {
            Arc::new(Schema::new(vec![Field::new("id", DataType::Int32, false)]))
        }

        fn values(&self) -> Vec<ScalarValue> {
            vec![ScalarValue::Int32(Some(self.id))]
        }
    }

    #[test]
    fn test_build_registers_declared_tables() {
        let mut builder = SchemaBuilder::new("cacheAddTable");
        builder
            .add_table::<Employee>()
            .with_storage(|b| b.build())
            .add_table::<Department>()
            .with_storage(|b| b.build());

        let registry = builder.build().into_result().unwrap();
        assert_eq!(registry.schema_name(), "cacheAddTable");
        assert_eq!(registry.namespace(), "cacheaddtable");
        assert!(registry.shape().table_exist("employee"));
        assert!(registry.shape().table_exist("department"));
        assert_eq!(
            registry.table_storage("employee").unwrap().columns(),
            Employee::columns()
        );
        assert!(registry.table_storage("employee").unwrap().stores::<Employee>());
        assert!(!registry.table_storage("employee").unwrap().stores::<Department>());
    }

    #[test]
    fn test_table_without_storage_fails_build() {
        let mut builder = SchemaBuilder::new("cache");
        builder.add_table::<Employee>();

        let outcome = builder.build();
        assert!(
            matches!(outcome.error(), Some(Error::MissingStorage(name)) if name == "employee")
        );
    }

    #[test]
    fn test_duplicate_table_name_fails_build() {
        let mut builder = SchemaBuilder::new("cache");
        builder
            .add_table::<Employee>()
            .with_storage(|b| b.build())
            .add_table_as::<Employee>("employee")
            .with_storage(|b| b.build());

        let outcome = builder.build();
        assert!(
            matches!(outcome.error(), Some(Error::DuplicateTable(name)) if name == "employee")
        );
    }

    #[test]
    fn test_same_row_type_under_two_names() {
        let mut builder = SchemaBuilder::new("cache");
        builder
            .add_table_as::<Employee>("employee_from_1_to_99")
            .with_storage(|b| b.build())
            .add_table_as::<Employee>("employee_from_100_to_199")
            .with_storage(|b| b.build());

        let registry = builder.build().into_result().unwrap();
        let mut names = registry.table_names();
        names.sort();
        assert_eq!(
            names,
            vec!["employee_from_100_to_199", "employee_from_1_to_99"]
        );
    }

    #[test]
    fn test_rebuild_shares_cache_instances() {
        let mut builder = SchemaBuilder::new("cache");
        builder.add_table::<Employee>().with_storage(|b| b.build());

        let first = builder.build().into_result().unwrap();
        first
            .table_storage("employee")
            .unwrap()
            .backend()
            .put(CacheKey::from(1), Arc::new(Employee { id: 1 }));

        let second = builder.build().into_result().unwrap();
        assert_eq!(second.get_all("employee").unwrap().len(), 1);
    }
}

//! Application-facing cache facade.

use std::collections::HashMap;
use std::sync::Arc;

use datafusion::common::{ParamValues, ScalarValue};
use datafusion::prelude::{SessionConfig, SessionContext};
use tracing::{debug, error};

use crate::error::Error;
use crate::outcome::Outcome;
use crate::row::{CacheKey, Row, RowValue};
use crate::schema::{CacheRegistry, SchemaBuilder};
use crate::sql::SqlRow;
use crate::storage::CacheStats;

/// Engine catalog every schema is attached to.
const ENGINE_CATALOG: &str = "datafusion";

/// Entry point for storing rows and querying them with SQL.
///
/// A facade is bound to one built registry and one engine session. Point
/// operations resolve their table either from an explicit name or from the
/// row type's default name; schemas hosting one row type under several
/// names must use the explicit variants.
///
/// # Quick start
///
/// ```ignore
/// use relcache::RelCache;
///
/// let cache = RelCache::builder("hr")
///     .with_schema(|schema| {
///         schema.add_table::<Employee>().with_storage(|b| b.build());
///     })
///     .build()
///     .into_result()?;
///
/// cache.put(1, employee);
/// let rows = cache
///     .query("select emp.* from hr.employee emp", employee_mapper)
///     .await?;
/// ```
pub struct RelCache {
    registry: Arc<CacheRegistry>,
    ctx: SessionContext,
}

impl RelCache {
    /// Start building a cache under the given schema name.
    ///
    /// Schema names must be unique among caches that are meant to stay
    /// distinguishable in SQL text; each facade owns its own engine
    /// session, so two caches never observe each other's tables.
    pub fn builder(schema_name: impl Into<String>) -> RelCacheBuilder {
        RelCacheBuilder::new(schema_name)
    }

    fn init(registry: CacheRegistry, config: SessionConfig) -> Outcome<RelCache> {
        let namespace = registry.namespace();
        let mut config = config.with_default_catalog_and_schema(ENGINE_CATALOG, namespace.clone());
        config.options_mut().sql_parser.enable_ident_normalization = true;
        config.options_mut().catalog.create_default_catalog_and_schema = true;

        let ctx = SessionContext::new_with_config(config);
        let catalog = match ctx.catalog(ENGINE_CATALOG) {
            Some(catalog) => catalog,
            None => return Outcome::err(Error::MissingCatalog(ENGINE_CATALOG.to_string())),
        };
        if let Err(error) = catalog.register_schema(&namespace, registry.shape()) {
            return Outcome::err(Error::Engine(error));
        }
        for function in registry.functions() {
            ctx.register_udf(function.clone());
        }
        debug!(schema = %namespace, "schema registered with query engine");

        Outcome::ok(RelCache {
            registry: Arc::new(registry),
            ctx,
        })
    }

    /// The registry this facade routes to.
    pub fn registry(&self) -> &Arc<CacheRegistry> {
        &self.registry
    }

    /// Store a value in the row type's default table.
    ///
    /// Overwrites any existing entry under the key. Writing to an unknown
    /// table is a no-op.
    pub fn put<V: Row>(&self, key: impl Into<CacheKey>, value: V) -> &Self {
        self.put_into(&V::table_name(), key, value)
    }

    /// Store a value in a named table.
    pub fn put_into<V: Row>(&self, table: &str, key: impl Into<CacheKey>, value: V) -> &Self {
        if let Some(storage) = self.registry.table_storage(table) {
            storage.backend().put(key.into(), Arc::new(value));
        }
        self
    }

    /// Store a batch of values in the row type's default table.
    pub fn put_all<K, V>(&self, entries: impl IntoIterator<Item = (K, V)>) -> &Self
    where
        K: Into<CacheKey>,
        V: Row,
    {
        self.put_all_into(&V::table_name(), entries)
    }

    /// Store a batch of values in a named table.
    pub fn put_all_into<K, V>(
        &self,
        table: &str,
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> &Self
    where
        K: Into<CacheKey>,
        V: Row,
    {
        if let Some(storage) = self.registry.table_storage(table) {
            let entries: Vec<(CacheKey, RowValue)> = entries
                .into_iter()
                .map(|(key, value)| (key.into(), Arc::new(value) as RowValue))
                .collect();
            storage.backend().put_all(entries);
        }
        self
    }

    /// Look up one row by key in the row type's default table.
    pub fn get_by_id<V: Row>(&self, key: impl Into<CacheKey>) -> Option<V> {
        self.get_by_id_from(&V::table_name(), key)
    }

    /// Look up one row by key in a named table.
    ///
    /// `None` for an unknown table, an absent key, or a stored value that
    /// is not of type `V`.
    pub fn get_by_id_from<V: Row>(&self, table: &str, key: impl Into<CacheKey>) -> Option<V> {
        let storage = self.registry.table_storage(table)?;
        let value = storage.backend().get(&key.into())?;
        value.downcast_ref::<V>().cloned()
    }

    /// All rows of the row type's default table.
    pub fn get_all<V: Row>(&self) -> Vec<V> {
        self.get_all_from(&V::table_name())
    }

    /// All rows of a named table.
    ///
    /// Empty for an unknown table; rows of a different type are skipped.
    pub fn get_all_from<V: Row>(&self, table: &str) -> Vec<V> {
        self.registry
            .get_all(table)
            .map(|values| {
                values
                    .iter()
                    .filter_map(|value| value.downcast_ref::<V>().cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Cache statistics of the row type's default table.
    pub fn stats<V: Row>(&self) -> Option<CacheStats> {
        self.stats_for(&V::table_name())
    }

    /// Cache statistics of a named table.
    pub fn stats_for(&self, table: &str) -> Option<CacheStats> {
        self.registry.stats(table)
    }

    /// Execute a SELECT against the cached tables.
    ///
    /// Tables are addressed as `<schema>.<table>`; every result row is
    /// passed through `mapper`.
    pub async fn query<T, F>(&self, sql: &str, mapper: F) -> Result<Vec<T>, Error>
    where
        F: FnMut(&SqlRow<'_>) -> Result<T, Error>,
    {
        self.query_with(sql, Vec::new(), mapper).await
    }

    /// Execute a SELECT with named parameters.
    ///
    /// Parameters are referenced in SQL text as `$name`. Passing none is
    /// fine as long as the SQL references none.
    pub async fn query_with<T, F>(
        &self,
        sql: &str,
        parameters: Vec<(&str, ScalarValue)>,
        mut mapper: F,
    ) -> Result<Vec<T>, Error>
    where
        F: FnMut(&SqlRow<'_>) -> Result<T, Error>,
    {
        let mut frame = self.ctx.sql(sql).await?;
        if !parameters.is_empty() {
            let values: HashMap<String, ScalarValue> = parameters
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect();
            frame = frame.with_param_values(ParamValues::Map(values))?;
        }

        let batches = frame.collect().await?;
        let mut rows = Vec::new();
        for batch in &batches {
            for index in 0..batch.num_rows() {
                rows.push(mapper(&SqlRow::new(batch, index))?);
            }
        }
        Ok(rows)
    }

    /// Release the engine session and clear every table's cache.
    ///
    /// Consumes the facade; invoke it before shutdown. Other holders of
    /// the registry `Arc` keep a structurally intact but empty registry.
    pub fn destroy(self) {
        debug!(schema = %self.registry.schema_name(), "destroying cache");
        self.registry.invalidate_all();
    }
}

/// Builds a [`RelCache`].
///
/// The schema and the engine session are configured through callbacks; a
/// fixed subset of session options (default catalog and schema, identifier
/// normalization, default catalog creation) is overwritten after all
/// callbacks, since the engine cannot bind the schema correctly without
/// them.
pub struct RelCacheBuilder {
    schema: SchemaBuilder,
    session_config: SessionConfig,
}

impl RelCacheBuilder {
    fn new(schema_name: impl Into<String>) -> Self {
        Self {
            schema: SchemaBuilder::new(schema_name),
            session_config: SessionConfig::new(),
        }
    }

    /// Configure the schema: declare tables, storages, and functions.
    pub fn with_schema(mut self, configure: impl FnOnce(&mut SchemaBuilder)) -> Self {
        configure(&mut self.schema);
        self
    }

    /// Configure the engine session.
    ///
    /// Any option may be set here except the fixed subset the builder
    /// overwrites at build time.
    pub fn with_session_config(
        mut self,
        configure: impl FnOnce(SessionConfig) -> SessionConfig,
    ) -> Self {
        self.session_config = configure(self.session_config);
        self
    }

    /// Build the schema and bind it to a fresh engine session.
    ///
    /// Any schema or registration failure yields a failure outcome; a
    /// partially initialized facade is never returned. The failure is also
    /// logged here, once per build chain.
    pub fn build(self) -> Outcome<RelCache> {
        let Self {
            schema,
            session_config,
        } = self;
        schema
            .build()
            .and_then(|registry| RelCache::init(registry, session_config))
            .on_error(|error| error!(%error, "failed to build cache"))
    }
}

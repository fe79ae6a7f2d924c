//! relcache - named in-memory caches of typed rows, queryable with SQL.
//!
//! Each cache (a schema) owns a set of named tables; every table is backed
//! by its own eviction-configurable key-value cache and exposed to an
//! embedded SQL engine as a live relational table. Rows are put and read
//! by key directly, or queried with ordinary SQL text - joins, filters,
//! scalar functions, date and array predicates - with no staleness window
//! between a put and the next query.
//!
//! # Quick Start
//!
//! ```ignore
//! use relcache::{RelCache, Row};
//!
//! let cache = RelCache::builder("hr")
//!     .with_schema(|schema| {
//!         schema
//!             .add_table::<Employee>()
//!             .with_storage(|b| b.build())
//!             .add_table::<Department>()
//!             .with_storage(|b| b.max_capacity(10_000).build());
//!     })
//!     .build()
//!     .into_result()?;
//!
//! cache.put(employee.id, employee);
//!
//! let rows = cache
//!     .query("select emp.* from hr.employee emp", |row| {
//!         Ok(row.get_str("last_name")?)
//!     })
//!     .await?;
//!
//! cache.destroy();
//! ```

pub mod error;
pub mod outcome;
pub mod row;
pub mod schema;
pub mod sql;
pub mod storage;

mod cache;

pub use cache::{RelCache, RelCacheBuilder};
pub use error::Error;
pub use outcome::Outcome;
pub use row::{CacheKey, Row, RowValue};
pub use schema::{CacheRegistry, RegistrySchemaProvider, SchemaBuilder, TableBuilder};
pub use sql::SqlRow;
pub use storage::{CacheBackend, CacheStats, MokaBackend, StorageBuilder, TableStorage};

//! Core error types.

use datafusion::arrow::error::ArrowError;
use datafusion::common::DataFusionError;
use thiserror::Error;

/// Errors raised while building a schema or executing against it.
///
/// Unresolvable table names are deliberately not represented here: lookup
/// operations return `None` or an empty list instead, so the happy path of
/// the facade stays ergonomic.
#[derive(Debug, Error)]
pub enum Error {
    /// A table was declared without a storage backend.
    #[error("table '{0}' has no storage configured")]
    MissingStorage(String),

    /// Two tables were declared under the same name in one schema.
    #[error("table '{0}' is declared more than once")]
    DuplicateTable(String),

    /// The engine session has no catalog to attach the schema to.
    #[error("query engine catalog '{0}' is not available")]
    MissingCatalog(String),

    /// Query engine error.
    #[error("query engine error: {0}")]
    Engine(#[from] DataFusionError),

    /// Columnar data assembly error.
    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// A result column could not be read the way the row mapper asked for.
    #[error("column '{column}': {message}")]
    Column {
        /// Result column name.
        column: String,
        /// What went wrong reading it.
        message: String,
    },

    /// An outcome was constructed from an absent value.
    #[error("value is absent")]
    AbsentValue,
}

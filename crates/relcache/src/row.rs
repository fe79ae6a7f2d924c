//! Row types and cache keys.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use datafusion::arrow::datatypes::SchemaRef;
use datafusion::common::ScalarValue;

/// A value stored in a table's cache.
///
/// Values are kept type-erased so one registry can host tables of different
/// row types; every read path recovers the declared type with a checked
/// downcast.
pub type RowValue = Arc<dyn Any + Send + Sync>;

/// A type that can live as a row in a cached table.
///
/// The row declares its own relational projection: the column set the query
/// engine sees and the scalar values backing one row. `values` must yield
/// one scalar per column, in the same order as `columns`.
pub trait Row: Clone + Send + Sync + 'static {
    /// Default table name for this row type.
    ///
    /// Derived from the type's simple name, lower-cased. Declare the table
    /// under an explicit name to host the same row type in several tables.
    fn table_name() -> String {
        simple_type_name(std::any::type_name::<Self>()).to_lowercase()
    }

    /// The columns this row type exposes to the query engine.
    fn columns() -> SchemaRef;

    /// One scalar per column, in column order.
    fn values(&self) -> Vec<ScalarValue>;
}

/// Key addressing one row within its table.
///
/// Supplied by the caller, never derived from the value. Uniqueness is per
/// table only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Integer key.
    Int(i64),
    /// Text key.
    Text(String),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Int(key) => write!(f, "{key}"),
            CacheKey::Text(key) => write!(f, "{key}"),
        }
    }
}

impl From<i32> for CacheKey {
    fn from(key: i32) -> Self {
        CacheKey::Int(key.into())
    }
}

impl From<i64> for CacheKey {
    fn from(key: i64) -> Self {
        CacheKey::Int(key)
    }
}

impl From<u32> for CacheKey {
    fn from(key: u32) -> Self {
        CacheKey::Int(key.into())
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        CacheKey::Text(key.to_string())
    }
}

impl From<String> for CacheKey {
    fn from(key: String) -> Self {
        CacheKey::Text(key)
    }
}

/// Last path segment of a fully qualified type name, generics stripped.
pub(crate) fn simple_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use datafusion::arrow::datatypes::{DataType, Field, Schema};

    #[derive(Clone)]
    struct Employee;

    impl Row for Employee {
        fn columns() -> SchemaRef {
            Arc::new(Schema::new(vec![Field::new("id", DataType::Int32, false)]))
        }

        fn values(&self) -> Vec<ScalarValue> {
            vec![ScalarValue::Int32(Some(1))]
        }
    }

    #[test]
    fn test_simple_type_name() {
        assert_eq!(simple_type_name("crate::model::Employee"), "Employee");
        assert_eq!(simple_type_name("Employee"), "Employee");
        assert_eq!(
            simple_type_name("alloc::vec::Vec<core::option::Option<i32>>"),
            "Vec"
        );
    }

    #[test]
    fn test_default_table_name_is_lowercased_simple_name() {
        assert_eq!(Employee::table_name(), "employee");
    }

    #[test]
    fn test_cache_key_conversions() {
        assert_eq!(CacheKey::from(1i32), CacheKey::Int(1));
        assert_eq!(CacheKey::from(1i64), CacheKey::Int(1));
        assert_eq!(CacheKey::from("one"), CacheKey::Text("one".into()));
        assert_ne!(CacheKey::from(1i32), CacheKey::from("1"));
    }
}

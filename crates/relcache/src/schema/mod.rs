//! Schema declaration, build, and engine bindings.

mod builder;
mod provider;
mod registry;

pub use builder::{SchemaBuilder, TableBuilder};
pub use provider::RegistrySchemaProvider;
pub use registry::CacheRegistry;

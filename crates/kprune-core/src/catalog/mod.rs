pub mod errors;
pub mod registry;
pub mod types;

pub use errors::CatalogError;
pub use registry::resolve_catalog;
pub use types::{ResourceCatalog, ResourceKind, Scope};

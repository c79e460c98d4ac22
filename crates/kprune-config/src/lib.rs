//! Configuration for kprune.
//!
//! TOML types, layered loading, environment overrides and validation.

pub mod errors;
pub mod loading;
pub mod types;

pub use errors::ConfigError;
pub use loading::{
    DRY_RUN_ENV, NAMESPACE_ENV, load_hierarchy, load_layers, project_config_path,
    user_config_path,
};
pub use types::{
    CatalogConfig, DEFAULT_METADATA_DOMAIN, DEFAULT_NAMESPACE, KpruneConfig, OwnerConfig,
    PruneConfig,
};

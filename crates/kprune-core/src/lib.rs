//! Ownership-scoped pruning of cluster resources.
//!
//! A [`prune::Pruner`] lists every resource kind in a [`catalog::ResourceCatalog`]
//! for the objects labeled as owned by a component, and deletes the ones the
//! desired state no longer names.

pub mod cache;
pub mod catalog;
pub mod cluster;
pub mod errors;
pub mod events;
pub mod labels;
pub mod logging;
pub mod manifest;
pub mod prune;

// Re-export commonly used types at crate root for convenience
pub use cache::ObjectCache;
pub use catalog::{ResourceCatalog, ResourceKind, Scope, resolve_catalog};
pub use cluster::{ClusterClient, ClusterError, InMemoryCluster, LiveResource, ObjectHash};
pub use errors::{KpruneError, KpruneResult};
pub use labels::{LabelError, LabelSelector, OwnershipLabeler};
pub use logging::init_logging;
pub use manifest::{DesiredState, ExpectedSet, Manifest};
pub use prune::{PruneError, PruneOptions, PruneOutcome, PruneReport, PruneSummary, Pruner};

pub use kprune_config::KpruneConfig;

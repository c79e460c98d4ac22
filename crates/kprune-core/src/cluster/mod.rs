pub mod errors;
#[cfg(feature = "kube")]
pub mod kubernetes;
pub mod memory;
pub mod traits;
pub mod types;

pub use errors::{ClusterError, SnapshotError};
#[cfg(feature = "kube")]
pub use kubernetes::KubeCluster;
pub use memory::{ClusterCall, ClusterSnapshot, InMemoryCluster};
pub use traits::ClusterClient;
pub use types::{LiveResource, ObjectHash, PropagationPolicy};

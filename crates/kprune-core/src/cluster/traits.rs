//! Cluster backend trait definition.

use tokio_util::sync::CancellationToken;

use crate::catalog::ResourceKind;
use crate::cluster::errors::ClusterError;
use crate::cluster::types::{LiveResource, PropagationPolicy};
use crate::labels::LabelSelector;

/// The two cluster operations a sweep needs.
///
/// Implementations must honour `cancel`: once it fires, in-flight and new
/// calls should return [`ClusterError::Cancelled`] promptly.
pub trait ClusterClient: Send + Sync {
    /// The canonical name of this backend (e.g., "memory", "kube").
    fn name(&self) -> &'static str;

    /// List resources of `kind` carrying every label in `selector`.
    ///
    /// `namespace` is `None` for cluster-scoped kinds. A kind the cluster
    /// does not serve fails with [`ClusterError::KindNotFound`].
    fn list(
        &self,
        kind: &ResourceKind,
        selector: &LabelSelector,
        namespace: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<LiveResource>, ClusterError>;

    /// Delete a single resource.
    ///
    /// Deleting a resource that is already gone fails with
    /// [`ClusterError::NotFound`].
    fn delete(
        &self,
        resource: &LiveResource,
        propagation: PropagationPolicy,
        cancel: &CancellationToken,
    ) -> Result<(), ClusterError>;
}

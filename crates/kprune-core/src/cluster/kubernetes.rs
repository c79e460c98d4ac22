//! Kubernetes API backend built on kube-rs.
//!
//! The sweep is synchronous, so calls are driven on a tokio runtime handle.
//! Use it from a blocking thread (e.g. inside `spawn_blocking`), never from
//! an async task, since `Handle::block_on` panics there.

use std::future::Future;

use kube::{
    Client,
    api::{Api, DeleteParams, DynamicObject, ListParams},
    core::GroupVersionKind,
    discovery::ApiResource,
};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::catalog::ResourceKind;
use crate::cluster::errors::ClusterError;
use crate::cluster::traits::ClusterClient;
use crate::cluster::types::{LiveResource, PropagationPolicy};
use crate::labels::LabelSelector;

pub struct KubeCluster {
    client: Client,
    handle: Handle,
}

impl KubeCluster {
    pub fn new(client: Client, handle: Handle) -> Self {
        Self { client, handle }
    }

    /// Connect using the default kubeconfig or in-cluster configuration.
    pub async fn connect() -> Result<Self, ClusterError> {
        let client = Client::try_default()
            .await
            .map_err(|e| ClusterError::Transport {
                message: format!("connecting to cluster: {}", e),
            })?;
        debug!(event = "core.cluster.kube_connected");
        Ok(Self::new(client, Handle::current()))
    }

    fn api(&self, kind: &ResourceKind, namespace: Option<&str>) -> Api<DynamicObject> {
        let ar = ApiResource::from_gvk(&GroupVersionKind::gvk(
            kind.group(),
            kind.version(),
            kind.kind(),
        ));
        match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &ar),
            None => Api::all_with(self.client.clone(), &ar),
        }
    }

    fn run<T>(
        &self,
        cancel: &CancellationToken,
        fut: impl Future<Output = Result<T, ClusterError>>,
    ) -> Result<T, ClusterError> {
        self.handle.block_on(async {
            tokio::select! {
                _ = cancel.cancelled() => Err(ClusterError::Cancelled),
                result = fut => result,
            }
        })
    }
}

fn map_error(err: kube::Error, not_found: impl FnOnce() -> ClusterError) -> ClusterError {
    match err {
        kube::Error::Api(ref status) if status.code == 404 => not_found(),
        kube::Error::Api(ref status) if status.code == 401 || status.code == 403 => {
            ClusterError::Forbidden {
                message: err.to_string(),
            }
        }
        other => ClusterError::Transport {
            message: other.to_string(),
        },
    }
}

fn to_live_resource(kind: &ResourceKind, object: DynamicObject) -> Option<LiveResource> {
    let name = object.metadata.name.filter(|n| !n.is_empty())?;
    Some(LiveResource {
        kind: kind.clone(),
        namespace: object.metadata.namespace,
        name,
        labels: object.metadata.labels.unwrap_or_default(),
    })
}

impl ClusterClient for KubeCluster {
    fn name(&self) -> &'static str {
        "kube"
    }

    fn list(
        &self,
        kind: &ResourceKind,
        selector: &LabelSelector,
        namespace: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<LiveResource>, ClusterError> {
        let api = self.api(kind, namespace);
        let params = ListParams::default().labels(&selector.to_query());

        self.run(cancel, async {
            let objects = api.list(&params).await.map_err(|e| {
                map_error(e, || ClusterError::KindNotFound {
                    kind: kind.to_string(),
                })
            })?;
            Ok(objects
                .items
                .into_iter()
                .filter_map(|o| to_live_resource(kind, o))
                .collect())
        })
    }

    fn delete(
        &self,
        resource: &LiveResource,
        propagation: PropagationPolicy,
        cancel: &CancellationToken,
    ) -> Result<(), ClusterError> {
        let api = self.api(&resource.kind, resource.namespace.as_deref());
        let params = match propagation {
            PropagationPolicy::Background => DeleteParams::background(),
            PropagationPolicy::Foreground => DeleteParams::foreground(),
            PropagationPolicy::Orphan => DeleteParams::orphan(),
        };

        self.run(cancel, async {
            api.delete(&resource.name, &params)
                .await
                .map(|_| ())
                .map_err(|e| {
                    map_error(e, || ClusterError::NotFound {
                        resource: resource.hash().to_string(),
                    })
                })
        })
    }
}

//! In-memory cluster backend.
//!
//! Holds a list of resources plus the kinds the "cluster" does not serve.
//! Serializes to a JSON snapshot so the CLI can run sweeps against a file,
//! and records every call so tests can assert on ordering.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::catalog::ResourceKind;
use crate::cluster::errors::{ClusterError, SnapshotError};
use crate::cluster::traits::ClusterClient;
use crate::cluster::types::{LiveResource, ObjectHash, PropagationPolicy};
use crate::labels::LabelSelector;

/// Serializable cluster contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSnapshot {
    pub resources: Vec<LiveResource>,
    /// Kinds whose listing fails as if their CRD were not installed.
    pub unavailable_kinds: Vec<ResourceKind>,
}

impl ClusterSnapshot {
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let content = std::fs::read_to_string(path)?;
        let snapshot = serde_json::from_str(&content)?;
        debug!(event = "core.cluster.snapshot_loaded", path = %path.display());
        Ok(snapshot)
    }

    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        debug!(event = "core.cluster.snapshot_saved", path = %path.display());
        Ok(())
    }
}

/// A call observed by [`InMemoryCluster`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterCall {
    List {
        kind: ResourceKind,
        namespace: Option<String>,
    },
    Delete {
        kind: ResourceKind,
        identity: ObjectHash,
        propagation: PropagationPolicy,
    },
}

#[derive(Debug, Default)]
struct ClusterState {
    snapshot: ClusterSnapshot,
    list_failures: HashMap<ResourceKind, VecDeque<ClusterError>>,
    delete_failures: HashMap<ObjectHash, ClusterError>,
    cancel_after_deletes: Option<(usize, CancellationToken)>,
    calls: Vec<ClusterCall>,
}

#[derive(Debug, Default)]
pub struct InMemoryCluster {
    state: Mutex<ClusterState>,
}

impl InMemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: ClusterSnapshot) -> Self {
        Self {
            state: Mutex::new(ClusterState {
                snapshot,
                ..Default::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, ClusterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> ClusterSnapshot {
        self.state().snapshot.clone()
    }

    pub fn insert(&self, resource: LiveResource) {
        self.state().snapshot.resources.push(resource);
    }

    /// Make listings of `kind` fail with [`ClusterError::KindNotFound`].
    pub fn mark_unavailable(&self, kind: ResourceKind) {
        self.state().snapshot.unavailable_kinds.push(kind);
    }

    /// Queue a one-shot failure for the next listing of `kind`.
    pub fn fail_next_list(&self, kind: ResourceKind, error: ClusterError) {
        self.state()
            .list_failures
            .entry(kind)
            .or_default()
            .push_back(error);
    }

    /// Make every delete of `identity` fail with `error`.
    pub fn fail_delete(&self, identity: ObjectHash, error: ClusterError) {
        self.state().delete_failures.insert(identity, error);
    }

    /// Cancel `token` once `count` delete calls have been served.
    pub fn cancel_after_deletes(&self, count: usize, token: CancellationToken) {
        self.state().cancel_after_deletes = Some((count, token));
    }

    pub fn contains(&self, identity: &ObjectHash) -> bool {
        self.state()
            .snapshot
            .resources
            .iter()
            .any(|r| &r.hash() == identity)
    }

    pub fn len(&self) -> usize {
        self.state().snapshot.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn calls(&self) -> Vec<ClusterCall> {
        self.state().calls.clone()
    }

    /// Identities of every delete call, in issue order.
    pub fn delete_calls(&self) -> Vec<ObjectHash> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                ClusterCall::Delete { identity, .. } => Some(identity.clone()),
                ClusterCall::List { .. } => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }
}

impl ClusterClient for InMemoryCluster {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn list(
        &self,
        kind: &ResourceKind,
        selector: &LabelSelector,
        namespace: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<LiveResource>, ClusterError> {
        if cancel.is_cancelled() {
            return Err(ClusterError::Cancelled);
        }

        let mut state = self.state();
        state.calls.push(ClusterCall::List {
            kind: kind.clone(),
            namespace: namespace.map(str::to_string),
        });

        if let Some(error) = state
            .list_failures
            .get_mut(kind)
            .and_then(VecDeque::pop_front)
        {
            return Err(error);
        }

        if state.snapshot.unavailable_kinds.contains(kind) {
            return Err(ClusterError::KindNotFound {
                kind: kind.to_string(),
            });
        }

        Ok(state
            .snapshot
            .resources
            .iter()
            .filter(|r| &r.kind == kind)
            .filter(|r| namespace.is_none_or(|ns| r.namespace.as_deref() == Some(ns)))
            .filter(|r| selector.matches(&r.labels))
            .cloned()
            .collect())
    }

    fn delete(
        &self,
        resource: &LiveResource,
        propagation: PropagationPolicy,
        cancel: &CancellationToken,
    ) -> Result<(), ClusterError> {
        if cancel.is_cancelled() {
            return Err(ClusterError::Cancelled);
        }

        let mut state = self.state();
        let identity = resource.hash();
        state.calls.push(ClusterCall::Delete {
            kind: resource.kind.clone(),
            identity: identity.clone(),
            propagation,
        });

        let deletes_served = state
            .calls
            .iter()
            .filter(|c| matches!(c, ClusterCall::Delete { .. }))
            .count();
        if let Some((count, token)) = &state.cancel_after_deletes
            && deletes_served >= *count
        {
            token.cancel();
        }

        if let Some(error) = state.delete_failures.get(&identity) {
            return Err(error.clone());
        }

        let before = state.snapshot.resources.len();
        state.snapshot.resources.retain(|r| {
            !(r.kind == resource.kind && r.namespace == resource.namespace && r.name == resource.name)
        });

        if state.snapshot.resources.len() == before {
            return Err(ClusterError::NotFound {
                resource: identity.to_string(),
            });
        }

        Ok(())
    }
}

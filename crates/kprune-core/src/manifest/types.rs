use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::ResourceCatalog;
use crate::cluster::ObjectHash;

use super::errors::ManifestError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// One rendered object of a component's desired state.
///
/// Only identity fields are read; the rest of the object is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: ManifestMetadata,
}

impl Manifest {
    pub fn new(api_version: &str, kind: &str, namespace: Option<&str>, name: &str) -> Self {
        Self {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            metadata: ManifestMetadata {
                name: name.to_string(),
                namespace: namespace.map(str::to_string),
            },
        }
    }

    /// Identity hash of the object once installed.
    ///
    /// A namespaced object without an explicit namespace lands in
    /// `default_namespace`; kinds the catalog only knows as cluster-scoped
    /// never carry a namespace.
    pub fn hash(&self, default_namespace: &str, catalog: &ResourceCatalog) -> ObjectHash {
        let namespace = if catalog.is_cluster_scoped_kind(&self.kind) {
            ""
        } else {
            self.metadata
                .namespace
                .as_deref()
                .filter(|ns| !ns.is_empty())
                .unwrap_or(default_namespace)
        };
        ObjectHash::new(&self.kind, namespace, &self.metadata.name)
    }
}

/// Identity hashes that must survive a sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedSet {
    hashes: HashSet<ObjectHash>,
}

impl ExpectedSet {
    /// The empty set: every owned resource is a deletion candidate.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_manifests(
        manifests: &[Manifest],
        default_namespace: &str,
        catalog: &ResourceCatalog,
    ) -> Self {
        manifests
            .iter()
            .map(|m| m.hash(default_namespace, catalog))
            .collect()
    }

    pub fn insert(&mut self, hash: ObjectHash) -> bool {
        self.hashes.insert(hash)
    }

    pub fn contains(&self, hash: &ObjectHash) -> bool {
        self.hashes.contains(hash)
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectHash> {
        self.hashes.iter()
    }
}

impl FromIterator<ObjectHash> for ExpectedSet {
    fn from_iter<I: IntoIterator<Item = ObjectHash>>(iter: I) -> Self {
        Self {
            hashes: iter.into_iter().collect(),
        }
    }
}

/// Desired manifests keyed by component name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesiredState {
    pub components: BTreeMap<String, Vec<Manifest>>,
}

impl DesiredState {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path)?;
        let state: DesiredState = serde_json::from_str(&content)?;
        debug!(
            event = "core.manifest.desired_loaded",
            path = %path.display(),
            components = state.components.len()
        );
        Ok(state)
    }

    pub fn with_component(mut self, name: impl Into<String>, manifests: Vec<Manifest>) -> Self {
        self.components.insert(name.into(), manifests);
        self
    }

    /// Component names in sweep order.
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    pub fn expected_set(
        &self,
        component: &str,
        default_namespace: &str,
        catalog: &ResourceCatalog,
    ) -> ExpectedSet {
        self.components
            .get(component)
            .map(|m| ExpectedSet::from_manifests(m, default_namespace, catalog))
            .unwrap_or_default()
    }
}

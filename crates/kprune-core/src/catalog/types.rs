use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::CatalogError;

/// A cluster resource type: `(group, version, kind)`.
///
/// The text form is `group/version/Kind`, or `version/Kind` for the core
/// (empty) group, e.g. `apps/v1/Deployment` and `v1/Service`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceKind {
    group: String,
    version: String,
    kind: String,
}

impl ResourceKind {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The `apiVersion` a manifest of this kind carries.
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.api_version(), self.kind)
    }
}

impl FromStr for ResourceKind {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| CatalogError::InvalidKind {
            spec: s.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = s.trim().split('/').collect();
        let (group, version, kind) = match parts.as_slice() {
            [version, kind] => ("", *version, *kind),
            [group, version, kind] if !group.is_empty() => (*group, *version, *kind),
            _ => return Err(invalid("expected version/Kind or group/version/Kind")),
        };

        if version.is_empty() {
            return Err(invalid("version must not be empty"));
        }
        if kind.is_empty() {
            return Err(invalid("kind must not be empty"));
        }

        Ok(ResourceKind::new(group, version, kind))
    }
}

impl TryFrom<String> for ResourceKind {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResourceKind> for String {
    fn from(kind: ResourceKind) -> Self {
        kind.to_string()
    }
}

/// Whether instances of a kind live inside a namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Namespaced,
    ClusterScoped,
}

/// Ordered lists of the kinds a sweep visits.
///
/// Order is deletion order. Kinds that reference another kind (an
/// autoscaler and its workload, a binding and its role) come before the
/// kind they reference, so a sweep never leaves a dangling reference behind
/// while it is still running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceCatalog {
    namespaced: Vec<ResourceKind>,
    cluster_scoped: Vec<ResourceKind>,
}

impl ResourceCatalog {
    pub fn new(
        namespaced: Vec<ResourceKind>,
        cluster_scoped: Vec<ResourceKind>,
    ) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for kind in namespaced.iter().chain(cluster_scoped.iter()) {
            if !seen.insert(kind) {
                return Err(CatalogError::DuplicateKind {
                    kind: kind.to_string(),
                });
            }
        }

        Ok(Self {
            namespaced,
            cluster_scoped,
        })
    }

    /// Build a catalog from text kind specs, keeping the given order.
    pub fn from_specs(
        namespaced: &[String],
        cluster_scoped: &[String],
    ) -> Result<Self, CatalogError> {
        let parse = |specs: &[String]| {
            specs
                .iter()
                .map(|s| s.parse::<ResourceKind>())
                .collect::<Result<Vec<_>, _>>()
        };
        Self::new(parse(namespaced)?, parse(cluster_scoped)?)
    }

    pub(super) fn from_static(
        namespaced: &[(&str, &str, &str)],
        cluster_scoped: &[(&str, &str, &str)],
    ) -> Self {
        let build = |entries: &[(&str, &str, &str)]| {
            entries
                .iter()
                .map(|(g, v, k)| ResourceKind::new(*g, *v, *k))
                .collect()
        };
        Self {
            namespaced: build(namespaced),
            cluster_scoped: build(cluster_scoped),
        }
    }

    pub fn namespaced(&self) -> &[ResourceKind] {
        &self.namespaced
    }

    pub fn cluster_scoped(&self) -> &[ResourceKind] {
        &self.cluster_scoped
    }

    /// Traverse every kind in deletion order: namespaced kinds first, then
    /// cluster-scoped kinds.
    pub fn iter(&self) -> impl Iterator<Item = (Scope, &ResourceKind)> + '_ {
        self.namespaced
            .iter()
            .map(|k| (Scope::Namespaced, k))
            .chain(self.cluster_scoped.iter().map(|k| (Scope::ClusterScoped, k)))
    }

    pub fn len(&self) -> usize {
        self.namespaced.len() + self.cluster_scoped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a kind name (without group/version) is only known as
    /// cluster-scoped.
    pub fn is_cluster_scoped_kind(&self, kind: &str) -> bool {
        self.cluster_scoped.iter().any(|k| k.kind() == kind)
            && !self.namespaced.iter().any(|k| k.kind() == kind)
    }

    /// Position of a kind in traversal order.
    pub fn position(&self, kind: &ResourceKind) -> Option<usize> {
        self.iter().position(|(_, k)| k == kind)
    }
}

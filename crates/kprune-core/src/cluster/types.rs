use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::ResourceKind;

/// Content-derived identity of an object: `Kind:namespace:name`.
///
/// Group and version are not part of the identity, so the same object
/// served under two API versions hashes the same. Cluster-scoped objects
/// have an empty namespace segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectHash(String);

impl ObjectHash {
    pub fn new(kind: &str, namespace: &str, name: &str) -> Self {
        Self(format!("{}:{}:{}", kind, namespace, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the cluster should treat objects owned by a deleted object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropagationPolicy {
    /// Delete the object now, let the cluster collect dependents afterwards.
    Background,
    Foreground,
    Orphan,
}

/// A resource instance returned by a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveResource {
    pub kind: ResourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub name: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl LiveResource {
    pub fn new(kind: ResourceKind, namespace: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: namespace.map(str::to_string),
            name: name.into(),
            labels: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn hash(&self) -> ObjectHash {
        ObjectHash::new(
            self.kind.kind(),
            self.namespace.as_deref().unwrap_or(""),
            &self.name,
        )
    }

    /// Value of the ownership label, if the resource carries one.
    pub fn owner(&self, owner_key: &str) -> Option<&str> {
        self.labels.get(owner_key).map(String::as_str)
    }
}

//! Per-component record of the objects the reconciler believes it owns.
//!
//! The reconciler records objects as it applies them; a sweep removes an
//! entry only after the cluster confirmed the deletion.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::cluster::ObjectHash;

#[derive(Debug, Default)]
pub struct ObjectCache {
    owned: Mutex<HashMap<String, BTreeSet<ObjectHash>>>,
}

impl ObjectCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn owned(&self) -> MutexGuard<'_, HashMap<String, BTreeSet<ObjectHash>>> {
        self.owned.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record(&self, component: &str, hash: ObjectHash) {
        self.owned()
            .entry(component.to_string())
            .or_default()
            .insert(hash);
    }

    /// Forget `hash` for `component`. Returns whether it was cached.
    pub fn remove(&self, component: &str, hash: &ObjectHash) -> bool {
        let mut owned = self.owned();
        let Some(hashes) = owned.get_mut(component) else {
            return false;
        };
        let removed = hashes.remove(hash);
        if hashes.is_empty() {
            owned.remove(component);
        }
        if removed {
            debug!(
                event = "core.cache.object_removed",
                component = component,
                object = %hash
            );
        }
        removed
    }

    pub fn contains(&self, component: &str, hash: &ObjectHash) -> bool {
        self.owned()
            .get(component)
            .is_some_and(|hashes| hashes.contains(hash))
    }

    /// Objects cached for `component`, sorted.
    pub fn objects_for(&self, component: &str) -> Vec<ObjectHash> {
        self.owned()
            .get(component)
            .map(|hashes| hashes.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len_for(&self, component: &str) -> usize {
        self.owned().get(component).map_or(0, BTreeSet::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(name: &str) -> ObjectHash {
        ObjectHash::new("Deployment", "ns", name)
    }

    #[test]
    fn record_and_remove() {
        let cache = ObjectCache::new();
        cache.record("gateway", hash("a"));
        cache.record("gateway", hash("b"));
        assert_eq!(cache.len_for("gateway"), 2);

        assert!(cache.remove("gateway", &hash("a")));
        assert!(!cache.contains("gateway", &hash("a")));
        assert!(cache.contains("gateway", &hash("b")));
        assert!(!cache.remove("gateway", &hash("a")));
    }

    #[test]
    fn components_are_isolated() {
        let cache = ObjectCache::new();
        cache.record("gateway", hash("a"));
        assert!(!cache.remove("pilot", &hash("a")));
        assert!(cache.contains("gateway", &hash("a")));
        assert_eq!(cache.len_for("pilot"), 0);
    }

    #[test]
    fn objects_for_is_sorted() {
        let cache = ObjectCache::new();
        cache.record("gateway", hash("b"));
        cache.record("gateway", hash("a"));
        assert_eq!(cache.objects_for("gateway"), vec![hash("a"), hash("b")]);
    }

    #[test]
    fn empty_component_entry_is_dropped() {
        let cache = ObjectCache::new();
        cache.record("gateway", hash("a"));
        cache.remove("gateway", &hash("a"));
        assert!(cache.objects_for("gateway").is_empty());
    }
}

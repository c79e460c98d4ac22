use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::ObjectCache;
use crate::catalog::{ResourceCatalog, Scope};
use crate::cluster::{ClusterClient, ClusterError, LiveResource, PropagationPolicy};
use crate::labels::{LabelError, OwnershipLabeler};
use crate::manifest::{DesiredState, ExpectedSet};

use super::decision::classify;
use super::enumerate::{Listing, ResourceEnumerator};
use super::errors::{ErrorAggregate, SweepFailure};
use super::types::{Component, Decision, PruneOptions, PruneOutcome, PruneReport, PruneSummary};

/// Removes owned resources that are no longer part of the desired state.
///
/// Sweeps run sequentially: kinds in catalog order, resources in the order
/// the cluster lists them. Per-resource failures never stop a sweep.
pub struct Pruner {
    client: Arc<dyn ClusterClient>,
    catalog: Arc<ResourceCatalog>,
    labeler: OwnershipLabeler,
    options: PruneOptions,
    cache: Arc<ObjectCache>,
}

/// How a single delete request ended.
enum DeleteResult {
    Deleted,
    Failed(ClusterError),
    Cancelled,
}

impl Pruner {
    pub fn new(
        client: Arc<dyn ClusterClient>,
        catalog: Arc<ResourceCatalog>,
        labeler: OwnershipLabeler,
        options: PruneOptions,
    ) -> Self {
        Self {
            client,
            catalog,
            labeler,
            options,
            cache: Arc::new(ObjectCache::new()),
        }
    }

    /// Share an owned-object cache with the reconciler that fills it.
    pub fn with_cache(mut self, cache: Arc<ObjectCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn options(&self) -> &PruneOptions {
        &self.options
    }

    pub fn catalog(&self) -> &ResourceCatalog {
        &self.catalog
    }

    pub fn cache(&self) -> &ObjectCache {
        &self.cache
    }

    /// Prune every component of the desired state.
    ///
    /// A component whose sweep fails, even fatally, does not stop the next
    /// one; all failures are merged into the summary.
    pub fn prune(&self, desired: &DesiredState, cancel: &CancellationToken) -> PruneSummary {
        info!(
            event = "core.prune.run_started",
            components = desired.components.len(),
            dry_run = self.options.dry_run
        );

        let mut summary = PruneSummary::default();
        for name in desired.component_names() {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let expected = desired.expected_set(name, &self.options.namespace, &self.catalog);
            match self.prune_unlisted_resources(&expected, name, cancel) {
                Ok(outcome) => summary.merge(outcome),
                Err(source) => summary.errors.push(SweepFailure::Label {
                    component: name.to_string(),
                    source,
                }),
            }
        }

        info!(
            event = "core.prune.run_completed",
            deleted = summary.total_deleted(),
            dry_run_skipped = summary.total_dry_run_skipped(),
            failures = summary.errors.len(),
            cancelled = summary.cancelled
        );
        summary
    }

    /// Delete every resource owned by `component`.
    pub fn delete_component(
        &self,
        component: &str,
        cancel: &CancellationToken,
    ) -> Result<PruneOutcome, LabelError> {
        self.prune_unlisted_resources(&ExpectedSet::new(), component, cancel)
    }

    /// Delete every resource owned by `component` whose identity is not in
    /// `excluded`.
    ///
    /// Fails only when the ownership selector cannot be computed, before
    /// anything is listed. Delete failures are collected in the outcome.
    pub fn prune_unlisted_resources(
        &self,
        excluded: &ExpectedSet,
        component: &str,
        cancel: &CancellationToken,
    ) -> Result<PruneOutcome, LabelError> {
        let selector = self.labeler.selector_for(component)?;
        let enumerator = ResourceEnumerator::new(
            self.client.as_ref(),
            self.options.list_retries,
            self.options.list_retry_backoff,
        );

        let mut report = PruneReport::new(
            Component::new(component, self.options.namespace.clone()),
            self.options.dry_run,
        );
        let mut errors = ErrorAggregate::new();

        info!(
            event = "core.prune.sweep_started",
            component = component,
            expected = excluded.len(),
            kinds = self.catalog.len(),
            dry_run = self.options.dry_run,
            backend = self.client.name()
        );

        'kinds: for (scope, kind) in self.catalog.iter() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let namespace = match scope {
                Scope::Namespaced => Some(self.options.namespace.as_str()),
                Scope::ClusterScoped => None,
            };

            let resources = match enumerator.list_owned(kind, &selector, namespace, cancel) {
                Listing::Found(resources) => resources,
                Listing::Skipped(skipped) => {
                    report.skipped_kinds.push(skipped);
                    continue;
                }
                Listing::Cancelled => {
                    report.cancelled = true;
                    break;
                }
            };
            report.kinds_swept += 1;

            for resource in resources {
                let identity = resource.hash();

                if classify(&resource, excluded) == Decision::Retain {
                    debug!(
                        event = "core.prune.object_retained",
                        component = component,
                        object = %identity
                    );
                    report.retained.push(identity);
                    continue;
                }

                if cancel.is_cancelled() {
                    report.cancelled = true;
                    break 'kinds;
                }

                if self.options.dry_run {
                    info!(
                        event = "core.prune.dry_run_skipped",
                        component = component,
                        object = %identity,
                        "Not pruning object {} because of dry run.",
                        identity
                    );
                    report.dry_run_skipped.push(identity);
                    continue;
                }

                match self.delete_resource(&resource, component, cancel) {
                    DeleteResult::Deleted => report.deleted.push(identity),
                    DeleteResult::Cancelled => {
                        report.cancelled = true;
                        break 'kinds;
                    }
                    DeleteResult::Failed(source) => {
                        report.failed.push(identity.clone());
                        errors.push(SweepFailure::Deletion {
                            component: component.to_string(),
                            kind: kind.clone(),
                            identity,
                            source,
                        });
                    }
                }
            }
        }

        if report.cancelled {
            warn!(
                event = "core.prune.sweep_cancelled",
                component = component,
                deleted = report.deleted.len(),
                failures = errors.len()
            );
        }

        info!(
            event = "core.prune.sweep_completed",
            component = component,
            retained = report.retained.len(),
            deleted = report.deleted.len(),
            dry_run_skipped = report.dry_run_skipped.len(),
            skipped_kinds = report.skipped_kinds.len(),
            failures = errors.len()
        );

        Ok(PruneOutcome { report, errors })
    }

    fn delete_resource(
        &self,
        resource: &LiveResource,
        component: &str,
        cancel: &CancellationToken,
    ) -> DeleteResult {
        let identity = resource.hash();

        match self
            .client
            .delete(resource, PropagationPolicy::Background, cancel)
        {
            Ok(()) => {
                self.cache.remove(component, &identity);
                info!(
                    event = "core.prune.object_pruned",
                    component = component,
                    object = %identity,
                    "Pruned object {}.",
                    identity
                );
                DeleteResult::Deleted
            }
            Err(ClusterError::NotFound { .. }) => {
                // Already gone counts as deleted
                self.cache.remove(component, &identity);
                debug!(
                    event = "core.prune.object_already_gone",
                    component = component,
                    object = %identity
                );
                DeleteResult::Deleted
            }
            Err(ClusterError::Cancelled) => DeleteResult::Cancelled,
            Err(e) => {
                warn!(
                    event = "core.prune.delete_failed",
                    component = component,
                    object = %identity,
                    error = %e
                );
                DeleteResult::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ResourceKind;
    use crate::cluster::{InMemoryCluster, ObjectHash};

    const OWNER: &str = "install.operator.istio.io/owner-name";

    fn catalog() -> Arc<ResourceCatalog> {
        Arc::new(
            ResourceCatalog::from_specs(
                &["apps/v1/Deployment".to_string(), "v1/Service".to_string()],
                &["rbac.authorization.k8s.io/v1/ClusterRole".to_string()],
            )
            .unwrap(),
        )
    }

    fn pruner(cluster: &Arc<InMemoryCluster>, dry_run: bool) -> Pruner {
        Pruner::new(
            cluster.clone(),
            catalog(),
            OwnershipLabeler::new("install.operator.istio.io"),
            PruneOptions::default()
                .with_namespace("ns")
                .with_dry_run(dry_run),
        )
    }

    fn owned(kind: &str, ns: Option<&str>, name: &str, owner: &str) -> LiveResource {
        LiveResource::new(kind.parse::<ResourceKind>().unwrap(), ns, name).with_label(OWNER, owner)
    }

    #[test]
    fn label_failure_aborts_before_listing() {
        let cluster = Arc::new(InMemoryCluster::new());
        let result = pruner(&cluster, false).delete_component("", &CancellationToken::new());
        assert_eq!(result, Err(LabelError::EmptyComponentName));
        assert!(cluster.calls().is_empty());
    }

    #[test]
    fn cluster_scoped_kinds_are_listed_without_namespace() {
        let cluster = Arc::new(InMemoryCluster::new());
        cluster.insert(owned(
            "rbac.authorization.k8s.io/v1/ClusterRole",
            None,
            "cr",
            "gateway",
        ));

        let outcome = pruner(&cluster, false)
            .delete_component("gateway", &CancellationToken::new())
            .unwrap();
        assert_eq!(
            outcome.report.deleted,
            vec![ObjectHash::new("ClusterRole", "", "cr")]
        );
        assert!(cluster.is_empty());
    }

    #[test]
    fn successful_delete_clears_cache_entry() {
        let cluster = Arc::new(InMemoryCluster::new());
        let doomed = owned("apps/v1/Deployment", Some("ns"), "d", "gateway");
        cluster.insert(doomed.clone());

        let cache = Arc::new(ObjectCache::new());
        cache.record("gateway", doomed.hash());
        cache.record("gateway", ObjectHash::new("Service", "ns", "kept"));

        let pruner = pruner(&cluster, false).with_cache(cache.clone());
        pruner
            .delete_component("gateway", &CancellationToken::new())
            .unwrap();

        assert!(!cache.contains("gateway", &doomed.hash()));
        assert_eq!(cache.len_for("gateway"), 1);
    }

    #[test]
    fn failed_delete_keeps_cache_entry() {
        let cluster = Arc::new(InMemoryCluster::new());
        let stuck = owned("apps/v1/Deployment", Some("ns"), "d", "gateway");
        cluster.insert(stuck.clone());
        cluster.fail_delete(
            stuck.hash(),
            ClusterError::Forbidden {
                message: "denied".to_string(),
            },
        );

        let cache = Arc::new(ObjectCache::new());
        cache.record("gateway", stuck.hash());

        let outcome = pruner(&cluster, false)
            .with_cache(cache.clone())
            .delete_component("gateway", &CancellationToken::new())
            .unwrap();

        assert!(cache.contains("gateway", &stuck.hash()));
        assert_eq!(outcome.report.failed, vec![stuck.hash()]);
        assert_eq!(outcome.errors.len(), 1);
    }

    #[test]
    fn already_deleted_resource_counts_as_deleted() {
        struct VanishingCluster(InMemoryCluster);

        impl ClusterClient for VanishingCluster {
            fn name(&self) -> &'static str {
                "vanishing"
            }

            fn list(
                &self,
                kind: &ResourceKind,
                selector: &crate::labels::LabelSelector,
                namespace: Option<&str>,
                cancel: &CancellationToken,
            ) -> Result<Vec<LiveResource>, ClusterError> {
                self.0.list(kind, selector, namespace, cancel)
            }

            fn delete(
                &self,
                resource: &LiveResource,
                _propagation: PropagationPolicy,
                _cancel: &CancellationToken,
            ) -> Result<(), ClusterError> {
                Err(ClusterError::NotFound {
                    resource: resource.hash().to_string(),
                })
            }
        }

        let inner = InMemoryCluster::new();
        inner.insert(owned("v1/Service", Some("ns"), "s", "gateway"));
        let pruner = Pruner::new(
            Arc::new(VanishingCluster(inner)),
            catalog(),
            OwnershipLabeler::new("install.operator.istio.io"),
            PruneOptions::default().with_namespace("ns"),
        );

        let outcome = pruner
            .delete_component("gateway", &CancellationToken::new())
            .unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.report.deleted.len(), 1);
    }

    #[test]
    fn prune_records_label_failure_and_continues() {
        let cluster = Arc::new(InMemoryCluster::new());
        cluster.insert(owned("v1/Service", Some("ns"), "s", "gateway"));

        let desired = DesiredState::default()
            .with_component("bad name", vec![])
            .with_component("gateway", vec![]);

        let summary = pruner(&cluster, false).prune(&desired, &CancellationToken::new());
        assert_eq!(summary.reports.len(), 1);
        assert_eq!(summary.total_deleted(), 1);
        assert_eq!(summary.errors.len(), 1);
        assert!(matches!(
            summary.errors.iter().next(),
            Some(SweepFailure::Label { component, .. }) if component == "bad name"
        ));
    }

    #[test]
    fn cancelled_prune_skips_remaining_components() {
        let cluster = Arc::new(InMemoryCluster::new());
        let desired = DesiredState::default().with_component("gateway", vec![]);
        let token = CancellationToken::new();
        token.cancel();

        let summary = pruner(&cluster, false).prune(&desired, &token);
        assert!(summary.cancelled);
        assert!(summary.reports.is_empty());
        assert!(summary.is_success());
    }
}

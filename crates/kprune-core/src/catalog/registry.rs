//! The built-in resource catalog.

use std::sync::{Arc, LazyLock};

use tracing::{debug, info};

use kprune_config::CatalogConfig;

use super::errors::CatalogError;
use super::types::ResourceCatalog;

// Deletion order, first to last. Endpoints are never rendered from
// manifests, so they are not listed.
const NAMESPACED: &[(&str, &str, &str)] = &[
    ("autoscaling", "v2beta1", "HorizontalPodAutoscaler"),
    ("policy", "v1beta1", "PodDisruptionBudget"),
    ("apps", "v1", "StatefulSet"),
    ("apps", "v1", "Deployment"),
    ("apps", "v1", "DaemonSet"),
    ("extensions", "v1beta1", "Ingress"),
    ("", "v1", "Service"),
    ("", "v1", "ConfigMap"),
    ("", "v1", "PersistentVolumeClaim"),
    ("", "v1", "Pod"),
    ("", "v1", "Secret"),
    ("", "v1", "ServiceAccount"),
    ("rbac.authorization.k8s.io", "v1beta1", "RoleBinding"),
    ("rbac.authorization.k8s.io", "v1", "RoleBinding"),
    ("rbac.authorization.k8s.io", "v1beta1", "Role"),
    ("rbac.authorization.k8s.io", "v1", "Role"),
    ("config.istio.io", "v1alpha2", "adapter"),
    ("config.istio.io", "v1alpha2", "attributemanifest"),
    ("config.istio.io", "v1alpha2", "handler"),
    ("config.istio.io", "v1alpha2", "instance"),
    ("config.istio.io", "v1alpha2", "HTTPAPISpec"),
    ("config.istio.io", "v1alpha2", "HTTPAPISpecBinding"),
    ("config.istio.io", "v1alpha2", "QuotaSpec"),
    ("config.istio.io", "v1alpha2", "QuotaSpecBinding"),
    ("config.istio.io", "v1alpha2", "rule"),
    ("config.istio.io", "v1alpha2", "template"),
    ("networking.istio.io", "v1alpha3", "DestinationRule"),
    ("networking.istio.io", "v1alpha3", "EnvoyFilter"),
    ("networking.istio.io", "v1alpha3", "Gateway"),
    ("networking.istio.io", "v1alpha3", "ServiceEntry"),
    ("networking.istio.io", "v1alpha3", "Sidecar"),
    ("networking.istio.io", "v1alpha3", "VirtualService"),
    ("rbac.istio.io", "v1alpha1", "ClusterRbacConfig"),
    ("rbac.istio.io", "v1alpha1", "RbacConfig"),
    ("rbac.istio.io", "v1alpha1", "ServiceRole"),
    ("rbac.istio.io", "v1alpha1", "ServiceRoleBinding"),
    ("security.istio.io", "v1beta1", "AuthorizationPolicy"),
    ("security.istio.io", "v1beta1", "RequestAuthentication"),
    ("security.istio.io", "v1beta1", "PeerAuthentication"),
];

// CustomResourceDefinitions are left out: deleting one wipes every user
// object of that type.
const CLUSTER_SCOPED: &[(&str, &str, &str)] = &[
    (
        "admissionregistration.k8s.io",
        "v1beta1",
        "MutatingWebhookConfiguration",
    ),
    (
        "admissionregistration.k8s.io",
        "v1beta1",
        "ValidatingWebhookConfiguration",
    ),
    ("rbac.authorization.k8s.io", "v1", "ClusterRole"),
    ("rbac.authorization.k8s.io", "v1", "ClusterRoleBinding"),
];

/// Process-wide standard catalog, built on first use and never mutated.
static STANDARD: LazyLock<ResourceCatalog> =
    LazyLock::new(|| ResourceCatalog::from_static(NAMESPACED, CLUSTER_SCOPED));

impl ResourceCatalog {
    /// The standard catalog of kinds the reconciler installs.
    pub fn standard() -> &'static ResourceCatalog {
        &STANDARD
    }
}

/// Resolve the catalog a run should use: the configured override if any,
/// otherwise the standard catalog.
pub fn resolve_catalog(
    config: Option<&CatalogConfig>,
) -> Result<Arc<ResourceCatalog>, CatalogError> {
    match config {
        Some(catalog) => {
            let resolved =
                ResourceCatalog::from_specs(&catalog.namespaced, &catalog.cluster_scoped)?;
            info!(
                event = "core.catalog.override_loaded",
                namespaced = resolved.namespaced().len(),
                cluster_scoped = resolved.cluster_scoped().len()
            );
            Ok(Arc::new(resolved))
        }
        None => {
            debug!(
                event = "core.catalog.standard_selected",
                kinds = ResourceCatalog::standard().len()
            );
            Ok(Arc::new(ResourceCatalog::standard().clone()))
        }
    }
}

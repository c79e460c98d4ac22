use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Label domain the reconciler stamps onto every resource it creates.
pub const DEFAULT_METADATA_DOMAIN: &str = "install.operator.istio.io";

/// Namespace components are installed into when nothing else is configured.
pub const DEFAULT_NAMESPACE: &str = "istio-system";

pub const DEFAULT_LIST_RETRIES: u32 = 2;
pub const DEFAULT_LIST_RETRY_BACKOFF_MS: u64 = 200;

/// Upper bound on list retries accepted by validation.
pub const MAX_LIST_RETRIES: u32 = 10;

/// Upper bound on the wait between list attempts accepted by validation.
pub const MAX_LIST_RETRY_BACKOFF_MS: u64 = 30_000;

/// Top-level kprune configuration.
///
/// Every table is optional in the TOML file; missing values fall back to
/// the defaults above.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KpruneConfig {
    pub prune: PruneConfig,
    pub owner: Option<OwnerConfig>,
    pub catalog: Option<CatalogConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PruneConfig {
    /// Log deletion decisions without touching the cluster.
    pub dry_run: bool,
    /// Target namespace for namespaced kinds.
    pub namespace: String,
    /// Domain prefix of the ownership label keys.
    pub metadata_domain: String,
    /// Extra attempts for a listing that failed with a transient error.
    pub list_retries: u32,
    pub list_retry_backoff_ms: u64,
    /// Deadline for a whole run. `None` means no deadline.
    pub timeout_secs: Option<u64>,
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            namespace: DEFAULT_NAMESPACE.to_string(),
            metadata_domain: DEFAULT_METADATA_DOMAIN.to_string(),
            list_retries: DEFAULT_LIST_RETRIES,
            list_retry_backoff_ms: DEFAULT_LIST_RETRY_BACKOFF_MS,
            timeout_secs: None,
        }
    }
}

impl PruneConfig {
    pub fn list_retry_backoff(&self) -> Duration {
        Duration::from_millis(self.list_retry_backoff_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// The custom resource that owns every installed component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerConfig {
    pub name: String,
    pub namespace: String,
}

/// Replacement for the built-in resource catalog.
///
/// Kinds are written as `group/version/Kind`, or `version/Kind` for the
/// core group, and are swept in the order listed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub namespaced: Vec<String>,
    pub cluster_scoped: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prune_config_defaults() {
        let config = PruneConfig::default();
        assert!(!config.dry_run);
        assert_eq!(config.namespace, "istio-system");
        assert_eq!(config.metadata_domain, "install.operator.istio.io");
        assert_eq!(config.list_retries, 2);
        assert_eq!(config.list_retry_backoff(), Duration::from_millis(200));
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: KpruneConfig = toml::from_str(
            r#"
            [prune]
            dry_run = true
            timeout_secs = 30
            "#,
        )
        .unwrap();
        assert!(config.prune.dry_run);
        assert_eq!(config.prune.namespace, DEFAULT_NAMESPACE);
        assert_eq!(config.prune.timeout(), Some(Duration::from_secs(30)));
        assert!(config.owner.is_none());
        assert!(config.catalog.is_none());
    }

    #[test]
    fn test_owner_and_catalog_tables() {
        let config: KpruneConfig = toml::from_str(
            r#"
            [owner]
            name = "installed-state"
            namespace = "istio-system"

            [catalog]
            namespaced = ["apps/v1/Deployment", "v1/Service"]
            "#,
        )
        .unwrap();
        let owner = config.owner.unwrap();
        assert_eq!(owner.name, "installed-state");
        let catalog = config.catalog.unwrap();
        assert_eq!(catalog.namespaced.len(), 2);
        assert!(catalog.cluster_scoped.is_empty());
    }
}

//! Ownership label selectors.
//!
//! Every resource the reconciler creates carries
//! `<domain>/owner-name = <component>`. Listing by that selector is the only
//! way a sweep finds resources, so the selector must be exact.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, error};

use kprune_config::KpruneConfig;

use super::errors::LabelError;
use super::selector::LabelSelector;

const OWNER_NAME: &str = "owner-name";
const OWNING_RESOURCE: &str = "owning-resource";
const OWNING_RESOURCE_NAMESPACE: &str = "owning-resource-namespace";

const MAX_LABEL_VALUE_LEN: usize = 63;
const MAX_DOMAIN_LEN: usize = 253;

static LABEL_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9])?$").expect("label value pattern")
});

static DNS_SUBDOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("dns subdomain pattern")
});

/// The custom resource every component is installed on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwningResource {
    pub name: String,
    pub namespace: String,
}

/// Derives the label selector that scopes lookups to one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipLabeler {
    domain: String,
    owner: Option<OwningResource>,
}

impl OwnershipLabeler {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            owner: None,
        }
    }

    pub fn with_owner(mut self, name: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.owner = Some(OwningResource {
            name: name.into(),
            namespace: namespace.into(),
        });
        self
    }

    pub fn from_config(config: &KpruneConfig) -> Self {
        let labeler = Self::new(config.prune.metadata_domain.clone());
        match &config.owner {
            Some(owner) => labeler.with_owner(owner.name.clone(), owner.namespace.clone()),
            None => labeler,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Key of the label holding the owning component's name.
    pub fn owner_name_key(&self) -> String {
        self.key(OWNER_NAME)
    }

    fn key(&self, name: &str) -> String {
        format!("{}/{}", self.domain, name)
    }

    /// Build the selector for `component`.
    pub fn selector_for(&self, component: &str) -> Result<LabelSelector, LabelError> {
        let result = self.build_selector(component);
        match &result {
            Ok(selector) => debug!(
                event = "core.labels.selector_computed",
                component = component,
                selector = %selector
            ),
            Err(e) => error!(
                event = "core.labels.selector_failed",
                component = component,
                error = %e
            ),
        }
        result
    }

    fn build_selector(&self, component: &str) -> Result<LabelSelector, LabelError> {
        if component.is_empty() {
            return Err(LabelError::EmptyComponentName);
        }

        if self.domain.len() > MAX_DOMAIN_LEN || !DNS_SUBDOMAIN.is_match(&self.domain) {
            return Err(LabelError::InvalidDomain {
                domain: self.domain.clone(),
            });
        }

        let owner_key = self.owner_name_key();
        validate_label_value(&owner_key, component)?;
        let mut selector = LabelSelector::new().with(owner_key, component);

        if let Some(owner) = &self.owner {
            if owner.name.is_empty() {
                return Err(LabelError::IncompleteOwner { missing: "name" });
            }
            if owner.namespace.is_empty() {
                return Err(LabelError::IncompleteOwner {
                    missing: "namespace",
                });
            }

            let name_key = self.key(OWNING_RESOURCE);
            let namespace_key = self.key(OWNING_RESOURCE_NAMESPACE);
            validate_label_value(&name_key, &owner.name)?;
            validate_label_value(&namespace_key, &owner.namespace)?;
            selector = selector
                .with(name_key, owner.name.clone())
                .with(namespace_key, owner.namespace.clone());
        }

        Ok(selector)
    }
}

fn validate_label_value(key: &str, value: &str) -> Result<(), LabelError> {
    let invalid = |reason: &str| LabelError::InvalidLabelValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };

    if value.len() > MAX_LABEL_VALUE_LEN {
        return Err(invalid("must be at most 63 characters"));
    }
    if !LABEL_VALUE.is_match(value) {
        return Err(invalid(
            "must start and end with an alphanumeric character and contain only [-_.A-Za-z0-9]",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labeler() -> OwnershipLabeler {
        OwnershipLabeler::new("install.operator.istio.io")
    }

    #[test]
    fn selector_scopes_by_owner_name() {
        let selector = labeler().selector_for("gateway").unwrap();
        assert_eq!(
            selector.get("install.operator.istio.io/owner-name"),
            Some("gateway")
        );
        assert_eq!(selector.iter().count(), 1);
    }

    #[test]
    fn selector_includes_owning_resource() {
        let selector = labeler()
            .with_owner("installed-state", "istio-system")
            .selector_for("Pilot")
            .unwrap();
        assert_eq!(
            selector.get("install.operator.istio.io/owning-resource"),
            Some("installed-state")
        );
        assert_eq!(
            selector.get("install.operator.istio.io/owning-resource-namespace"),
            Some("istio-system")
        );
        assert_eq!(selector.iter().count(), 3);
    }

    #[test]
    fn empty_component_is_rejected() {
        assert_eq!(
            labeler().selector_for(""),
            Err(LabelError::EmptyComponentName)
        );
    }

    #[test]
    fn invalid_component_values_are_rejected() {
        let too_long = "a".repeat(64);
        for name in ["-gateway", "gateway-", "gate way", "gate/way", too_long.as_str()] {
            assert!(
                matches!(
                    labeler().selector_for(name),
                    Err(LabelError::InvalidLabelValue { .. })
                ),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn valid_component_values_are_accepted() {
        let max = "a".repeat(63);
        for name in ["g", "Pilot", "ingress_gateways", "egress.gateway-1", max.as_str()] {
            assert!(labeler().selector_for(name).is_ok(), "{name} should be accepted");
        }
    }

    #[test]
    fn invalid_domain_is_rejected() {
        let result = OwnershipLabeler::new("Not_A_Domain").selector_for("gateway");
        assert!(matches!(result, Err(LabelError::InvalidDomain { .. })));
    }

    #[test]
    fn half_configured_owner_is_rejected() {
        let result = labeler().with_owner("installed-state", "").selector_for("gateway");
        assert_eq!(
            result,
            Err(LabelError::IncompleteOwner {
                missing: "namespace"
            })
        );
    }

    #[test]
    fn from_config_uses_domain_and_owner() {
        let mut config = KpruneConfig::default();
        config.prune.metadata_domain = "example.com".to_string();
        config.owner = Some(kprune_config::OwnerConfig {
            name: "cr".to_string(),
            namespace: "ns".to_string(),
        });
        let labeler = OwnershipLabeler::from_config(&config);
        assert_eq!(labeler.owner_name_key(), "example.com/owner-name");
        let selector = labeler.selector_for("gateway").unwrap();
        assert_eq!(selector.get("example.com/owning-resource"), Some("cr"));
    }
}

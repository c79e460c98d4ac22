use std::time::Duration;

use serde::Serialize;

use kprune_config::{DEFAULT_NAMESPACE, PruneConfig};

use crate::catalog::ResourceKind;
use crate::cluster::ObjectHash;

use super::errors::{ErrorAggregate, PruneError};

/// Knobs of a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneOptions {
    /// Log deletion decisions without issuing deletes.
    pub dry_run: bool,
    /// Namespace listed for namespaced kinds.
    pub namespace: String,
    /// Extra attempts after a transient list failure.
    pub list_retries: u32,
    pub list_retry_backoff: Duration,
}

impl Default for PruneOptions {
    fn default() -> Self {
        Self::from_config(&PruneConfig::default())
    }
}

impl PruneOptions {
    pub fn from_config(config: &PruneConfig) -> Self {
        Self {
            dry_run: config.dry_run,
            namespace: config.namespace.clone(),
            list_retries: config.list_retries,
            list_retry_backoff: config.list_retry_backoff(),
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }
}

/// A named group of resources managed together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Component {
    pub name: String,
    pub namespace: String,
}

impl Component {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

impl Default for Component {
    fn default() -> Self {
        Self::new("", DEFAULT_NAMESPACE)
    }
}

/// What a sweep does with one live resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Retain,
    Delete,
}

/// A kind whose listing failed softly and was left out of the sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedKind {
    pub kind: ResourceKind,
    pub reason: String,
    pub attempts: u32,
}

/// What one component's sweep saw and did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    pub component: Component,
    pub dry_run: bool,
    /// Kinds successfully listed.
    pub kinds_swept: usize,
    pub retained: Vec<ObjectHash>,
    pub deleted: Vec<ObjectHash>,
    pub dry_run_skipped: Vec<ObjectHash>,
    pub failed: Vec<ObjectHash>,
    pub skipped_kinds: Vec<SkippedKind>,
    /// The sweep stopped early because its cancellation token fired.
    pub cancelled: bool,
}

impl PruneReport {
    pub fn new(component: Component, dry_run: bool) -> Self {
        Self {
            component,
            dry_run,
            ..Default::default()
        }
    }
}

/// Result of a sweep that got past label computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneOutcome {
    pub report: PruneReport,
    pub errors: ErrorAggregate,
}

impl PruneOutcome {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<PruneReport, PruneError> {
        self.errors.into_result()?;
        Ok(self.report)
    }
}

/// Merged result of sweeping several components.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneSummary {
    pub reports: Vec<PruneReport>,
    pub errors: ErrorAggregate,
    pub cancelled: bool,
}

impl PruneSummary {
    pub fn merge(&mut self, outcome: PruneOutcome) {
        self.cancelled |= outcome.report.cancelled;
        self.reports.push(outcome.report);
        self.errors.merge(outcome.errors);
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn total_deleted(&self) -> usize {
        self.reports.iter().map(|r| r.deleted.len()).sum()
    }

    pub fn total_dry_run_skipped(&self) -> usize {
        self.reports.iter().map(|r| r.dry_run_skipped.len()).sum()
    }

    pub fn into_result(self) -> Result<Vec<PruneReport>, PruneError> {
        self.errors.into_result()?;
        Ok(self.reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ClusterError;
    use crate::prune::errors::SweepFailure;

    #[test]
    fn options_follow_config() {
        let config = PruneConfig {
            dry_run: true,
            namespace: "mesh".to_string(),
            list_retries: 5,
            list_retry_backoff_ms: 10,
            ..Default::default()
        };
        let options = PruneOptions::from_config(&config);
        assert!(options.dry_run);
        assert_eq!(options.namespace, "mesh");
        assert_eq!(options.list_retries, 5);
        assert_eq!(options.list_retry_backoff, Duration::from_millis(10));
    }

    #[test]
    fn outcome_with_failures_is_error() {
        let mut outcome = PruneOutcome {
            report: PruneReport::new(Component::new("gateway", "ns"), false),
            errors: ErrorAggregate::new(),
        };
        assert!(outcome.is_success());
        outcome.errors.push(SweepFailure::Deletion {
            component: "gateway".to_string(),
            kind: ResourceKind::new("", "v1", "Service"),
            identity: ObjectHash::new("Service", "ns", "s"),
            source: ClusterError::Transport {
                message: "reset".to_string(),
            },
        });
        assert!(matches!(
            outcome.into_result(),
            Err(PruneError::Aggregate(_))
        ));
    }

    #[test]
    fn summary_merges_reports_and_errors() {
        let mut summary = PruneSummary::default();

        let mut first = PruneReport::new(Component::new("a", "ns"), false);
        first.deleted.push(ObjectHash::new("Service", "ns", "s1"));
        summary.merge(PruneOutcome {
            report: first,
            errors: ErrorAggregate::new(),
        });

        let mut second = PruneReport::new(Component::new("b", "ns"), false);
        second.deleted.push(ObjectHash::new("Service", "ns", "s2"));
        second.cancelled = true;
        summary.merge(PruneOutcome {
            report: second,
            errors: ErrorAggregate::from_iter([SweepFailure::Label {
                component: "b".to_string(),
                source: crate::labels::LabelError::EmptyComponentName,
            }]),
        });

        assert_eq!(summary.reports.len(), 2);
        assert_eq!(summary.total_deleted(), 2);
        assert!(summary.cancelled);
        assert!(!summary.is_success());
    }
}

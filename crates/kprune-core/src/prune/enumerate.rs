//! Ownership-scoped listing of live resources.
//!
//! Listing failures never abort a sweep. A kind the cluster does not serve
//! is skipped at once; transient failures are retried first and skipped
//! when they persist.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::catalog::ResourceKind;
use crate::cluster::{ClusterClient, ClusterError, LiveResource};
use crate::labels::LabelSelector;

use super::types::SkippedKind;

/// Longest uninterrupted sleep while waiting between list attempts.
const BACKOFF_SLICE: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    Found(Vec<LiveResource>),
    Skipped(SkippedKind),
    Cancelled,
}

pub struct ResourceEnumerator<'a> {
    client: &'a dyn ClusterClient,
    retries: u32,
    backoff: Duration,
}

impl<'a> ResourceEnumerator<'a> {
    pub fn new(client: &'a dyn ClusterClient, retries: u32, backoff: Duration) -> Self {
        Self {
            client,
            retries,
            backoff,
        }
    }

    /// List resources of `kind` owned under `selector`.
    ///
    /// `namespace` is `None` for cluster-scoped kinds.
    pub fn list_owned(
        &self,
        kind: &ResourceKind,
        selector: &LabelSelector,
        namespace: Option<&str>,
        cancel: &CancellationToken,
    ) -> Listing {
        let mut attempts = 0;

        loop {
            if cancel.is_cancelled() {
                return Listing::Cancelled;
            }
            attempts += 1;

            let error = match self.client.list(kind, selector, namespace, cancel) {
                Ok(resources) => return Listing::Found(self.keep_owned(kind, selector, resources)),
                Err(ClusterError::Cancelled) => return Listing::Cancelled,
                Err(error) => error,
            };

            if error.is_transient() && attempts <= self.retries {
                debug!(
                    event = "core.prune.list_retrying",
                    kind = %kind,
                    attempt = attempts,
                    error = %error
                );
                if !self.wait_backoff(cancel) {
                    return Listing::Cancelled;
                }
                continue;
            }

            warn!(
                event = "core.prune.kind_skipped",
                kind = %kind,
                attempts = attempts,
                error = %error,
                "retrieving resources to prune type {}: {}",
                kind,
                error
            );
            return Listing::Skipped(SkippedKind {
                kind: kind.clone(),
                reason: error.to_string(),
                attempts,
            });
        }
    }

    /// Sleep for the backoff in slices. Returns `false` if `cancel` fired.
    fn wait_backoff(&self, cancel: &CancellationToken) -> bool {
        let deadline = Instant::now() + self.backoff;
        loop {
            if cancel.is_cancelled() {
                return false;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return true;
            }
            std::thread::sleep(remaining.min(BACKOFF_SLICE));
        }
    }

    /// Drop anything the backend returned that the selector does not match.
    fn keep_owned(
        &self,
        kind: &ResourceKind,
        selector: &LabelSelector,
        resources: Vec<LiveResource>,
    ) -> Vec<LiveResource> {
        let total = resources.len();
        let owned: Vec<LiveResource> = resources
            .into_iter()
            .filter(|r| {
                let matches = selector.matches(&r.labels);
                if !matches {
                    warn!(
                        event = "core.prune.foreign_resource_ignored",
                        kind = %kind,
                        object = %r.hash(),
                        backend = self.client.name()
                    );
                }
                matches
            })
            .collect();

        debug!(
            event = "core.prune.kind_listed",
            kind = %kind,
            listed = total,
            owned = owned.len()
        );
        owned
    }
}

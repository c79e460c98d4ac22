use serde::Serialize;

use kprune_core::PruneReport;
use kprune_core::catalog::ResourceKind;

/// Result of a sweep command for JSON output.
#[derive(Serialize)]
pub struct SweepOutput<'a> {
    pub dry_run: bool,
    pub cancelled: bool,
    pub reports: &'a [PruneReport],
    pub errors: Vec<String>,
}

/// The active catalog for JSON output.
#[derive(Serialize)]
pub struct CatalogOutput<'a> {
    pub namespaced: &'a [ResourceKind],
    pub cluster_scoped: &'a [ResourceKind],
}

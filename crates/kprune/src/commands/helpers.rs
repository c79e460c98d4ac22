use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::ArgMatches;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use kprune_config::{KpruneConfig, load_hierarchy, loading::validate};
use kprune_core::OwnershipLabeler;
use kprune_core::catalog::resolve_catalog;
use kprune_core::cluster::{ClusterClient, ClusterSnapshot, InMemoryCluster};
use kprune_core::events;
use kprune_core::prune::{PruneOptions, PruneReport, PruneSummary, Pruner};

use super::json_types::SweepOutput;
use crate::shutdown;

/// Load the layered config, reporting failures the way every command does.
pub(crate) fn load_config(
    config_path: Option<&str>,
) -> Result<KpruneConfig, Box<dyn std::error::Error>> {
    match load_hierarchy(config_path.map(Path::new)) {
        Ok(config) => Ok(config),
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            error!(event = "cli.config_load_failed", error = %e);
            events::log_app_error(&e);
            Err(e.into())
        }
    }
}

/// Load the config and apply the sweep flags on top of it.
pub(crate) fn load_sweep_config(
    matches: &ArgMatches,
    config_path: Option<&str>,
) -> Result<KpruneConfig, Box<dyn std::error::Error>> {
    let mut config = load_config(config_path)?;
    apply_sweep_flags(&mut config, matches);

    if let Err(e) = validate(&config) {
        eprintln!("Invalid options: {}", e);
        error!(event = "cli.config_invalid", error = %e);
        events::log_app_error(&e);
        return Err(e.into());
    }

    Ok(config)
}

fn apply_sweep_flags(config: &mut KpruneConfig, matches: &ArgMatches) {
    if matches.get_flag("dry-run") {
        config.prune.dry_run = true;
    }
    if let Some(namespace) = matches.get_one::<String>("namespace") {
        config.prune.namespace = namespace.clone();
    }
    if let Some(secs) = matches.get_one::<u64>("timeout") {
        config.prune.timeout_secs = Some(*secs);
    }
}

/// Where a sweep reads and deletes resources.
pub(crate) enum Backend {
    /// A JSON snapshot, written back after a real run.
    Snapshot {
        path: PathBuf,
        cluster: Arc<InMemoryCluster>,
    },
    #[cfg(feature = "kube")]
    Kube(Arc<kprune_core::cluster::KubeCluster>),
}

impl Backend {
    pub(crate) fn client(&self) -> Arc<dyn ClusterClient> {
        match self {
            Backend::Snapshot { cluster, .. } => cluster.clone() as Arc<dyn ClusterClient>,
            #[cfg(feature = "kube")]
            Backend::Kube(cluster) => cluster.clone() as Arc<dyn ClusterClient>,
        }
    }

    /// Write the snapshot back unless nothing could have changed.
    fn persist(&self, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
        match self {
            Backend::Snapshot { path, cluster } => {
                if dry_run {
                    return Ok(());
                }
                if let Err(e) = cluster.snapshot().save(path) {
                    eprintln!(
                        "Failed to write cluster state '{}': {}",
                        path.display(),
                        e
                    );
                    error!(event = "cli.snapshot_save_failed", error = %e);
                    events::log_app_error(&e);
                    return Err(e.into());
                }
                Ok(())
            }
            #[cfg(feature = "kube")]
            Backend::Kube(_) => Ok(()),
        }
    }
}

pub(crate) async fn open_backend(
    matches: &ArgMatches,
) -> Result<Backend, Box<dyn std::error::Error>> {
    if matches.get_flag("kube") {
        return open_kube_backend().await;
    }

    let path = matches
        .get_one::<String>("cluster-state")
        .map(PathBuf::from)
        .ok_or("Either --cluster-state or --kube is required")?;

    match ClusterSnapshot::load(&path) {
        Ok(snapshot) => {
            info!(
                event = "cli.snapshot_loaded",
                path = %path.display(),
                resources = snapshot.resources.len()
            );
            Ok(Backend::Snapshot {
                path,
                cluster: Arc::new(InMemoryCluster::from_snapshot(snapshot)),
            })
        }
        Err(e) => {
            eprintln!("Failed to load cluster state '{}': {}", path.display(), e);
            error!(event = "cli.snapshot_load_failed", error = %e);
            events::log_app_error(&e);
            Err(e.into())
        }
    }
}

#[cfg(feature = "kube")]
async fn open_kube_backend() -> Result<Backend, Box<dyn std::error::Error>> {
    match kprune_core::cluster::KubeCluster::connect().await {
        Ok(cluster) => Ok(Backend::Kube(Arc::new(cluster))),
        Err(e) => {
            eprintln!("Failed to connect to cluster: {}", e);
            error!(event = "cli.kube_connect_failed", error = %e);
            events::log_app_error(&e);
            Err(e.into())
        }
    }
}

#[cfg(not(feature = "kube"))]
async fn open_kube_backend() -> Result<Backend, Box<dyn std::error::Error>> {
    error!(event = "cli.kube_unsupported");
    Err("kprune was built without Kubernetes support".into())
}

pub(crate) fn build_pruner(
    config: &KpruneConfig,
    client: Arc<dyn ClusterClient>,
) -> Result<Pruner, Box<dyn std::error::Error>> {
    let catalog = match resolve_catalog(config.catalog.as_ref()) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("Invalid resource catalog: {}", e);
            error!(event = "cli.catalog_failed", error = %e);
            events::log_app_error(&e);
            return Err(e.into());
        }
    };

    Ok(Pruner::new(
        client,
        catalog,
        OwnershipLabeler::from_config(config),
        PruneOptions::from_config(&config.prune),
    ))
}

/// Run a blocking sweep while signals and the deadline can cancel it.
pub(crate) async fn run_sweep<T, F>(
    timeout: Option<Duration>,
    sweep: F,
) -> Result<T, Box<dyn std::error::Error>>
where
    T: Send + 'static,
    F: FnOnce(CancellationToken) -> T + Send + 'static,
{
    let token = CancellationToken::new();

    let signals = tokio::spawn(shutdown::wait_for_shutdown_signal(token.clone()));
    let deadline = timeout.map(|t| tokio::spawn(shutdown::cancel_after(t, token.clone())));

    let sweep_token = token.clone();
    let result = tokio::task::spawn_blocking(move || sweep(sweep_token)).await;

    signals.abort();
    if let Some(deadline) = deadline {
        deadline.abort();
    }

    if token.is_cancelled() {
        events::log_app_shutdown();
    }

    Ok(result?)
}

/// Persist, print and turn failures into a non-zero exit.
pub(crate) fn finish_sweep(
    backend: &Backend,
    config: &KpruneConfig,
    summary: PruneSummary,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let dry_run = config.prune.dry_run;
    backend.persist(dry_run)?;

    if json_output {
        let output = SweepOutput {
            dry_run,
            cancelled: summary.cancelled,
            reports: &summary.reports,
            errors: summary.errors.iter().map(ToString::to_string).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_summary(&summary);
    }

    if summary.cancelled {
        warn!(event = "cli.sweep_cancelled");
        eprintln!("Sweep cancelled before completion.");
    }

    if let Err(e) = summary.into_result() {
        error!(event = "cli.sweep_failed", error = %e);
        events::log_app_error(&e);
        return Err(e.into());
    }

    Ok(())
}

fn print_summary(summary: &PruneSummary) {
    for report in &summary.reports {
        print_report(report);
    }

    if !summary.errors.is_empty() {
        eprintln!("Failures: {}", summary.errors.len());
        for failure in summary.errors.iter() {
            eprintln!("  - {}", failure);
        }
    }
}

fn print_report(report: &PruneReport) {
    let mode = if report.dry_run { " (dry run)" } else { "" };
    println!(
        "Component '{}' in namespace '{}'{}:",
        report.component.name, report.component.namespace, mode
    );

    if report.deleted.is_empty() && report.dry_run_skipped.is_empty() {
        println!("  Nothing to prune.");
    }

    if !report.deleted.is_empty() {
        println!("  Deleted: {}", report.deleted.len());
        for identity in &report.deleted {
            println!("    - {}", identity);
        }
    }

    if !report.dry_run_skipped.is_empty() {
        println!("  Would delete: {}", report.dry_run_skipped.len());
        for identity in &report.dry_run_skipped {
            println!("    - {}", identity);
        }
    }

    println!("  Retained: {}", report.retained.len());

    if !report.skipped_kinds.is_empty() {
        eprintln!("  Kinds skipped: {}", report.skipped_kinds.len());
        for skipped in &report.skipped_kinds {
            eprintln!("    - {} ({})", skipped.kind, skipped.reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::build_cli;

    fn sweep_matches(args: &[&str]) -> ArgMatches {
        let mut argv = vec!["kprune", "delete", "gateway", "--cluster-state", "c.json"];
        argv.extend_from_slice(args);
        build_cli()
            .try_get_matches_from(argv)
            .unwrap()
            .subcommand_matches("delete")
            .unwrap()
            .clone()
    }

    #[test]
    fn test_sweep_flags_override_config() {
        let mut config = KpruneConfig::default();
        let matches = sweep_matches(&["--dry-run", "--namespace", "mesh", "--timeout", "9"]);
        apply_sweep_flags(&mut config, &matches);

        assert!(config.prune.dry_run);
        assert_eq!(config.prune.namespace, "mesh");
        assert_eq!(config.prune.timeout(), Some(Duration::from_secs(9)));
    }

    #[test]
    fn test_absent_flags_keep_config() {
        let mut config = KpruneConfig::default();
        config.prune.dry_run = true;
        config.prune.namespace = "from-config".to_string();
        apply_sweep_flags(&mut config, &sweep_matches(&[]));

        assert!(config.prune.dry_run);
        assert_eq!(config.prune.namespace, "from-config");
        assert_eq!(config.prune.timeout_secs, None);
    }

    #[tokio::test]
    async fn test_run_sweep_returns_closure_result() {
        let value = run_sweep(None, |token| !token.is_cancelled())
            .await
            .unwrap();
        assert!(value);
    }

    #[tokio::test]
    async fn test_run_sweep_deadline_cancels() {
        let cancelled = run_sweep(Some(Duration::from_millis(5)), |token| {
            let started = std::time::Instant::now();
            while !token.is_cancelled() && started.elapsed() < Duration::from_secs(5) {
                std::thread::sleep(Duration::from_millis(1));
            }
            token.is_cancelled()
        })
        .await
        .unwrap();
        assert!(cancelled);
    }

    #[test]
    fn test_snapshot_backend_is_written_back() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cluster.json");
        ClusterSnapshot::default().save(&path).unwrap();

        let cluster = Arc::new(InMemoryCluster::new());
        cluster.insert(kprune_core::LiveResource::new(
            kprune_core::ResourceKind::new("", "v1", "Service"),
            Some("ns"),
            "s",
        ));
        let backend = Backend::Snapshot {
            path: path.clone(),
            cluster,
        };

        backend.persist(true).unwrap();
        assert!(ClusterSnapshot::load(&path).unwrap().resources.is_empty());

        backend.persist(false).unwrap();
        assert_eq!(ClusterSnapshot::load(&path).unwrap().resources.len(), 1);
    }
}

use std::path::PathBuf;

use clap::ArgMatches;
use tracing::{error, info};

use kprune_core::events;
use kprune_core::manifest::DesiredState;

use super::helpers::{build_pruner, finish_sweep, load_sweep_config, open_backend, run_sweep};

pub(crate) async fn handle_prune_command(
    matches: &ArgMatches,
    config_path: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let desired_path = matches
        .get_one::<String>("desired")
        .map(PathBuf::from)
        .ok_or("--desired is required")?;
    let json_output = matches.get_flag("json");

    info!(
        event = "cli.prune_started",
        desired = %desired_path.display(),
        json_output = json_output
    );

    let desired = match DesiredState::load(&desired_path) {
        Ok(desired) => desired,
        Err(e) => {
            eprintln!(
                "Failed to load desired state '{}': {}",
                desired_path.display(),
                e
            );
            error!(event = "cli.prune_failed", error = %e);
            events::log_app_error(&e);
            return Err(e.into());
        }
    };

    let config = load_sweep_config(matches, config_path)?;
    let backend = open_backend(matches).await?;
    let pruner = build_pruner(&config, backend.client())?;
    let timeout = config.prune.timeout();

    let summary = run_sweep(timeout, move |cancel| pruner.prune(&desired, &cancel)).await?;

    finish_sweep(&backend, &config, summary, json_output)?;
    info!(event = "cli.prune_completed");
    Ok(())
}

use clap::ArgMatches;
use tracing::{error, info};

use kprune_core::PruneSummary;
use kprune_core::prune::SweepFailure;

use super::helpers::{build_pruner, finish_sweep, load_sweep_config, open_backend, run_sweep};

pub(crate) async fn handle_delete_command(
    matches: &ArgMatches,
    config_path: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let component = matches
        .get_one::<String>("component")
        .cloned()
        .ok_or("Component argument is required")?;
    let json_output = matches.get_flag("json");

    info!(
        event = "cli.delete_started",
        component = component,
        json_output = json_output
    );

    let config = load_sweep_config(matches, config_path)?;
    let backend = open_backend(matches).await?;
    let pruner = build_pruner(&config, backend.client())?;
    let timeout = config.prune.timeout();

    let swept = component.clone();
    let outcome = run_sweep(timeout, move |cancel| {
        pruner.delete_component(&swept, &cancel)
    })
    .await?;

    let mut summary = PruneSummary::default();
    match outcome {
        Ok(outcome) => summary.merge(outcome),
        Err(e) => {
            error!(event = "cli.delete_failed", component = component, error = %e);
            summary.errors.push(SweepFailure::Label {
                component: component.clone(),
                source: e,
            });
        }
    }

    finish_sweep(&backend, &config, summary, json_output)?;
    info!(event = "cli.delete_completed", component = component);
    Ok(())
}

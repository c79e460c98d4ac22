use clap::ArgMatches;
use tracing::{error, info};

use kprune_core::catalog::{Scope, resolve_catalog};
use kprune_core::events;

use super::helpers::load_config;
use super::json_types::CatalogOutput;

pub(crate) fn handle_catalog_command(
    matches: &ArgMatches,
    config_path: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let json_output = matches.get_flag("json");
    info!(event = "cli.catalog_started", json_output = json_output);

    let config = load_config(config_path)?;
    let catalog = match resolve_catalog(config.catalog.as_ref()) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("Invalid resource catalog: {}", e);
            error!(event = "cli.catalog_failed", error = %e);
            events::log_app_error(&e);
            return Err(e.into());
        }
    };

    if json_output {
        let output = CatalogOutput {
            namespaced: catalog.namespaced(),
            cluster_scoped: catalog.cluster_scoped(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Deletion order ({} kinds):", catalog.len());
        for (i, (scope, kind)) in catalog.iter().enumerate() {
            let scope = match scope {
                Scope::Namespaced => "namespaced",
                Scope::ClusterScoped => "cluster",
            };
            println!("  {:>3}. {:<10} {}", i + 1, scope, kind);
        }
    }

    info!(event = "cli.catalog_completed", kinds = catalog.len());
    Ok(())
}

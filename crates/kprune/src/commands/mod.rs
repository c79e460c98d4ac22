use clap::ArgMatches;
use tracing::error;

use kprune_core::events;

mod catalog;
mod delete;
mod helpers;
mod json_types;
mod prune;

pub async fn run_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    events::log_app_startup();

    let config_path = matches.get_one::<String>("config").map(String::as_str);

    match matches.subcommand() {
        Some(("prune", sub_matches)) => prune::handle_prune_command(sub_matches, config_path).await,
        Some(("delete", sub_matches)) => {
            delete::handle_delete_command(sub_matches, config_path).await
        }
        Some(("catalog", sub_matches)) => catalog::handle_catalog_command(sub_matches, config_path),
        _ => {
            error!(event = "cli.command_unknown");
            Err("Unknown command".into())
        }
    }
}

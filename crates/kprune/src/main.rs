use kprune_core::init_logging;

mod app;
mod commands;
mod shutdown;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let app = app::build_cli();
    let matches = app.get_matches();

    // Default (no flag) = quiet mode, -v/--verbose = verbose mode
    let verbose = matches.get_flag("verbose");
    init_logging(!verbose);

    commands::run_command(&matches).await?;

    Ok(())
}

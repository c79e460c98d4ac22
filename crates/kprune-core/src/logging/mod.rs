use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global JSON subscriber on stderr.
///
/// `RUST_LOG` wins when set. Otherwise quiet mode shows warnings and errors
/// only, and verbose mode shows info and above.
pub fn init_logging(quiet: bool) {
    let default_directive = if quiet { "kprune=warn" } else { "kprune=info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(default_directive)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false)
                .with_span_list(false),
        )
        .try_init();
}

fn default_filter(directive: &str) -> String {
    let level = directive.rsplit('=').next().unwrap_or("warn");
    format!("{directive},kprune_core={level},kprune_config={level}")
}

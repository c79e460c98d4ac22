use std::time::Duration;

use tokio_util::sync::CancellationToken;
#[cfg(not(unix))]
use tracing::error;
use tracing::{info, warn};

/// Wait for a shutdown signal (SIGTERM or SIGINT/Ctrl-C).
///
/// When the signal is received, cancels the provided token so the running
/// sweep stops before its next kind or deletion.
pub async fn wait_for_shutdown_signal(token: CancellationToken) -> Result<(), std::io::Error> {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

        tokio::select! {
            _ = ctrl_c => {
                info!(event = "cli.shutdown.signal_received", signal = "SIGINT");
            }
            _ = sigterm.recv() => {
                info!(event = "cli.shutdown.signal_received", signal = "SIGTERM");
            }
        }
    }

    #[cfg(not(unix))]
    {
        match ctrl_c.await {
            Ok(()) => {
                info!(event = "cli.shutdown.signal_received", signal = "SIGINT");
            }
            Err(e) => {
                error!(
                    event = "cli.shutdown.signal_handler_failed",
                    error = %e,
                    "Ctrl-C signal handler failed, cancelling anyway",
                );
            }
        }
    }

    token.cancel();
    Ok(())
}

/// Cancel `token` once `timeout` has elapsed.
pub async fn cancel_after(timeout: Duration, token: CancellationToken) {
    tokio::select! {
        _ = token.cancelled() => {}
        _ = tokio::time::sleep(timeout) => {
            warn!(
                event = "cli.shutdown.timeout_elapsed",
                timeout_secs = timeout.as_secs()
            );
            token.cancel();
        }
    }
}

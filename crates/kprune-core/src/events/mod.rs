use crate::errors::KpruneError;

pub fn log_app_startup() {
    tracing::info!(
        event = "core.app.startup_completed",
        version = env!("CARGO_PKG_VERSION")
    );
}

pub fn log_app_shutdown() {
    tracing::info!(event = "core.app.shutdown_started");
}

pub fn log_app_error<E: KpruneError>(error: &E) {
    tracing::error!(
        event = "core.app.error_occurred",
        error_code = error.error_code(),
        error_message = %error,
        user_error = error.is_user_error()
    );
}

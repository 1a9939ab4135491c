use tracing_subscriber::{EnvFilter, fmt};

use crate::app::AppError;

/// Logs go to stderr so the status summary on stdout stays clean.
pub fn init() -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(AppError::logging_init)
}

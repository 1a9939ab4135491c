mod config;
mod error;
mod logging;
mod runtime;

pub use error::AppError;

pub fn run() -> Result<(), AppError> {
    env_file_loaded(dotenvy::dotenv())?;

    logging::init()?;

    let config = config::AppConfig::from_env()?;

    tracing::info!(
        region = %config.region,
        base_url = %config.base_url,
        http_timeout_ms = config.http_timeout_ms,
        poll_interval_ms = config.poll_interval_ms,
        poll_max_attempts = config.poll_max_attempts,
        refresh = config.refresh,
        debug_http = config.debug_http,
        replay_file = config.replay_file.as_deref().unwrap_or("-"),
        "application bootstrap initialized"
    );

    runtime::run(config)
}

/// A missing .env file is fine; the environment alone may carry the settings.
fn env_file_loaded<T>(result: dotenvy::Result<T>) -> Result<(), AppError> {
    match result {
        Ok(_) => Ok(()),
        Err(error) if error.not_found() => Ok(()),
        Err(error) => Err(AppError::config(format!("failed to load .env file: {error}"))),
    }
}

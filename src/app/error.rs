use thiserror::Error;

use crate::adapters::transport::TransportError;
use crate::error::CarwingsError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to initialize transport: {0}")]
    TransportInit(#[source] TransportError),
    #[error(transparent)]
    Client(#[from] CarwingsError),
    #[error("failed to write status summary: {0}")]
    Output(String),
}

impl AppError {
    pub fn logging_init<E: std::fmt::Display>(error: E) -> Self {
        Self::LoggingInit(error.to_string())
    }

    pub fn config<E: std::fmt::Display>(error: E) -> Self {
        Self::Config(error.to_string())
    }
}

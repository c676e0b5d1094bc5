//! CLI error type.

use std::io;

use thiserror::Error;

use filerelay::app::AppError;
use filerelay::config::ConfigError;
use filerelay::logging::LoggingError;
use filerelay::storage::StorageError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error(transparent)]
    App(#[from] AppError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

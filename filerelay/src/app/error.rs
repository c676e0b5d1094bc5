//! Application error types.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::download::DownloadError;
use crate::storage::StorageError;

/// Errors that can occur while starting the relay.
#[derive(Debug, Error)]
pub enum AppError {
    /// The configuration was rejected.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The storage root could not be prepared.
    #[error("Failed to prepare storage: {0}")]
    Storage(#[from] StorageError),

    /// The HTTP client could not be built.
    #[error("Failed to create downloader: {0}")]
    Downloader(#[from] DownloadError),

    /// Failed to create the Tokio runtime.
    #[error("Failed to create Tokio runtime: {0}")]
    RuntimeCreation(#[source] io::Error),
}

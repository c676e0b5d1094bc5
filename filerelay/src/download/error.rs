//! Download error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::storage::StorageError;

/// Errors that end a fetch. `Display` is the one-line status shown to the user.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The locator is not a valid absolute URL.
    #[error("invalid link {locator}: {reason}")]
    InvalidLocator { locator: String, reason: String },

    /// The URL scheme is not fetchable.
    #[error("unsupported scheme {scheme}")]
    UnsupportedScheme { scheme: String },

    /// The server answered with a non-success status.
    #[error("HTTP error {status}")]
    HttpStatus { status: u16 },

    /// The request exceeded the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// Connection, TLS or protocol failure.
    #[error("{reason}")]
    Request { url: String, reason: String },

    /// Writing the body to local storage failed.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The namespace could not be prepared.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_surfaces_code() {
        let err = DownloadError::HttpStatus { status: 404 };
        assert_eq!(err.to_string(), "HTTP error 404");
    }

    #[test]
    fn test_timeout_display() {
        let err = DownloadError::Timeout {
            url: "https://example.com/a.bin".to_string(),
            timeout_secs: 30,
        };
        assert!(err.to_string().contains("timed out after 30s"));
    }
}

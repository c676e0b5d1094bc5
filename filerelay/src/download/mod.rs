//! Fetching remote resources into a user's namespace.
//!
//! This module provides:
//! - The [`Fetcher`] trait, the seam the command front end depends on
//! - [`HttpDownloader`], a streaming HTTP(S) implementation (`http`)
//! - Local filename derivation from a locator (`filename`)
//!
//! Every fetch either returns a [`DownloadedFile`] or a [`DownloadError`]
//! whose `Display` is a one-line status suitable for the user. Nothing
//! panics on a bad locator, an unreachable host or a non-2xx status.

mod error;
mod filename;
mod http;

use std::path::PathBuf;

pub use error::DownloadError;
pub use filename::derive_filename;
pub use http::HttpDownloader;

use crate::storage::UserId;

/// A resource stored after a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    /// Local path inside the user's namespace.
    pub path: PathBuf,
    /// Derived filename.
    pub filename: String,
    /// Final size in bytes.
    pub size: u64,
}

impl DownloadedFile {
    /// Short "name (size)" line reported back to the user.
    pub fn summary(&self) -> String {
        format!(
            "{} ({:.2} MB)",
            self.filename,
            self.size as f64 / 1024.0 / 1024.0
        )
    }
}

/// Retrieves a locator into a user's namespace.
pub trait Fetcher: Send + Sync {
    /// Fetch `locator` into the namespace of `user`.
    fn fetch(&self, locator: &str, user: UserId) -> Result<DownloadedFile, DownloadError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_formats_megabytes() {
        let file = DownloadedFile {
            path: PathBuf::from("/r/1/report.pdf"),
            filename: "report.pdf".to_string(),
            size: 20_000_000,
        };
        assert_eq!(file.summary(), "report.pdf (19.07 MB)");
    }
}

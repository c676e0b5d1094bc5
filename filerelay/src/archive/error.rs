//! Archive error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a split. Partially written parts stay on disk.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The input is missing or not a regular file.
    #[error("not a regular file: {0}")]
    NotAFile(PathBuf),

    /// The configured part size is zero.
    #[error("part size must be positive")]
    InvalidPartSize,

    /// Compressing the input failed.
    #[error("failed to compress {path}: {source}")]
    Compress {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing a part failed.
    #[error("failed to write part {path}: {source}")]
    WritePart {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading the archive back failed.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Removing the archive or the original failed.
    #[error("failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

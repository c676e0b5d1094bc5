//! Time-based retention of stored files.
//!
//! A sweep deletes every regular file, in every namespace, whose modification
//! time is strictly older than `now - window`. Namespace directories are never
//! removed, and file registry snapshots are left untouched.

mod daemon;

use std::fs;
use std::io;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

pub use daemon::RetentionDaemon;
pub(crate) use daemon::run_sweep;

use crate::storage::{read_regular_files, Storage, StorageError};

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Namespaces visited.
    pub namespaces: usize,
    /// Files deleted.
    pub files_deleted: usize,
    /// Bytes reclaimed.
    pub bytes_freed: u64,
    /// Files or namespaces that could not be processed.
    pub failures: usize,
}

/// Deletes expired files across all namespaces.
#[derive(Debug, Clone)]
pub struct RetentionSweeper {
    storage: Storage,
    window: Duration,
}

impl RetentionSweeper {
    pub fn new(storage: Storage, window: Duration) -> Self {
        Self { storage, window }
    }

    /// Configured retention window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Sweep with the cutoff `now - window`.
    pub fn sweep(&self) -> Result<SweepReport, StorageError> {
        let cutoff = SystemTime::now()
            .checked_sub(self.window)
            .unwrap_or(UNIX_EPOCH);
        self.sweep_with_cutoff(cutoff)
    }

    /// Delete every file modified strictly before `cutoff`.
    ///
    /// Per-file failures are counted and skipped. Only an unreadable storage
    /// root fails the whole sweep.
    pub fn sweep_with_cutoff(&self, cutoff: SystemTime) -> Result<SweepReport, StorageError> {
        let mut report = SweepReport::default();

        for dir in self.storage.namespace_dirs()? {
            report.namespaces += 1;

            let files = match read_regular_files(&dir) {
                Ok(files) => files,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Skipping unreadable namespace");
                    report.failures += 1;
                    continue;
                }
            };

            for file in files.into_iter().filter(|f| f.modified < cutoff) {
                let path = dir.join(&file.name);
                match fs::remove_file(&path) {
                    Ok(()) => {
                        debug!(file = %path.display(), "Expired file removed");
                        report.files_deleted += 1;
                        report.bytes_freed += file.size;
                    }
                    // removed concurrently
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => {
                        warn!(file = %path.display(), error = %e, "Failed to remove expired file");
                        report.failures += 1;
                    }
                }
            }
        }

        Ok(report)
    }
}

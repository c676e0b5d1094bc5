//! Point-in-time view of the usage counters.

use std::fmt;

use crate::config::format_size;

/// Copy of all counters taken at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageSnapshot {
    /// Downloads that finished successfully.
    pub downloads_completed: u64,
    /// Files and parts handed to the transport.
    pub files_sent: u64,
    /// Sum of the sizes of all completed downloads.
    pub bytes_downloaded: u64,
    /// Downloads currently in progress.
    pub active_downloads: u64,
}

impl fmt::Display for UsageSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Statistics")?;
        writeln!(f)?;
        writeln!(f, "Downloads: {}", self.downloads_completed)?;
        writeln!(f, "Files sent: {}", self.files_sent)?;
        writeln!(f, "Downloaded: {}", format_size(self.bytes_downloaded))?;
        write!(f, "Active: {}", self.active_downloads)
    }
}

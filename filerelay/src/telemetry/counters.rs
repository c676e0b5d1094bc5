//! Atomic usage counters.

use std::sync::atomic::{AtomicU64, Ordering};

use super::snapshot::UsageSnapshot;

/// Shared counters for downloads, deliveries and bytes.
#[derive(Debug, Default)]
pub struct UsageCounters {
    downloads_completed: AtomicU64,
    files_sent: AtomicU64,
    bytes_downloaded: AtomicU64,
    active_downloads: AtomicU64,
}

impl UsageCounters {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one finished download of `bytes` bytes.
    pub fn download_completed(&self, bytes: u64) {
        self.downloads_completed.fetch_add(1, Ordering::Relaxed);
        self.bytes_downloaded.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record one file or part handed to the transport.
    pub fn file_sent(&self) {
        self.files_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark a download as in flight until the returned guard is dropped.
    ///
    /// The gauge is decremented on drop, so early returns and failures
    /// release it as well.
    pub fn begin_download(&self) -> InFlightGuard<'_> {
        self.active_downloads.fetch_add(1, Ordering::Relaxed);
        InFlightGuard { counters: self }
    }

    /// Number of downloads currently in flight.
    pub fn active_downloads(&self) -> u64 {
        self.active_downloads.load(Ordering::Relaxed)
    }

    /// Take a point-in-time copy of all counters.
    pub fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            downloads_completed: self.downloads_completed.load(Ordering::Relaxed),
            files_sent: self.files_sent.load(Ordering::Relaxed),
            bytes_downloaded: self.bytes_downloaded.load(Ordering::Relaxed),
            active_downloads: self.active_downloads.load(Ordering::Relaxed),
        }
    }
}

/// Keeps the in-flight gauge raised while alive.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    counters: &'a UsageCounters,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.counters.active_downloads.fetch_sub(1, Ordering::Relaxed);
    }
}

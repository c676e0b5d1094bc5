//! Process-wide usage counters.
//!
//! Counters are lock-free atomics shared through an `Arc` and injected into
//! the downloader and the delivery pipeline. They live from process start to
//! process end and are never persisted.
//!
//! # Architecture
//!
//! ```text
//! Downloader ─────┐
//!                 ├──► UsageCounters ─────► UsageSnapshot ─────► /stats text
//! DeliveryPipeline┘    (atomic counters)    (point-in-time copy)
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use filerelay::telemetry::UsageCounters;
//!
//! let counters = Arc::new(UsageCounters::new());
//! counters.download_completed(2048);
//! counters.file_sent();
//!
//! let snapshot = counters.snapshot();
//! assert_eq!(snapshot.downloads_completed, 1);
//! assert_eq!(snapshot.bytes_downloaded, 2048);
//! ```

mod counters;
mod snapshot;

pub use counters::{InFlightGuard, UsageCounters};
pub use snapshot::UsageSnapshot;

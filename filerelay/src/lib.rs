//! filerelay - per-user file relay over a chat transport
//!
//! Users send links; the relay downloads them into a private namespace and
//! delivers the files back as attachments. Files above a size threshold are
//! compressed and split into numbered parts delivered at a paced rate in the
//! background. Stored files can be listed, re-sent and removed by index, and a
//! periodic sweep deletes everything older than the retention window.
//!
//! # Layout
//!
//! - [`storage`]: per-user namespaces on disk
//! - [`download`]: streaming HTTP(S) fetches
//! - [`archive`]: 7z compression and fixed-size part slicing
//! - [`delivery`]: the transport seam and the paced delivery pipeline
//! - [`registry`]: index-addressable file listings
//! - [`retention`]: the sweeper and its daemon
//! - [`telemetry`]: shared usage counters
//! - [`bot`]: command handling on top of all of the above
//! - [`app`]: runtime ownership and lifecycle

pub mod app;
pub mod archive;
pub mod bot;
pub mod config;
pub mod delivery;
pub mod download;
pub mod logging;
pub mod registry;
pub mod retention;
pub mod storage;
pub mod telemetry;

#[cfg(test)]
mod testing;

/// Crate version, as recorded in Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Application bootstrap and lifecycle management.
//!
//! [`RelayApp`] owns the Tokio runtime, the retention daemon and the
//! [`RelayBot`](crate::bot::RelayBot), and tears them down in order.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        RelayApp                          │
//! │                                                          │
//! │  Runtime ──┬──► RetentionDaemon (periodic sweep)         │
//! │            └──► blocking pool (multi-part deliveries)    │
//! │                                                          │
//! │  RelayBot ──► HttpDownloader, ArchivalSplitter,          │
//! │               DeliveryPipeline, FileRegistry             │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use filerelay::app::RelayApp;
//!
//! let app = RelayApp::start(config, transport)?;
//! app.bot().handle_event(&event);
//!
//! // Graceful shutdown, including one last sweep
//! app.shutdown();
//! ```

mod bootstrap;
mod error;

pub use bootstrap::RelayApp;
pub use error::AppError;

//! Outbound delivery over a chat transport.
//!
//! The transport itself is an external collaborator; this module only defines
//! the [`Transport`] seam it must implement and the [`DeliveryPipeline`] that
//! sends single files and paced multi-part batches through it.

mod pipeline;
mod transport;

pub use pipeline::{BatchReport, DeliveryOutcome, DeliveryPipeline};
pub use transport::{ChatId, MessageId, OutboundMessage, Transport, TransportError};

//! Single-file and multi-part delivery.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::transport::{ChatId, MessageId, OutboundMessage, Transport};
use crate::telemetry::UsageCounters;

/// Result of sending one attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The transport accepted the message.
    Sent(MessageId),
    /// The transport failed; an error notice was sent instead.
    Failed(String),
}

impl DeliveryOutcome {
    /// Whether the attachment went out.
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent(_))
    }
}

/// Aggregate result of a multi-part delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Parts attempted.
    pub total: usize,
    /// Parts the transport accepted.
    pub sent: usize,
    /// 1-based positions of parts that failed.
    pub failed: Vec<usize>,
}

/// Sends files to conversations and keeps the files-sent counter.
#[derive(Clone)]
pub struct DeliveryPipeline {
    transport: Arc<dyn Transport>,
    counters: Arc<UsageCounters>,
    pacing: Duration,
}

impl DeliveryPipeline {
    /// Create a pipeline waiting `pacing` between consecutive parts.
    pub fn new(
        transport: Arc<dyn Transport>,
        counters: Arc<UsageCounters>,
        pacing: Duration,
    ) -> Self {
        Self {
            transport,
            counters,
            pacing,
        }
    }

    /// Send a text notice. Transport failures are logged only.
    pub fn notify(&self, chat: ChatId, text: impl Into<String>) {
        self.notify_message(chat, OutboundMessage::text(text));
    }

    /// Send a prepared notice. Transport failures are logged only.
    pub fn notify_message(&self, chat: ChatId, message: OutboundMessage) {
        if let Err(e) = self.transport.send(chat, message) {
            warn!(chat = %chat, error = %e, "Failed to send notice");
        }
    }

    /// Attach one file to a message labelled `label`.
    ///
    /// A transport fault is reported to the conversation as an error notice.
    pub fn send_one(&self, chat: ChatId, path: &Path, label: &str) -> DeliveryOutcome {
        let message = OutboundMessage::text(label).with_attachment(path);
        match self.transport.send(chat, message) {
            Ok(id) => {
                self.counters.file_sent();
                debug!(chat = %chat, file = %path.display(), "File sent");
                DeliveryOutcome::Sent(id)
            }
            Err(e) => {
                warn!(chat = %chat, file = %path.display(), error = %e, "File delivery failed");
                self.notify(chat, format!("Error: {}", e));
                DeliveryOutcome::Failed(e.to_string())
            }
        }
    }

    /// Send every part in order, pacing between consecutive parts.
    ///
    /// A failed part produces an error notice for its position and the batch
    /// continues. One completion notice follows the last part.
    pub fn send_all(&self, chat: ChatId, parts: &[PathBuf]) -> BatchReport {
        let total = parts.len();
        let mut report = BatchReport {
            total,
            ..Default::default()
        };

        for (index, part) in parts.iter().enumerate() {
            if index > 0 && !self.pacing.is_zero() {
                thread::sleep(self.pacing);
            }

            let position = index + 1;
            let name = part
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let message = OutboundMessage::text(format!("Part {}/{}: {}", position, total, name))
                .with_attachment(part);

            match self.transport.send(chat, message) {
                Ok(_) => {
                    self.counters.file_sent();
                    report.sent += 1;
                    debug!(chat = %chat, part = position, total, "Part sent");
                }
                Err(e) => {
                    warn!(chat = %chat, part = position, total, error = %e, "Part delivery failed");
                    self.notify(chat, format!("Error in part {}: {}", position, e));
                    report.failed.push(position);
                }
            }
        }

        self.notify(chat, format!("{} parts sent.", total));
        info!(
            chat = %chat,
            total,
            sent = report.sent,
            failed = report.failed.len(),
            "Multi-part delivery finished"
        );
        report
    }

    /// Run [`send_all`](Self::send_all) on the runtime's blocking pool.
    ///
    /// The caller may drop the handle; the delivery runs to completion.
    pub fn spawn_send_all(
        &self,
        runtime: &Handle,
        chat: ChatId,
        parts: Vec<PathBuf>,
    ) -> JoinHandle<BatchReport> {
        let pipeline = self.clone();
        runtime.spawn_blocking(move || pipeline.send_all(chat, &parts))
    }
}

//! Chat-facing command handling.
//!
//! [`RelayBot`] turns one [`InboundEvent`] into storage operations and
//! outbound notices. Events are handled synchronously, one at a time; only
//! multi-part deliveries leave the request path, running on the runtime's
//! blocking pool. Every failure becomes a notice to the conversation, and the
//! inbound message is deleted once the event has been handled.
//!
//! `handle_event` performs blocking network and disk I/O and must not be
//! called from inside an async task.

mod command;
pub mod messages;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub use command::{extract_locators, Command, IndexArg};

use crate::archive::ArchivalSplitter;
use crate::config::RelayConfig;
use crate::delivery::{
    BatchReport, ChatId, DeliveryOutcome, DeliveryPipeline, MessageId, OutboundMessage, Transport,
};
use crate::download::Fetcher;
use crate::registry::FileRegistry;
use crate::storage::{Storage, StorageError, StoredFile, UserId};
use crate::telemetry::UsageCounters;

/// One message received from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub message_id: MessageId,
    pub chat: ChatId,
    pub sender: UserId,
    pub text: String,
}

/// What happened to one locator.
#[derive(Debug)]
pub enum LocatorOutcome {
    /// Fetching or splitting failed; the notice has been sent.
    Failed(String),
    /// Delivered as a single attachment.
    Delivered(DeliveryOutcome),
    /// Split; the parts are being delivered in the background.
    Split {
        parts: usize,
        delivery: JoinHandle<BatchReport>,
    },
}

/// Background deliveries started while handling one event.
///
/// Dropping the handles does not cancel the deliveries.
pub type Deliveries = Vec<JoinHandle<BatchReport>>;

/// Command front end over the core services.
pub struct RelayBot {
    storage: Storage,
    fetcher: Arc<dyn Fetcher>,
    transport: Arc<dyn Transport>,
    splitter: ArchivalSplitter,
    pipeline: DeliveryPipeline,
    registry: FileRegistry,
    counters: Arc<UsageCounters>,
    config: RelayConfig,
    runtime: Handle,
}

impl RelayBot {
    /// Build a bot; background deliveries are spawned on `runtime`.
    pub fn new(
        config: RelayConfig,
        fetcher: Arc<dyn Fetcher>,
        transport: Arc<dyn Transport>,
        counters: Arc<UsageCounters>,
        runtime: Handle,
    ) -> Self {
        let storage = Storage::new(&config.storage_root);
        let pipeline = DeliveryPipeline::new(
            Arc::clone(&transport),
            Arc::clone(&counters),
            config.pacing_interval,
        );

        Self {
            registry: FileRegistry::new(storage.clone()),
            splitter: ArchivalSplitter::new(config.part_size),
            storage,
            fetcher,
            transport,
            pipeline,
            counters,
            config,
            runtime,
        }
    }

    pub fn registry(&self) -> &FileRegistry {
        &self.registry
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Handle one inbound event, then delete the inbound message.
    pub fn handle_event(&self, event: &InboundEvent) -> Deliveries {
        let command = Command::parse(&event.text);
        debug!(user = %event.sender, chat = %event.chat, ?command, "Inbound event");

        let deliveries = match command {
            Command::Help => {
                self.reply(event, self.help());
                Vec::new()
            }
            Command::List => {
                self.handle_list(event);
                Vec::new()
            }
            Command::Remove(arg) => {
                self.handle_remove(event, arg);
                Vec::new()
            }
            Command::Send(arg) => self.handle_send(event, arg).into_iter().collect(),
            Command::Clear => {
                self.handle_clear(event);
                Vec::new()
            }
            Command::Stats => {
                self.reply(event, self.counters.snapshot().to_string());
                Vec::new()
            }
            Command::Text(text) => self.handle_text(event, &text),
        };

        if let Err(e) = self.transport.delete_messages(&[event.message_id]) {
            warn!(chat = %event.chat, error = %e, "Failed to delete inbound message");
        }

        deliveries
    }

    /// Download one locator and deliver the result.
    ///
    /// Files above the size threshold are split on the request path and the
    /// parts are delivered in the background.
    pub fn process_locator(&self, event: &InboundEvent, locator: &str) -> LocatorOutcome {
        self.pipeline.notify_message(
            event.chat,
            OutboundMessage::text(messages::DOWNLOADING).quoting(event.message_id),
        );

        let file = match self.fetcher.fetch(locator, event.sender) {
            Ok(file) => file,
            Err(e) => {
                let notice = messages::error(&e);
                self.reply(event, notice.clone());
                return LocatorOutcome::Failed(notice);
            }
        };

        if file.size <= self.config.size_threshold {
            let outcome = self.pipeline.send_one(event.chat, &file.path, &file.filename);
            return LocatorOutcome::Delivered(outcome);
        }

        self.reply(event, messages::splitting(&file));
        match self.splitter.split(&file.path) {
            Ok(parts) => {
                let count = parts.len();
                self.reply(event, messages::split_into(count));
                LocatorOutcome::Split {
                    parts: count,
                    delivery: self.pipeline.spawn_send_all(&self.runtime, event.chat, parts),
                }
            }
            Err(e) => {
                warn!(user = %event.sender, file = %file.filename, error = %e, "Split failed");
                let notice = messages::error(&e);
                self.reply(event, notice.clone());
                LocatorOutcome::Failed(notice)
            }
        }
    }

    fn help(&self) -> String {
        messages::help_text(self.config.size_threshold, self.config.retention_window)
    }

    fn reply(&self, event: &InboundEvent, text: impl Into<String>) {
        self.pipeline.notify(event.chat, text);
    }

    fn handle_text(&self, event: &InboundEvent, text: &str) -> Deliveries {
        let locators = extract_locators(text, self.config.max_urls_per_message);
        if locators.is_empty() {
            self.reply(event, messages::NO_LINKS);
            return Vec::new();
        }

        let mut deliveries = Vec::new();
        for locator in locators {
            if let LocatorOutcome::Split { delivery, .. } = self.process_locator(event, locator) {
                deliveries.push(delivery);
            }
        }
        deliveries
    }

    fn handle_list(&self, event: &InboundEvent) {
        match self.registry.list(event.sender) {
            Ok(listing) => self.reply(event, listing.text),
            Err(e) => self.reply(event, messages::error(&e)),
        }
    }

    fn handle_clear(&self, event: &InboundEvent) {
        match self.storage.clear(event.sender) {
            Ok(true) => {
                self.registry.forget(event.sender);
                info!(user = %event.sender, "Namespace cleared");
                self.reply(event, messages::FOLDER_CLEARED);
            }
            Ok(false) => self.reply(event, messages::FOLDER_EMPTY),
            Err(e) => self.reply(event, messages::error(&e)),
        }
    }

    /// Map an index argument to a stored file, replying on failure.
    fn resolve_arg(&self, event: &InboundEvent, arg: IndexArg, command: &str) -> Option<StoredFile> {
        let index = match arg {
            IndexArg::Missing => {
                self.reply(event, messages::usage(command));
                return None;
            }
            IndexArg::NotANumber => {
                self.reply(event, messages::use_a_number(command));
                return None;
            }
            IndexArg::Index(index) => index,
        };

        match self.registry.resolve_stored(event.sender, index) {
            Ok(file) => Some(file),
            Err(e) => {
                debug!(user = %event.sender, index, error = %e, "Lookup failed");
                self.reply(event, messages::lookup_failure(&e));
                None
            }
        }
    }

    fn handle_remove(&self, event: &InboundEvent, arg: IndexArg) {
        let Some(file) = self.resolve_arg(event, arg, "rm") else {
            return;
        };

        match self.storage.remove(event.sender, &file.name) {
            Ok(()) => {
                self.registry.invalidate(event.sender, &file.name);
                info!(user = %event.sender, file = %file.name, "File removed");
                self.reply(event, messages::removed(&file.name));
            }
            Err(StorageError::NotFound(_)) => self.reply(event, messages::FILE_MISSING),
            Err(e) => self.reply(event, messages::error(&e)),
        }
    }

    fn handle_send(&self, event: &InboundEvent, arg: IndexArg) -> Option<JoinHandle<BatchReport>> {
        let file = self.resolve_arg(event, arg, "send")?;
        let path = match self.storage.file_path(event.sender, &file.name) {
            Ok(path) => path,
            Err(e) => {
                self.reply(event, messages::error(&e));
                return None;
            }
        };

        if file.size <= self.config.size_threshold {
            self.pipeline.send_one(event.chat, &path, &file.name);
            return None;
        }

        let parts: Vec<PathBuf> = match self.splitter.split(&path) {
            Ok(parts) => parts,
            Err(e) => {
                warn!(user = %event.sender, file = %file.name, error = %e, "Split failed");
                self.reply(event, messages::error(&e));
                return None;
            }
        };

        self.reply(event, messages::sending_parts(parts.len()));
        Some(self.pipeline.spawn_send_all(&self.runtime, event.chat, parts))
    }
}

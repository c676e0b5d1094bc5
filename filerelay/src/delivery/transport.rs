//! Transport abstraction.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Identity of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChatId(pub u64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a message within the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub u64);

/// Failure reported by the transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The message could not be sent.
    #[error("send failed: {0}")]
    Send(String),

    /// Messages could not be deleted.
    #[error("delete failed: {0}")]
    Delete(String),
}

/// A message to send: text, optionally one attachment and a quoted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub text: String,
    pub attachment: Option<PathBuf>,
    pub quote: Option<MessageId>,
}

impl OutboundMessage {
    /// A plain text message.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachment: None,
            quote: None,
        }
    }

    /// Attach a file.
    pub fn with_attachment(mut self, path: impl Into<PathBuf>) -> Self {
        self.attachment = Some(path.into());
        self
    }

    /// Reply-quote another message.
    pub fn quoting(mut self, id: MessageId) -> Self {
        self.quote = Some(id);
        self
    }
}

/// Send/delete primitives of the chat transport.
///
/// Implementations must be callable from background threads.
pub trait Transport: Send + Sync {
    /// Send a message to a conversation.
    fn send(&self, chat: ChatId, message: OutboundMessage) -> Result<MessageId, TransportError>;

    /// Delete messages by id.
    fn delete_messages(&self, ids: &[MessageId]) -> Result<(), TransportError>;
}

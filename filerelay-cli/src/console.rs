//! Transport that prints outbound messages to a terminal.

use std::fs;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use filerelay::config::format_size;
use filerelay::delivery::{ChatId, MessageId, OutboundMessage, Transport, TransportError};
use tracing::debug;

/// Writes each outbound message as text lines.
///
/// Attachments are shown by path and size; the file must exist when sent.
pub struct ConsoleTransport<W> {
    out: Mutex<W>,
    next_id: AtomicU64,
}

impl<W: Write + Send> ConsoleTransport<W> {
    /// Message ids handed out start above `first_id`.
    pub fn new(out: W, first_id: u64) -> Self {
        Self {
            out: Mutex::new(out),
            next_id: AtomicU64::new(first_id),
        }
    }

    /// Next id available for an inbound message.
    pub fn allocate_id(&self) -> MessageId {
        MessageId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> Transport for ConsoleTransport<W> {
    fn send(&self, chat: ChatId, message: OutboundMessage) -> Result<MessageId, TransportError> {
        let mut rendered = format!("[chat {}] {}\n", chat, message.text);
        if let Some(path) = &message.attachment {
            let meta = fs::metadata(path)
                .map_err(|e| TransportError::Send(format!("{}: {}", path.display(), e)))?;
            rendered.push_str(&format!(
                "    attachment: {} ({})\n",
                path.display(),
                format_size(meta.len())
            ));
        }

        let mut out = self
            .out
            .lock()
            .map_err(|_| TransportError::Send("console writer poisoned".to_string()))?;
        out.write_all(rendered.as_bytes())
            .and_then(|_| out.flush())
            .map_err(|e| TransportError::Send(e.to_string()))?;

        Ok(self.allocate_id())
    }

    fn delete_messages(&self, ids: &[MessageId]) -> Result<(), TransportError> {
        debug!(count = ids.len(), "Console transport ignores deletions");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_renders_text_and_attachment() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.bin");
        fs::write(&file, vec![0u8; 2048]).unwrap();

        let transport = ConsoleTransport::new(Vec::new(), 0);
        let first = transport
            .send(ChatId(4), OutboundMessage::text("hello"))
            .unwrap();
        let second = transport
            .send(ChatId(4), OutboundMessage::text("a.bin").with_attachment(&file))
            .unwrap();
        assert_ne!(first, second);

        let out = String::from_utf8(transport.into_inner()).unwrap();
        assert!(out.starts_with("[chat 4] hello\n"));
        assert!(out.contains("attachment:"));
        assert!(out.contains("2.00 KB"));
    }

    #[test]
    fn test_missing_attachment_fails() {
        let transport = ConsoleTransport::new(Vec::new(), 0);
        let result = transport.send(
            ChatId(1),
            OutboundMessage::text("x").with_attachment("/nonexistent/file"),
        );
        assert!(matches!(result, Err(TransportError::Send(_))));
    }
}

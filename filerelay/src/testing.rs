//! Shared helpers for unit tests.

use std::collections::HashSet;
use std::fs;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crate::delivery::{ChatId, MessageId, OutboundMessage, Transport, TransportError};
use crate::download::{DownloadError, DownloadedFile, Fetcher};
use crate::storage::{Storage, UserId};

/// Transport that records every accepted message.
///
/// Attachment sends can be made to fail by their 1-based ordinal; failed
/// sends are not recorded.
#[derive(Debug, Default)]
pub(crate) struct RecordingTransport {
    sent: Mutex<Vec<(ChatId, OutboundMessage)>>,
    deleted: Mutex<Vec<MessageId>>,
    failing_attachments: Mutex<HashSet<usize>>,
    attachments_seen: AtomicUsize,
    next_id: AtomicU64,
}

impl RecordingTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail_attachments(&self, ordinals: impl IntoIterator<Item = usize>) {
        self.failing_attachments.lock().unwrap().extend(ordinals);
    }

    pub(crate) fn sent(&self) -> Vec<(ChatId, OutboundMessage)> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, m)| m.text).collect()
    }

    pub(crate) fn attachments(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|(_, m)| m.attachment)
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    pub(crate) fn deleted(&self) -> Vec<MessageId> {
        self.deleted.lock().unwrap().clone()
    }
}

impl Transport for RecordingTransport {
    fn send(&self, chat: ChatId, message: OutboundMessage) -> Result<MessageId, TransportError> {
        if message.attachment.is_some() {
            let ordinal = self.attachments_seen.fetch_add(1, Ordering::SeqCst) + 1;
            if self.failing_attachments.lock().unwrap().contains(&ordinal) {
                return Err(TransportError::Send(format!("attachment {} rejected", ordinal)));
            }
        }
        let id = MessageId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1000);
        self.sent.lock().unwrap().push((chat, message));
        Ok(id)
    }

    fn delete_messages(&self, ids: &[MessageId]) -> Result<(), TransportError> {
        self.deleted.lock().unwrap().extend_from_slice(ids);
        Ok(())
    }
}

/// Fetcher that "downloads" fixed bytes under the locator's last segment.
pub(crate) struct StaticFetcher {
    storage: Storage,
    body: Vec<u8>,
}

impl StaticFetcher {
    pub(crate) fn new(storage: Storage, body: Vec<u8>) -> Self {
        Self { storage, body }
    }
}

impl Fetcher for StaticFetcher {
    fn fetch(&self, locator: &str, user: UserId) -> Result<DownloadedFile, DownloadError> {
        if locator.contains("/missing/") {
            return Err(DownloadError::HttpStatus { status: 404 });
        }
        let filename = locator.rsplit('/').next().unwrap_or("blob.bin").to_string();
        let path = self.storage.file_path(user, &filename)?;
        fs::write(&path, &self.body).unwrap();
        Ok(DownloadedFile {
            path,
            filename,
            size: self.body.len() as u64,
        })
    }
}

fn read_request(stream: &mut TcpStream) {
    let mut buf = [0u8; 1024];
    let mut seen = Vec::new();
    while !seen.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => seen.extend_from_slice(&buf[..n]),
        }
    }
}

/// Serve one HTTP response on a local port; returns the base URL.
pub(crate) fn serve_once(status: u16, body: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            read_request(&mut stream);
            let head = format!(
                "HTTP/1.1 {} Status\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                body.len()
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&body);
            let _ = stream.flush();
        }
    });
    format!("http://{}", addr)
}

/// Accept one connection and never answer it; returns the base URL.
pub(crate) fn serve_silent(hold: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            read_request(&mut stream);
            thread::sleep(hold);
        }
    });
    format!("http://{}", addr)
}

/// Base URL of a local port nothing listens on.
pub(crate) fn unused_local_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

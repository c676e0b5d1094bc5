//! End-to-end relay flows against a local HTTP server.

use std::collections::HashMap;
use std::fs;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use filerelay::app::RelayApp;
use filerelay::bot::InboundEvent;
use filerelay::config::RelayConfig;
use filerelay::delivery::{ChatId, MessageId, OutboundMessage, Transport, TransportError};
use filerelay::storage::UserId;
use rand::Rng;
use tempfile::TempDir;

const USER: UserId = UserId(501);
const CHAT: ChatId = ChatId(9001);

/// A delivered message with the attachment bytes captured at send time.
#[derive(Debug, Clone)]
struct Delivered {
    text: String,
    attachment: Option<(String, Vec<u8>)>,
    at: Instant,
}

#[derive(Default)]
struct CapturingTransport {
    delivered: Mutex<Vec<Delivered>>,
    deleted: Mutex<Vec<MessageId>>,
    next_id: AtomicU64,
}

impl CapturingTransport {
    fn delivered(&self) -> Vec<Delivered> {
        self.delivered.lock().unwrap().clone()
    }

    fn texts(&self) -> Vec<String> {
        self.delivered().into_iter().map(|d| d.text).collect()
    }

    fn attachments(&self) -> Vec<(String, Vec<u8>, Instant)> {
        self.delivered()
            .into_iter()
            .filter_map(|d| d.attachment.map(|(name, bytes)| (name, bytes, d.at)))
            .collect()
    }
}

impl Transport for CapturingTransport {
    fn send(&self, _chat: ChatId, message: OutboundMessage) -> Result<MessageId, TransportError> {
        let attachment = match &message.attachment {
            Some(path) => {
                let bytes = fs::read(path).map_err(|e| TransportError::Send(e.to_string()))?;
                let name = path.file_name().unwrap().to_string_lossy().into_owned();
                Some((name, bytes))
            }
            None => None,
        };
        self.delivered.lock().unwrap().push(Delivered {
            text: message.text,
            attachment,
            at: Instant::now(),
        });
        Ok(MessageId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1))
    }

    fn delete_messages(&self, ids: &[MessageId]) -> Result<(), TransportError> {
        self.deleted.lock().unwrap().extend_from_slice(ids);
        Ok(())
    }
}

/// Serves fixed bodies by path; unknown paths get 404.
fn serve(routes: HashMap<&'static str, Vec<u8>>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            respond(stream, &routes);
        }
    });
    format!("http://{}", addr)
}

fn respond(mut stream: TcpStream, routes: &HashMap<&'static str, Vec<u8>>) {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
    let request = String::from_utf8_lossy(&head);
    let path = request
        .split_whitespace()
        .nth(1)
        .unwrap_or("/")
        .split('?')
        .next()
        .unwrap_or("/")
        .to_string();

    let (status, body) = match routes.get(path.as_str()) {
        Some(body) => ("200 OK", body.as_slice()),
        None => ("404 Not Found", &b"not found"[..]),
    };
    let header = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    );
    let _ = stream.write_all(header.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();
}

fn random_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    rand::rng().fill(&mut data[..]);
    data
}

struct Session {
    app: RelayApp,
    transport: Arc<CapturingTransport>,
    next_id: u64,
}

impl Session {
    fn start(root: &std::path::Path, config: impl FnOnce(RelayConfig) -> RelayConfig) -> Self {
        let transport = Arc::new(CapturingTransport::default());
        let app = RelayApp::start(
            config(RelayConfig::new(root)),
            Arc::clone(&transport) as Arc<dyn Transport>,
        )
        .unwrap();
        Self {
            app,
            transport,
            next_id: 100,
        }
    }

    /// Handle one message and wait for any background delivery it started.
    fn say(&mut self, text: &str) {
        self.next_id += 1;
        let deliveries = self.app.bot().handle_event(&InboundEvent {
            message_id: MessageId(self.next_id),
            chat: CHAT,
            sender: USER,
            text: text.to_string(),
        });
        let handle = self.app.runtime_handle();
        for delivery in deliveries {
            handle.block_on(delivery).unwrap();
        }
    }
}

#[test]
fn oversized_download_is_split_paced_and_reassemblable() {
    let temp = TempDir::new().unwrap();
    let data = random_bytes(15_000);
    let base = serve(HashMap::from([("/docs/report.pdf", data.clone())]));

    let mut session = Session::start(temp.path(), |c| {
        c.with_size_threshold(12_000)
            .with_part_size(10_000)
            .with_pacing_interval(Duration::from_millis(150))
    });
    session.say(&format!("{}/docs/report.pdf?token=abc", base));

    let parts = session.transport.attachments();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].0, "report.pdf.7z.001");
    assert_eq!(parts[1].0, "report.pdf.7z.002");
    assert_eq!(parts[0].1.len(), 10_000);
    assert!(!parts[1].1.is_empty() && parts[1].1.len() < 10_000);
    assert!(parts[1].2.duration_since(parts[0].2) >= Duration::from_millis(150));

    let texts = session.transport.texts();
    assert_eq!(texts.first().map(String::as_str), Some("Downloading..."));
    assert!(texts.contains(&"Split into 2 parts.".to_string()));
    assert_eq!(texts[texts.len() - 3], "Part 1/2: report.pdf.7z.001");
    assert_eq!(texts[texts.len() - 2], "Part 2/2: report.pdf.7z.002");
    assert_eq!(texts.last().map(String::as_str), Some("2 parts sent."));

    let scratch = TempDir::new().unwrap();
    let archive: Vec<u8> = parts.iter().flat_map(|p| p.1.clone()).collect();
    let joined = scratch.path().join("report.pdf.7z");
    fs::write(&joined, archive).unwrap();
    let out = scratch.path().join("out");
    fs::create_dir_all(&out).unwrap();
    sevenz_rust::decompress_file(&joined, &out).unwrap();
    assert_eq!(fs::read(out.join("report.pdf")).unwrap(), data);

    let stats = session.app.counters().snapshot();
    assert_eq!(stats.downloads_completed, 1);
    assert_eq!(stats.bytes_downloaded, 15_000);
    assert_eq!(stats.files_sent, 2);
    assert_eq!(stats.active_downloads, 0);

    session.app.shutdown();
}

#[test]
fn small_download_is_sent_once_and_listed() {
    let temp = TempDir::new().unwrap();
    let base = serve(HashMap::from([("/notes.txt", b"plain notes".to_vec())]));

    let mut session = Session::start(temp.path(), |c| c);
    session.say(&format!("here: {}/notes.txt", base));

    let attachments = session.transport.attachments();
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].0, "notes.txt");
    assert_eq!(attachments[0].1, b"plain notes");

    session.say("/ls");
    let listing = session.transport.texts().last().cloned().unwrap();
    assert!(listing.contains("0. notes.txt"));

    session.say("/send 0");
    assert_eq!(session.transport.attachments().len(), 2);

    session.say("/rm 0");
    assert_eq!(
        session.transport.texts().last().map(String::as_str),
        Some("Removed: notes.txt")
    );
    assert!(!temp.path().join("501").join("notes.txt").exists());

    // every inbound message was cleaned up
    assert_eq!(session.transport.deleted.lock().unwrap().len(), 4);
    session.app.shutdown();
}

#[test]
fn http_failure_is_reported_and_nothing_is_stored() {
    let temp = TempDir::new().unwrap();
    let base = serve(HashMap::new());

    let mut session = Session::start(temp.path(), |c| c);
    session.say(&format!("{}/gone.zip", base));

    let texts = session.transport.texts();
    assert_eq!(texts.len(), 2);
    assert!(texts[1].contains("404"), "got {:?}", texts[1]);
    assert!(session.transport.attachments().is_empty());

    session.say("/ls");
    assert_eq!(
        session.transport.texts().last().map(String::as_str),
        Some("Folder is empty.")
    );
    session.app.shutdown();
}

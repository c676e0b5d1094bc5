//! `run` - interactive console session.
//!
//! Every stdin line is handled as a message from one user in one chat.
//! Replies and attachments are printed to stdout. Ctrl+C stops immediately;
//! end of input waits for background deliveries to finish first.

use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use filerelay::app::RelayApp;
use filerelay::bot::{Deliveries, InboundEvent};
use filerelay::delivery::{ChatId, Transport};
use filerelay::storage::UserId;
use tracing::{info, warn};

use crate::console::ConsoleTransport;
use crate::error::CliError;
use crate::runner::CliRunner;

/// How often the input loop checks for a shutdown request.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct RunArgs {
    pub user: u64,
    pub chat: u64,
}

pub fn run(runner: &CliRunner, args: RunArgs) -> Result<(), CliError> {
    runner.log_startup("run");

    let transport = Arc::new(ConsoleTransport::new(io::stdout(), 0));
    let app = RelayApp::start(
        runner.config().clone(),
        Arc::clone(&transport) as Arc<dyn Transport>,
    )?;

    println!("filerelay v{}", filerelay::VERSION);
    println!("Storage: {}", runner.config().storage_root.display());
    println!("Send a link or a command (/help). Ctrl+C to exit.");
    println!();

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        println!();
        println!("Received shutdown signal, stopping...");
        shutdown_clone.store(true, Ordering::SeqCst);
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let lines = spawn_stdin_reader();
    let bot = app.bot();
    let mut pending: Deliveries = Vec::new();
    let mut interrupted = false;

    loop {
        if shutdown.load(Ordering::SeqCst) {
            interrupted = true;
            break;
        }

        let line = match lines.recv_timeout(POLL_INTERVAL) {
            Ok(line) => line,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let event = InboundEvent {
            message_id: transport.allocate_id(),
            chat: ChatId(args.chat),
            sender: UserId(args.user),
            text: line,
        };
        pending.extend(bot.handle_event(&event));
        pending.retain(|d| !d.is_finished());
    }

    if !interrupted && !pending.is_empty() {
        info!(count = pending.len(), "Waiting for background deliveries");
        let handle = app.runtime_handle();
        for delivery in pending {
            if let Err(e) = handle.block_on(delivery) {
                warn!(error = %e, "Background delivery aborted");
            }
        }
    }

    drop(bot);
    if let Some(report) = app.shutdown() {
        println!(
            "Final sweep removed {} expired file(s).",
            report.files_deleted
        );
    }
    println!("Stopped.");
    Ok(())
}

/// Forward stdin lines over a channel; the sender drops at end of input.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

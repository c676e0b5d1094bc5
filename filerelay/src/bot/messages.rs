//! User-facing notice texts.

use std::time::Duration;

use crate::config::format_size;
use crate::download::DownloadedFile;
use crate::registry::LookupError;

pub const DOWNLOADING: &str = "Downloading...";
pub const FOLDER_CLEARED: &str = "Folder cleared.";
pub const FILE_MISSING: &str = "File does not exist.";
pub const INVALID_NUMBER: &str = "Invalid number.";
pub const LIST_FIRST: &str = "Run /ls first.";
pub const NO_LINKS: &str = "Send a direct http(s) link, or /help for commands.";

pub use crate::registry::EMPTY_FOLDER_TEXT as FOLDER_EMPTY;

/// Help text reflecting the configured threshold and retention window.
pub fn help_text(size_threshold: u64, retention: Duration) -> String {
    format!(
        "File relay - help\n\
         \n\
         Automatic download:\n\
         - Send any direct HTTP/HTTPS link\n\
         - Files over {} are split into parts\n\
         - Files are deleted after {} hours\n\
         \n\
         File management:\n\
         - /ls - List files with numbers\n\
         - /rm <number> - Delete a file by number\n\
         - /clear - Delete all files\n\
         - /send <number> - Send a file again by number\n\
         - /help - Show this help\n\
         \n\
         Statistics:\n\
         - /stats - Usage statistics",
        format_size(size_threshold),
        retention.as_secs() / 3600
    )
}

pub fn usage(command: &str) -> String {
    format!("Usage: /{} <number>", command)
}

pub fn use_a_number(command: &str) -> String {
    format!("Use a number: /{} 0", command)
}

pub fn removed(name: &str) -> String {
    format!("Removed: {}", name)
}

pub fn splitting(file: &DownloadedFile) -> String {
    format!("Splitting {}...", file.summary())
}

pub fn split_into(parts: usize) -> String {
    format!("Split into {} parts.", parts)
}

pub fn sending_parts(parts: usize) -> String {
    format!("Sending {} parts...", parts)
}

pub fn error(e: &dyn std::error::Error) -> String {
    format!("Error: {}", e)
}

/// Notice for a failed index lookup.
pub fn lookup_failure(e: &LookupError) -> String {
    match e {
        LookupError::NoSnapshot => LIST_FIRST.to_string(),
        LookupError::OutOfRange { .. } => INVALID_NUMBER.to_string(),
        LookupError::Missing(_) => FILE_MISSING.to_string(),
        LookupError::Storage(inner) => error(inner),
    }
}

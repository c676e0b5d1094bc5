//! Archival splitting of oversized files.
//!
//! A file above the size threshold is compressed into a single-entry 7z
//! archive named `<filename>.7z`, the archive is cut into parts
//! `<filename>.7z.001`, `.002`, …, and both the archive and the original are
//! removed.
//!
//! Reassembly is the recipient's job:
//!
//! ```text
//! cat report.pdf.7z.001 report.pdf.7z.002 > report.pdf.7z && 7z x report.pdf.7z
//! ```

mod error;
mod splitter;

pub use error::ArchiveError;
pub use splitter::{archive_name, part_name, ArchivalSplitter, ARCHIVE_EXTENSION};

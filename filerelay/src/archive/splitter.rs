//! Compression and fixed-size slicing.

use std::fmt::Display;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use sevenz_rust::{SevenZArchiveEntry, SevenZWriter};
use tracing::{debug, info};

use super::error::ArchiveError;

/// Extension appended to a filename to name its archive.
pub const ARCHIVE_EXTENSION: &str = "7z";

/// Read buffer used while slicing (64KB).
const SLICE_BUFFER_SIZE: usize = 64 * 1024;

/// Name of the archive built from `filename` (e.g. `report.pdf.7z`).
pub fn archive_name(filename: &str) -> String {
    format!("{}.{}", filename, ARCHIVE_EXTENSION)
}

/// Name of part `number` (1-based) of an archive (e.g. `report.pdf.7z.001`).
pub fn part_name(archive_name: &str, number: u32) -> String {
    format!("{}.{:03}", archive_name, number)
}

/// Splits files into numbered archive parts.
#[derive(Debug, Clone, Copy)]
pub struct ArchivalSplitter {
    part_size: u64,
}

impl ArchivalSplitter {
    /// Create a splitter producing parts of `part_size` bytes.
    pub fn new(part_size: u64) -> Self {
        Self { part_size }
    }

    /// Compress `file_path`, slice the archive, then remove archive and input.
    ///
    /// Returns the part paths in sequence order. On error nothing is rolled
    /// back: parts already written and the archive remain on disk.
    pub fn split(&self, file_path: &Path) -> Result<Vec<PathBuf>, ArchiveError> {
        if self.part_size == 0 {
            return Err(ArchiveError::InvalidPartSize);
        }

        let archive = compress(file_path)?;
        let parts = slice(&archive, self.part_size)?;

        remove(&archive)?;
        remove(file_path)?;

        info!(
            file = %file_path.display(),
            parts = parts.len(),
            part_size = self.part_size,
            "File split into parts"
        );
        Ok(parts)
    }
}

/// Compress a regular file into a single-entry `<name>.7z` next to it.
///
/// The entry is stored under the original filename, so extracting the
/// reassembled archive restores the file and its name.
pub fn compress(file_path: &Path) -> Result<PathBuf, ArchiveError> {
    fs::metadata(file_path)
        .ok()
        .filter(|m| m.is_file())
        .ok_or_else(|| ArchiveError::NotAFile(file_path.to_path_buf()))?;

    let filename = file_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ArchiveError::NotAFile(file_path.to_path_buf()))?;

    let archive_path = file_path.with_file_name(archive_name(&filename));
    let compress_err = |e: &dyn Display| ArchiveError::Compress {
        path: file_path.to_path_buf(),
        source: io::Error::other(e.to_string()),
    };

    let input = File::open(file_path).map_err(|e| compress_err(&e))?;
    let mut writer = SevenZWriter::create(&archive_path).map_err(|e| compress_err(&e))?;
    writer
        .push_archive_entry(
            SevenZArchiveEntry::from_path(file_path, filename),
            Some(BufReader::new(input)),
        )
        .map_err(|e| compress_err(&e))?;
    writer.finish().map_err(|e| compress_err(&e))?;

    debug!(archive = %archive_path.display(), "Archive written");
    Ok(archive_path)
}

/// Cut a file into consecutive parts of at most `part_size` bytes.
///
/// Parts are written next to the file as `<name>.001`, `<name>.002`, …
/// End of input is detected before a part is created, so an input whose size
/// is an exact multiple of `part_size` never yields an empty trailing part.
/// The input itself is left in place.
pub fn slice(path: &Path, part_size: u64) -> Result<Vec<PathBuf>, ArchiveError> {
    if part_size == 0 {
        return Err(ArchiveError::InvalidPartSize);
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ArchiveError::NotAFile(path.to_path_buf()))?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    let read_err = |source: io::Error| ArchiveError::Read {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(read_err)?;
    let mut reader = BufReader::with_capacity(SLICE_BUFFER_SIZE, file);
    let mut parts = Vec::new();

    for number in 1u32.. {
        if reader.fill_buf().map_err(read_err)?.is_empty() {
            break;
        }

        let part_path = dir.join(part_name(&name, number));
        let write_err = |source: io::Error| ArchiveError::WritePart {
            path: part_path.clone(),
            source,
        };

        let mut writer = BufWriter::new(File::create(&part_path).map_err(write_err)?);
        io::copy(&mut (&mut reader).take(part_size), &mut writer).map_err(write_err)?;
        writer.flush().map_err(write_err)?;

        parts.push(part_path);
    }

    Ok(parts)
}

fn remove(path: &Path) -> Result<(), ArchiveError> {
    fs::remove_file(path).map_err(|source| ArchiveError::Remove {
        path: path.to_path_buf(),
        source,
    })
}

//! Index-addressable view of each user's files.
//!
//! A listing captures the sorted filenames of a namespace into a per-user
//! snapshot. Numeric indices given later are resolved against that snapshot
//! only; it is not re-validated when files change. A name resolved from a
//! stale snapshot is checked against storage by [`FileRegistry::resolve_stored`]
//! and reported as missing if the file is gone.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use thiserror::Error;
use tracing::debug;

use crate::config::format_size;
use crate::storage::{Storage, StorageError, StoredFile, UserId};

/// Failure to map an index to a stored file.
#[derive(Debug, Error)]
pub enum LookupError {
    /// No listing has been taken for this user.
    #[error("no file list yet, list files first")]
    NoSnapshot,

    /// The index is outside the snapshot.
    #[error("index {index} out of range (0..{len})")]
    OutOfRange { index: usize, len: usize },

    /// The snapshot names a file that no longer exists.
    #[error("file no longer exists: {0}")]
    Missing(String),

    /// Storage failed while checking the file.
    #[error(transparent)]
    Storage(StorageError),
}

/// Filenames captured by one listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileListSnapshot {
    /// Filenames in listing order.
    pub filenames: Vec<String>,
    /// When the listing was taken.
    pub captured_at: DateTime<Utc>,
}

/// Result of a listing: display text plus the ordered names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub text: String,
    pub filenames: Vec<String>,
}

/// Text shown for an empty namespace.
pub const EMPTY_FOLDER_TEXT: &str = "Folder is empty.";

/// Per-user snapshots keyed by user id.
#[derive(Debug)]
pub struct FileRegistry {
    storage: Storage,
    snapshots: DashMap<UserId, FileListSnapshot>,
}

impl FileRegistry {
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            snapshots: DashMap::new(),
        }
    }

    /// List a namespace and replace the user's snapshot with the result.
    pub fn list(&self, user: UserId) -> Result<Listing, StorageError> {
        let files = self.storage.list_files(user)?;
        let filenames: Vec<String> = files.iter().map(|f| f.name.clone()).collect();

        let text = if files.is_empty() {
            EMPTY_FOLDER_TEXT.to_string()
        } else {
            render_listing(&files)
        };

        self.snapshots.insert(
            user,
            FileListSnapshot {
                filenames: filenames.clone(),
                captured_at: Utc::now(),
            },
        );
        debug!(user = %user, files = filenames.len(), "File list captured");

        Ok(Listing { text, filenames })
    }

    /// Filename at a 0-based position of the user's snapshot.
    pub fn resolve(&self, user: UserId, index: usize) -> Result<String, LookupError> {
        let snapshot = self.snapshots.get(&user).ok_or(LookupError::NoSnapshot)?;
        snapshot
            .filenames
            .get(index)
            .cloned()
            .ok_or(LookupError::OutOfRange {
                index,
                len: snapshot.filenames.len(),
            })
    }

    /// Resolve an index and confirm the file still exists in storage.
    pub fn resolve_stored(&self, user: UserId, index: usize) -> Result<StoredFile, LookupError> {
        let name = self.resolve(user, index)?;
        self.storage.stat(user, &name).map_err(|e| match e {
            StorageError::NotFound(name) => LookupError::Missing(name),
            other => LookupError::Storage(other),
        })
    }

    /// Drop one name from the user's snapshot, keeping the rest in order.
    pub fn invalidate(&self, user: UserId, filename: &str) {
        if let Some(mut snapshot) = self.snapshots.get_mut(&user) {
            snapshot.filenames.retain(|name| name != filename);
        }
    }

    /// Forget the user's snapshot entirely.
    pub fn forget(&self, user: UserId) {
        self.snapshots.remove(&user);
    }

    /// Copy of the user's current snapshot.
    pub fn snapshot(&self, user: UserId) -> Option<FileListSnapshot> {
        self.snapshots.get(&user).map(|s| s.clone())
    }
}

fn render_listing(files: &[StoredFile]) -> String {
    let mut lines = Vec::with_capacity(files.len() + 1);
    lines.push("Your files (use the number):".to_string());
    for (i, file) in files.iter().enumerate() {
        lines.push(format!("{}. {} ({})", i, file.name, format_size(file.size)));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn registry_with(files: &[&str]) -> (TempDir, Storage, FileRegistry) {
        let temp = TempDir::new().unwrap();
        let storage = Storage::new(temp.path());
        let dir = storage.namespace(UserId(1)).unwrap();
        for name in files {
            fs::write(dir.join(name), name.as_bytes()).unwrap();
        }
        let registry = FileRegistry::new(storage.clone());
        (temp, storage, registry)
    }

    #[test]
    fn test_list_numbers_sorted_files() {
        let (_temp, _storage, registry) = registry_with(&["c.txt", "a.txt", "b.txt"]);

        let listing = registry.list(UserId(1)).unwrap();

        assert_eq!(listing.filenames, vec!["a.txt", "b.txt", "c.txt"]);
        assert!(listing.text.starts_with("Your files"));
        assert!(listing.text.contains("0. a.txt"));
        assert!(listing.text.contains("2. c.txt"));
    }

    #[test]
    fn test_resolve_matches_listing_positions() {
        let (_temp, _storage, registry) = registry_with(&["b.bin", "a.bin", "c.bin"]);
        let listing = registry.list(UserId(1)).unwrap();

        for (i, name) in listing.filenames.iter().enumerate() {
            assert_eq!(&registry.resolve(UserId(1), i).unwrap(), name);
        }
        assert!(matches!(
            registry.resolve(UserId(1), 3),
            Err(LookupError::OutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_resolve_without_listing() {
        let (_temp, _storage, registry) = registry_with(&["a.txt"]);
        assert!(matches!(
            registry.resolve(UserId(1), 0),
            Err(LookupError::NoSnapshot)
        ));
    }

    #[test]
    fn test_empty_listing_still_captures_snapshot() {
        let (_temp, _storage, registry) = registry_with(&[]);

        let listing = registry.list(UserId(1)).unwrap();

        assert_eq!(listing.text, EMPTY_FOLDER_TEXT);
        assert!(listing.filenames.is_empty());
        assert!(matches!(
            registry.resolve(UserId(1), 0),
            Err(LookupError::OutOfRange { index: 0, len: 0 })
        ));
    }

    #[test]
    fn test_invalidate_removes_single_entry() {
        let (_temp, storage, registry) = registry_with(&["a", "b", "c"]);
        registry.list(UserId(1)).unwrap();

        storage.remove(UserId(1), "b").unwrap();
        registry.invalidate(UserId(1), "b");

        // the removed name never comes back without a new listing
        assert_eq!(registry.resolve(UserId(1), 1).unwrap(), "c");
        assert!(registry.resolve(UserId(1), 2).is_err());
        assert_eq!(registry.snapshot(UserId(1)).unwrap().filenames, vec!["a", "c"]);
    }

    #[test]
    fn test_stale_snapshot_reports_missing() {
        let (_temp, storage, registry) = registry_with(&["a", "b"]);
        registry.list(UserId(1)).unwrap();

        // deleted behind the registry's back, e.g. by the retention sweep
        storage.remove(UserId(1), "a").unwrap();

        assert_eq!(registry.resolve(UserId(1), 0).unwrap(), "a");
        assert!(matches!(
            registry.resolve_stored(UserId(1), 0),
            Err(LookupError::Missing(name)) if name == "a"
        ));
        assert_eq!(registry.resolve_stored(UserId(1), 1).unwrap().name, "b");
    }

    #[test]
    fn test_new_listing_replaces_snapshot() {
        let (_temp, storage, registry) = registry_with(&["a"]);
        registry.list(UserId(1)).unwrap();
        let first = registry.snapshot(UserId(1)).unwrap();

        let dir = storage.namespace(UserId(1)).unwrap();
        fs::write(dir.join("0-first"), b"x").unwrap();
        registry.list(UserId(1)).unwrap();

        let second = registry.snapshot(UserId(1)).unwrap();
        assert_eq!(second.filenames, vec!["0-first", "a"]);
        assert!(second.captured_at >= first.captured_at);
    }

    #[test]
    fn test_forget_drops_snapshot() {
        let (_temp, _storage, registry) = registry_with(&["a"]);
        registry.list(UserId(1)).unwrap();
        registry.forget(UserId(1));
        assert!(registry.snapshot(UserId(1)).is_none());
    }
}

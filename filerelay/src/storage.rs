//! Per-user storage namespaces.
//!
//! Every user owns one directory directly under the storage root, named after
//! the decimal user id. Directories are created lazily the first time any
//! operation touches them. The filesystem modification time is the only
//! temporal metadata kept; nothing else is persisted alongside the files.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;

/// Opaque identity of a user, supplied by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors raised by namespace operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The named file does not exist in the user's namespace.
    #[error("file not found: {0}")]
    NotFound(String),

    /// The filename would escape the namespace directory.
    #[error("invalid filename: {0:?}")]
    InvalidName(String),

    /// Filesystem failure.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A regular file stored in a namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Filename, unique within the namespace.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified: SystemTime,
}

/// Root of all user namespaces.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Create a storage handle over the given root. Nothing is created yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The storage root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if it is missing.
    pub fn ensure_root(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root).map_err(|e| StorageError::io(&self.root, e))
    }

    /// Directory of a user's namespace, created if absent.
    pub fn namespace(&self, user: UserId) -> Result<PathBuf, StorageError> {
        let dir = self.root.join(user.to_string());
        fs::create_dir_all(&dir).map_err(|e| StorageError::io(&dir, e))?;
        Ok(dir)
    }

    /// Path of a file inside a user's namespace. The file need not exist.
    pub fn file_path(&self, user: UserId, name: &str) -> Result<PathBuf, StorageError> {
        validate_name(name)?;
        Ok(self.namespace(user)?.join(name))
    }

    /// Regular files of a namespace, sorted lexicographically by name.
    pub fn list_files(&self, user: UserId) -> Result<Vec<StoredFile>, StorageError> {
        let dir = self.namespace(user)?;
        let mut files = read_regular_files(&dir)?;
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    /// Whether the namespace holds any entry at all.
    pub fn is_empty(&self, user: UserId) -> Result<bool, StorageError> {
        let dir = self.namespace(user)?;
        let mut entries = fs::read_dir(&dir).map_err(|e| StorageError::io(&dir, e))?;
        Ok(entries.next().is_none())
    }

    /// Look up a file, failing with [`StorageError::NotFound`] if it is gone.
    pub fn stat(&self, user: UserId, name: &str) -> Result<StoredFile, StorageError> {
        let path = self.file_path(user, name)?;
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Ok(StoredFile {
                name: name.to_string(),
                size: meta.len(),
                modified: meta.modified().map_err(|e| StorageError::io(&path, e))?,
            }),
            Ok(_) => Err(StorageError::NotFound(name.to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(name.to_string()))
            }
            Err(e) => Err(StorageError::io(&path, e)),
        }
    }

    /// Delete one file from a namespace.
    pub fn remove(&self, user: UserId, name: &str) -> Result<(), StorageError> {
        let path = self.file_path(user, name)?;
        fs::remove_file(&path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                StorageError::NotFound(name.to_string())
            } else {
                StorageError::io(&path, e)
            }
        })
    }

    /// Destroy a namespace and recreate it empty.
    ///
    /// Returns `false` without touching anything if it was already empty.
    pub fn clear(&self, user: UserId) -> Result<bool, StorageError> {
        if self.is_empty(user)? {
            return Ok(false);
        }
        let dir = self.root.join(user.to_string());
        fs::remove_dir_all(&dir).map_err(|e| StorageError::io(&dir, e))?;
        fs::create_dir_all(&dir).map_err(|e| StorageError::io(&dir, e))?;
        Ok(true)
    }

    /// All namespace directories currently under the root.
    ///
    /// A missing root yields an empty list.
    pub fn namespace_dirs(&self) -> Result<Vec<PathBuf>, StorageError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(&self.root, e)),
        };

        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io(&self.root, e))?;
            let file_type = entry
                .file_type()
                .map_err(|e| StorageError::io(&entry.path(), e))?;
            if file_type.is_dir() {
                dirs.push(entry.path());
            }
        }
        Ok(dirs)
    }
}

/// Regular files directly inside `dir`, in directory order.
pub(crate) fn read_regular_files(dir: &Path) -> Result<Vec<StoredFile>, StorageError> {
    let entries = fs::read_dir(dir).map_err(|e| StorageError::io(dir, e))?;
    let mut files = Vec::new();

    for entry in entries {
        let entry = entry.map_err(|e| StorageError::io(dir, e))?;
        let path = entry.path();
        let meta = match entry.metadata() {
            Ok(meta) => meta,
            // raced with a concurrent delete
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(StorageError::io(&path, e)),
        };
        if !meta.is_file() {
            continue;
        }
        files.push(StoredFile {
            name: entry.file_name().to_string_lossy().into_owned(),
            size: meta.len(),
            modified: meta.modified().map_err(|e| StorageError::io(&path, e))?,
        });
    }
    Ok(files)
}

fn validate_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage() -> (TempDir, Storage) {
        let temp = TempDir::new().unwrap();
        let storage = Storage::new(temp.path().join("root"));
        (temp, storage)
    }

    #[test]
    fn test_namespace_created_lazily_and_idempotently() {
        let (_temp, storage) = storage();
        let user = UserId(42);

        let dir = storage.namespace(user).unwrap();
        assert!(dir.is_dir());
        assert!(dir.ends_with("42"));

        // second call is a no-op
        assert_eq!(storage.namespace(user).unwrap(), dir);
    }

    #[test]
    fn test_list_files_sorted_and_regular_only() {
        let (_temp, storage) = storage();
        let user = UserId(1);
        let dir = storage.namespace(user).unwrap();

        fs::write(dir.join("b.txt"), b"bb").unwrap();
        fs::write(dir.join("a.txt"), b"a").unwrap();
        fs::create_dir(dir.join("subdir")).unwrap();

        let files = storage.list_files(user).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        assert_eq!(files[1].size, 2);
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let (_temp, storage) = storage();
        let dir = storage.namespace(UserId(1)).unwrap();
        fs::write(dir.join("mine.bin"), b"x").unwrap();

        assert!(storage.list_files(UserId(2)).unwrap().is_empty());
    }

    #[test]
    fn test_remove_missing_file_is_not_found() {
        let (_temp, storage) = storage();
        let err = storage.remove(UserId(1), "ghost.txt").unwrap_err();
        assert!(matches!(err, StorageError::NotFound(name) if name == "ghost.txt"));
    }

    #[test]
    fn test_stat_reports_size() {
        let (_temp, storage) = storage();
        let dir = storage.namespace(UserId(3)).unwrap();
        fs::write(dir.join("data.bin"), vec![0u8; 128]).unwrap();

        let file = storage.stat(UserId(3), "data.bin").unwrap();
        assert_eq!(file.size, 128);
        assert!(matches!(
            storage.stat(UserId(3), "other.bin"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_clear_recreates_empty_namespace() {
        let (_temp, storage) = storage();
        let user = UserId(7);
        let dir = storage.namespace(user).unwrap();
        fs::write(dir.join("one"), b"1").unwrap();
        fs::write(dir.join("two"), b"2").unwrap();

        assert!(storage.clear(user).unwrap());
        assert!(dir.is_dir());
        assert!(storage.is_empty(user).unwrap());

        // clearing an empty namespace reports nothing to do
        assert!(!storage.clear(user).unwrap());
    }

    #[test]
    fn test_file_path_rejects_traversal() {
        let (_temp, storage) = storage();
        for bad in ["", ".", "..", "../etc/passwd", "a/b"] {
            assert!(matches!(
                storage.file_path(UserId(1), bad),
                Err(StorageError::InvalidName(_))
            ));
        }
    }

    #[test]
    fn test_namespace_dirs_missing_root() {
        let (_temp, storage) = storage();
        assert!(storage.namespace_dirs().unwrap().is_empty());

        storage.namespace(UserId(1)).unwrap();
        storage.namespace(UserId(2)).unwrap();
        fs::write(storage.root().join("stray-file"), b"x").unwrap();
        assert_eq!(storage.namespace_dirs().unwrap().len(), 2);
    }
}

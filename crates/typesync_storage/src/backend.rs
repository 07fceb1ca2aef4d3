//! Snapshot backend trait definition.

use crate::error::StorageResult;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A file listed by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    /// Full path of the file.
    pub path: PathBuf,
    /// When the file was created.
    pub created: SystemTime,
}

impl EntryInfo {
    /// Returns the file name component as UTF-8, if it has one.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

/// A store of whole-file snapshots.
///
/// Backends are **opaque file stores**. They read and replace whole files and
/// list directories; they know nothing about documents, archives or
/// retention. The versioned writer in `typesync_core` owns all of that.
///
/// # Invariants
///
/// - `write` replaces the whole file and never creates directories
/// - `list` and `walk` on a missing directory return an empty list
/// - Backends must be `Send + Sync` so one writer can be shared
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
pub trait SnapshotBackend: Send + Sync {
    /// Returns true if a file exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Returns true if a directory exists at `path`.
    fn dir_exists(&self, path: &Path) -> bool;

    /// Reads the whole file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if there is no file, or an I/O error.
    fn read(&self, path: &Path) -> StorageResult<Vec<u8>>;

    /// Writes `data` as the whole content of `path`.
    ///
    /// # Errors
    ///
    /// Returns `MissingDirectory` if the parent directory does not exist,
    /// or an I/O error.
    fn write(&self, path: &Path, data: &[u8]) -> StorageResult<()>;

    /// Creates `path` and all missing ancestors.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    fn create_dir_all(&self, path: &Path) -> StorageResult<()>;

    /// Copies the file at `from` to `to`, replacing `to` if present.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `from` is missing, `MissingDirectory` if the
    /// parent of `to` is missing, or an I/O error.
    fn copy(&self, from: &Path, to: &Path) -> StorageResult<()>;

    /// Removes the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if there is no file, or an I/O error.
    fn remove(&self, path: &Path) -> StorageResult<()>;

    /// Lists the files directly inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be read.
    fn list(&self, dir: &Path) -> StorageResult<Vec<EntryInfo>>;

    /// Lists every file below `dir`, at any depth.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory exists but cannot be read.
    fn walk(&self, dir: &Path) -> StorageResult<Vec<EntryInfo>>;
}

//! File-based snapshot backend.

use crate::backend::{EntryInfo, SnapshotBackend};
use crate::error::{StorageError, StorageResult};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::SystemTime;

/// A snapshot backend over OS file APIs.
///
/// Paths are used as given; callers resolve them against their own roots.
///
/// # Durability
///
/// `write` syncs the file to disk before returning, so a snapshot reported
/// as written survives a crash.
///
/// # Example
///
/// ```no_run
/// use typesync_storage::{FileBackend, SnapshotBackend};
/// use std::path::Path;
///
/// let backend = FileBackend::new();
/// backend.create_dir_all(Path::new("sync/DocumentType")).unwrap();
/// backend.write(Path::new("sync/DocumentType/home.json"), b"{}").unwrap();
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct FileBackend;

impl FileBackend {
    /// Creates a file backend.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn entry(path: &Path, metadata: &fs::Metadata) -> EntryInfo {
        // Not every file system records creation time
        let created = metadata
            .created()
            .or_else(|_| metadata.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        EntryInfo {
            path: path.to_path_buf(),
            created,
        }
    }

    fn map_missing(err: io::Error, path: &Path) -> StorageError {
        match err.kind() {
            io::ErrorKind::NotFound => StorageError::not_found(path),
            io::ErrorKind::PermissionDenied => StorageError::permission_denied(path),
            _ => StorageError::Io(err),
        }
    }

    fn walk_into(dir: &Path, out: &mut Vec<EntryInfo>) -> StorageResult<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if metadata.is_dir() {
                Self::walk_into(&entry.path(), out)?;
            } else if metadata.is_file() {
                out.push(Self::entry(&entry.path(), &metadata));
            }
        }
        Ok(())
    }
}

impl SnapshotBackend for FileBackend {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn dir_exists(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read(&self, path: &Path) -> StorageResult<Vec<u8>> {
        fs::read(path).map_err(|e| Self::map_missing(e, path))
    }

    fn write(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                return Err(StorageError::missing_directory(parent));
            }
        }

        let mut file = fs::File::create(path).map_err(|e| Self::map_missing(e, path))?;
        file.write_all(data)?;
        file.sync_all()?;
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> StorageResult<()> {
        fs::create_dir_all(path).map_err(|e| Self::map_missing(e, path))
    }

    fn copy(&self, from: &Path, to: &Path) -> StorageResult<()> {
        if !from.is_file() {
            return Err(StorageError::not_found(from));
        }
        if let Some(parent) = to.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                return Err(StorageError::missing_directory(parent));
            }
        }
        fs::copy(from, to).map_err(|e| Self::map_missing(e, to))?;
        Ok(())
    }

    fn remove(&self, path: &Path) -> StorageResult<()> {
        fs::remove_file(path).map_err(|e| Self::map_missing(e, path))
    }

    fn list(&self, dir: &Path) -> StorageResult<Vec<EntryInfo>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if metadata.is_file() {
                entries.push(Self::entry(&entry.path(), &metadata));
            }
        }
        Ok(entries)
    }

    fn walk(&self, dir: &Path) -> StorageResult<Vec<EntryInfo>> {
        let mut entries = Vec::new();
        if dir.is_dir() {
            Self::walk_into(dir, &mut entries)?;
        }
        Ok(entries)
    }
}

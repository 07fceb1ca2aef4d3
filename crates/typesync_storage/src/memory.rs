//! In-memory snapshot backend for testing.

use crate::backend::{EntryInfo, SnapshotBackend};
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

#[derive(Debug)]
struct MemFile {
    data: Vec<u8>,
    created: SystemTime,
}

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<PathBuf, MemFile>,
    dirs: BTreeSet<PathBuf>,
    /// Bumped on every file creation; gives a strict creation order.
    ticks: u64,
    /// Writes below these prefixes fail with `PermissionDenied`.
    read_only: Vec<PathBuf>,
}

impl State {
    fn parent_exists(&self, path: &Path) -> bool {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => self.dirs.contains(parent),
            _ => true,
        }
    }

    fn check_writable(&self, path: &Path) -> StorageResult<()> {
        if self.read_only.iter().any(|prefix| path.starts_with(prefix)) {
            return Err(StorageError::permission_denied(path));
        }
        if !self.parent_exists(path) {
            let parent = path.parent().unwrap_or(path);
            return Err(StorageError::missing_directory(parent));
        }
        Ok(())
    }

    fn store(&mut self, path: &Path, data: Vec<u8>) {
        // Replacing a file keeps its creation time, like a real file system
        if let Some(file) = self.files.get_mut(path) {
            file.data = data;
            return;
        }
        self.ticks += 1;
        let created = SystemTime::UNIX_EPOCH + Duration::from_millis(self.ticks);
        self.files
            .insert(path.to_path_buf(), MemFile { data, created });
    }
}

/// An in-memory snapshot backend.
///
/// Creation times come from a counter rather than the wall clock, so files
/// created in sequence always list in that sequence. Suitable for:
/// - Unit tests
/// - Integration tests
/// - Failure injection via [`InMemoryBackend::deny_writes_under`]
///
/// # Example
///
/// ```rust
/// use typesync_storage::{InMemoryBackend, SnapshotBackend};
/// use std::path::Path;
///
/// let backend = InMemoryBackend::new();
/// backend.create_dir_all(Path::new("sync")).unwrap();
/// backend.write(Path::new("sync/home.json"), b"{}").unwrap();
/// assert!(backend.exists(Path::new("sync/home.json")));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: RwLock<State>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every write, copy or removal below `prefix` fail.
    pub fn deny_writes_under(&self, prefix: impl Into<PathBuf>) {
        self.state.write().read_only.push(prefix.into());
    }

    /// Returns all file paths currently stored, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.state.read().files.keys().cloned().collect()
    }

    /// Number of stored files.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.state.read().files.len()
    }
}

impl SnapshotBackend for InMemoryBackend {
    fn exists(&self, path: &Path) -> bool {
        self.state.read().files.contains_key(path)
    }

    fn dir_exists(&self, path: &Path) -> bool {
        self.state.read().dirs.contains(path)
    }

    fn read(&self, path: &Path) -> StorageResult<Vec<u8>> {
        self.state
            .read()
            .files
            .get(path)
            .map(|f| f.data.clone())
            .ok_or_else(|| StorageError::not_found(path))
    }

    fn write(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        let mut state = self.state.write();
        state.check_writable(path)?;
        state.store(path, data.to_vec());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> StorageResult<()> {
        let mut state = self.state.write();
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            state.dirs.insert(ancestor.to_path_buf());
        }
        Ok(())
    }

    fn copy(&self, from: &Path, to: &Path) -> StorageResult<()> {
        let mut state = self.state.write();
        let data = state
            .files
            .get(from)
            .map(|f| f.data.clone())
            .ok_or_else(|| StorageError::not_found(from))?;
        state.check_writable(to)?;
        state.store(to, data);
        Ok(())
    }

    fn remove(&self, path: &Path) -> StorageResult<()> {
        let mut state = self.state.write();
        if state.read_only.iter().any(|prefix| path.starts_with(prefix)) {
            return Err(StorageError::permission_denied(path));
        }
        state
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StorageError::not_found(path))
    }

    fn list(&self, dir: &Path) -> StorageResult<Vec<EntryInfo>> {
        Ok(self
            .state
            .read()
            .files
            .iter()
            .filter(|(path, _)| path.parent() == Some(dir))
            .map(|(path, file)| EntryInfo {
                path: path.clone(),
                created: file.created,
            })
            .collect())
    }

    fn walk(&self, dir: &Path) -> StorageResult<Vec<EntryInfo>> {
        Ok(self
            .state
            .read()
            .files
            .iter()
            .filter(|(path, _)| path.starts_with(dir) && path.as_path() != dir)
            .map(|(path, file)| EntryInfo {
                path: path.clone(),
                created: file.created,
            })
            .collect())
    }
}

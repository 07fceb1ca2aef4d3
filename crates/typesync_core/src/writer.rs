//! Versioned snapshot writer.
//!
//! Every replacement or deletion of a live snapshot first copies the old
//! file into the archive tree under a timestamped name, then removes it.
//! Archival is best effort: a failed copy is logged and the write goes on.
//!
//! ## Write sequence
//!
//! 1. Pause the folder watcher and emit [`WriterEvent::Saving`]
//! 2. Create the containing folder if missing
//! 3. If a file exists: archive it (when versioning), emit
//!    [`WriterEvent::Deleting`], remove it, emit [`WriterEvent::Deleted`]
//! 4. Write the new file and emit [`WriterEvent::Saved`]
//! 5. Resume the watcher
//!
//! Writers to the same file are serialized by a per-path lock.

use crate::config::SyncSettings;
use crate::error::CoreResult;
use crate::layout::{SnapshotPath, SyncLayout};
use crate::watch::WatchGate;
use chrono::{Local, NaiveDateTime};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use typesync_codec::{from_json_str, to_json_string, Value};
use typesync_storage::{EntryInfo, SnapshotBackend};

/// Source of archive timestamps.
pub trait Clock: Send + Sync {
    /// Current local time.
    fn now(&self) -> NaiveDateTime;
}

/// The local wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    /// Creates a clock stopped at `at`.
    #[must_use]
    pub fn new(at: NaiveDateTime) -> Self {
        Self { now: Mutex::new(at) }
    }

    /// Moves the clock forward.
    pub fn advance_secs(&self, seconds: i64) {
        let mut now = self.now.lock();
        *now += chrono::Duration::seconds(seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock()
    }
}

/// Lifecycle notifications, in the order they occur.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriterEvent {
    /// A snapshot is about to be written.
    Saving(PathBuf),
    /// A snapshot was written.
    Saved(PathBuf),
    /// A snapshot is about to be removed.
    Deleting(PathBuf),
    /// A snapshot was removed.
    Deleted(PathBuf),
}

/// Archiving options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionPolicy {
    /// Archive snapshots before replacing or deleting them.
    pub versions: bool,
    /// Archived versions kept per snapshot (0 = unlimited).
    pub max_versions: usize,
}

impl Default for VersionPolicy {
    fn default() -> Self {
        Self {
            versions: true,
            max_versions: 0,
        }
    }
}

impl From<&SyncSettings> for VersionPolicy {
    fn from(settings: &SyncSettings) -> Self {
        Self {
            versions: settings.versions,
            max_versions: settings.max_versions,
        }
    }
}

type Listener = Box<dyn Fn(&WriterEvent) + Send + Sync>;

/// Writes snapshots and keeps their archived versions.
pub struct VersionedWriter {
    backend: Arc<dyn SnapshotBackend>,
    layout: SyncLayout,
    policy: VersionPolicy,
    clock: Arc<dyn Clock>,
    gate: WatchGate,
    listeners: RwLock<Vec<Listener>>,
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl VersionedWriter {
    /// Creates a writer using the system clock.
    #[must_use]
    pub fn new(
        backend: Arc<dyn SnapshotBackend>,
        layout: SyncLayout,
        policy: VersionPolicy,
    ) -> Self {
        Self {
            backend,
            layout,
            policy,
            clock: Arc::new(SystemClock),
            gate: WatchGate::new(),
            listeners: RwLock::new(Vec::new()),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a writer from settings.
    #[must_use]
    pub fn from_settings(backend: Arc<dyn SnapshotBackend>, settings: &SyncSettings) -> Self {
        Self::new(
            backend,
            SyncLayout::from_settings(settings),
            VersionPolicy::from(settings),
        )
    }

    /// Replaces the clock used for archive timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Shares a watch gate with a folder watcher.
    #[must_use]
    pub fn with_gate(mut self, gate: WatchGate) -> Self {
        self.gate = gate;
        self
    }

    /// The watch gate paused during writes.
    #[must_use]
    pub fn gate(&self) -> &WatchGate {
        &self.gate
    }

    /// The path layout.
    #[must_use]
    pub fn layout(&self) -> &SyncLayout {
        &self.layout
    }

    /// The archiving options.
    #[must_use]
    pub fn policy(&self) -> VersionPolicy {
        self.policy
    }

    /// Registers a lifecycle listener.
    pub fn subscribe(&self, listener: impl Fn(&WriterEvent) + Send + Sync + 'static) {
        self.listeners.write().push(Box::new(listener));
    }

    /// Writes `doc` as the snapshot at `path`, archiving any previous one.
    ///
    /// Returns the file written.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be encoded or the new file
    /// cannot be written. Archival failures are logged, not returned.
    pub fn write(&self, path: &SnapshotPath, doc: &Value) -> CoreResult<PathBuf> {
        let file = self.layout.live_path(path);
        let text = to_json_string(doc)?;
        self.with_path_lock(&file, || self.replace(path, &file, &text))?;
        Ok(file)
    }

    fn replace(&self, path: &SnapshotPath, file: &Path, text: &str) -> CoreResult<()> {
        let _paused = self.gate.pause();
        self.emit(&WriterEvent::Saving(file.to_path_buf()));

        if let Some(dir) = file.parent() {
            if !dir.as_os_str().is_empty() && !self.backend.dir_exists(dir) {
                self.backend.create_dir_all(dir)?;
            }
        }
        if self.backend.exists(file) {
            self.retire(path, file)?;
        }

        self.backend.write(file, text.as_bytes())?;
        info!(file = %file.display(), "saved snapshot");
        self.emit(&WriterEvent::Saved(file.to_path_buf()));
        Ok(())
    }

    /// Archives and removes the snapshot at `path`.
    ///
    /// Returns false if there was nothing to delete.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be removed.
    pub fn delete(&self, path: &SnapshotPath) -> CoreResult<bool> {
        let file = self.layout.live_path(path);
        self.with_path_lock(&file, || {
            if !self.backend.exists(&file) {
                debug!(file = %file.display(), "nothing to delete");
                return Ok(false);
            }

            let _paused = self.gate.pause();
            self.retire(path, &file)?;
            info!(file = %file.display(), "deleted snapshot");
            Ok(true)
        })
    }

    /// Reads the snapshot at `path`, if there is one.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn read(&self, path: &SnapshotPath) -> CoreResult<Option<Value>> {
        let file = self.layout.live_path(path);
        if !self.backend.exists(&file) {
            return Ok(None);
        }
        self.read_file(&file).map(Some)
    }

    /// Reads and parses any snapshot file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid
    /// document.
    pub fn read_file(&self, file: &Path) -> CoreResult<Value> {
        let bytes = self.backend.read(file)?;
        let text = String::from_utf8(bytes).map_err(|e| {
            typesync_codec::CodecError::decoding_failed(format!("{}: {e}", file.display()))
        })?;
        Ok(from_json_str(&text)?)
    }

    /// Every live snapshot file of a type, shallowest folders first.
    ///
    /// # Errors
    ///
    /// Returns an error if the type folder cannot be listed.
    pub fn snapshot_files(&self, type_name: &str) -> CoreResult<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = self
            .backend
            .walk(&self.layout.type_root(type_name))?
            .into_iter()
            .map(|entry| entry.path)
            .filter(|path| self.layout.is_snapshot_file(path))
            .collect();
        files.sort_by(|a, b| {
            a.components()
                .count()
                .cmp(&b.components().count())
                .then_with(|| a.cmp(b))
        });
        Ok(files)
    }

    /// Archived versions of a snapshot, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive folder cannot be listed.
    pub fn archived_versions(&self, path: &SnapshotPath) -> CoreResult<Vec<EntryInfo>> {
        let mut versions: Vec<EntryInfo> = self
            .backend
            .list(&self.layout.archive_dir(path))?
            .into_iter()
            .filter(|entry| {
                entry
                    .file_name()
                    .is_some_and(|name| self.layout.is_archive_of(path, name))
            })
            .collect();
        versions.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.path.cmp(&a.path)));
        Ok(versions)
    }

    /// Archives (if enabled) then removes an existing snapshot file.
    fn retire(&self, path: &SnapshotPath, file: &Path) -> CoreResult<()> {
        if self.policy.versions {
            if let Err(error) = self.archive(path, file) {
                warn!(file = %file.display(), %error, "archiving failed, continuing");
            }
        }

        self.emit(&WriterEvent::Deleting(file.to_path_buf()));
        self.backend.remove(file)?;
        self.emit(&WriterEvent::Deleted(file.to_path_buf()));
        Ok(())
    }

    fn archive(&self, path: &SnapshotPath, file: &Path) -> CoreResult<PathBuf> {
        let target = self.layout.archive_path(path, self.clock.now());
        if let Some(dir) = target.parent() {
            if !self.backend.dir_exists(dir) {
                self.backend.create_dir_all(dir)?;
            }
        }
        // Same-second versions replace each other
        if self.backend.exists(&target) {
            self.backend.remove(&target)?;
        }
        self.backend.copy(file, &target)?;
        info!(archive = %target.display(), "archived snapshot");

        if self.policy.max_versions > 0 {
            self.enforce_retention(path)?;
        }
        Ok(target)
    }

    fn enforce_retention(&self, path: &SnapshotPath) -> CoreResult<()> {
        let versions = self.archived_versions(path)?;
        for old in versions.iter().skip(self.policy.max_versions) {
            self.backend.remove(&old.path)?;
            debug!(archive = %old.path.display(), "dropped old version");
        }
        Ok(())
    }

    /// Runs `f` holding the lock of `file`.
    ///
    /// The lock entry is dropped once no other caller holds it, so the map
    /// only tracks files with a write in flight.
    fn with_path_lock<T>(&self, file: &Path, f: impl FnOnce() -> T) -> T {
        let lock = Arc::clone(self.locks.lock().entry(file.to_path_buf()).or_default());
        let result = {
            let _held = lock.lock();
            f()
        };

        let mut locks = self.locks.lock();
        drop(lock);
        if locks.get(file).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(file);
        }
        result
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.locks.lock().len()
    }

    fn emit(&self, event: &WriterEvent) {
        for listener in self.listeners.read().iter() {
            listener(event);
        }
    }
}

//! Snapshot and archive paths.
//!
//! ```text
//! <root>/<TypeFolder>/<relative>/<name>.<ext>                  live snapshot
//! <archive>/<TypeFolder>/<relative>/<name>_<ddMMyy_HHmmss>.<ext>  archived version
//! ```
//!
//! `TypeFolder` is the last dot-separated segment of the type name, so
//! `cms.DocumentType` lands in `DocumentType/`.

use crate::config::SyncSettings;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

/// `chrono` format of archive timestamps.
pub const ARCHIVE_STAMP_FORMAT: &str = "%d%m%y_%H%M%S";

/// Length of a formatted archive timestamp.
pub const ARCHIVE_STAMP_LEN: usize = 13;

const INVALID_FILE_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Last dot-separated segment of a type name.
#[must_use]
pub fn type_folder(type_name: &str) -> &str {
    type_name.rsplit('.').next().unwrap_or(type_name)
}

/// Removes characters that are not allowed in file names.
#[must_use]
pub fn scrub_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_control() && !INVALID_FILE_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Logical location of one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPath {
    /// Type name, such as `cms.DocumentType`.
    pub type_name: String,
    /// Folder below the type folder.
    pub relative: PathBuf,
    /// File name without extension.
    pub name: String,
}

impl SnapshotPath {
    /// Creates a path directly inside the type folder.
    #[must_use]
    pub fn new(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            relative: PathBuf::new(),
            name: name.into(),
        }
    }

    /// Places the snapshot in a sub-folder of the type folder.
    #[must_use]
    pub fn with_relative(mut self, relative: impl Into<PathBuf>) -> Self {
        self.relative = relative.into();
        self
    }

    /// The file name stem as written to disk.
    #[must_use]
    pub fn file_stem(&self) -> String {
        scrub_file_name(&self.name)
    }
}

/// Resolves logical snapshot paths to files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncLayout {
    root: PathBuf,
    archive_root: PathBuf,
    extension: String,
}

impl SyncLayout {
    /// Creates a layout.
    #[must_use]
    pub fn new(
        root: impl Into<PathBuf>,
        archive_root: impl Into<PathBuf>,
        extension: impl Into<String>,
    ) -> Self {
        let extension: String = extension.into();
        Self {
            root: root.into(),
            archive_root: archive_root.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// Creates a layout from settings.
    #[must_use]
    pub fn from_settings(settings: &SyncSettings) -> Self {
        Self::new(&settings.folder, &settings.archive, &settings.extension)
    }

    /// Root folder of live snapshots.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Root folder of archives.
    #[must_use]
    pub fn archive_root(&self) -> &Path {
        &self.archive_root
    }

    /// Snapshot file extension, without the dot.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Folder holding every live snapshot of a type.
    #[must_use]
    pub fn type_root(&self, type_name: &str) -> PathBuf {
        self.root.join(type_folder(type_name))
    }

    /// File of the live snapshot.
    #[must_use]
    pub fn live_path(&self, path: &SnapshotPath) -> PathBuf {
        self.type_root(&path.type_name)
            .join(&path.relative)
            .join(format!("{}.{}", path.file_stem(), self.extension))
    }

    /// Folder holding the archived versions of a snapshot.
    #[must_use]
    pub fn archive_dir(&self, path: &SnapshotPath) -> PathBuf {
        self.archive_root
            .join(type_folder(&path.type_name))
            .join(&path.relative)
    }

    /// File of the version archived at `at`.
    #[must_use]
    pub fn archive_path(&self, path: &SnapshotPath, at: NaiveDateTime) -> PathBuf {
        self.archive_dir(path).join(format!(
            "{}_{}.{}",
            path.file_stem(),
            at.format(ARCHIVE_STAMP_FORMAT),
            self.extension
        ))
    }

    /// Returns true if `file_name` names an archived version of `path`.
    #[must_use]
    pub fn is_archive_of(&self, path: &SnapshotPath, file_name: &str) -> bool {
        let Some(rest) = file_name
            .strip_prefix(path.file_stem().as_str())
            .and_then(|r| r.strip_prefix('_'))
        else {
            return false;
        };
        let Some(stamp) = rest
            .strip_suffix(self.extension.as_str())
            .and_then(|r| r.strip_suffix('.'))
        else {
            return false;
        };
        stamp.len() == ARCHIVE_STAMP_LEN
            && NaiveDateTime::parse_from_str(stamp, ARCHIVE_STAMP_FORMAT).is_ok()
    }

    /// Returns true if `file` is a live snapshot (has the snapshot extension).
    #[must_use]
    pub fn is_snapshot_file(&self, file: &Path) -> bool {
        file.extension().and_then(|e| e.to_str()) == Some(self.extension.as_str())
    }
}

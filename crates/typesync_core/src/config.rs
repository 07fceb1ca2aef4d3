//! Sync settings.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings for a sync root.
///
/// Read from a JSON file with camelCase keys; every key is optional.
///
/// ```json
/// { "folder": "sync", "versions": true, "maxVersions": 5 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncSettings {
    /// Import snapshots into the live model on startup.
    pub read: bool,

    /// Export every live content type on startup.
    pub write: bool,

    /// Export a content type whenever it is saved or deleted.
    pub attach: bool,

    /// Root folder of live snapshots.
    pub folder: PathBuf,

    /// Root folder of archived snapshots.
    pub archive: PathBuf,

    /// Archive the previous snapshot before replacing it.
    pub versions: bool,

    /// Archived versions kept per snapshot (0 = unlimited).
    pub max_versions: usize,

    /// Remove live properties that the document no longer lists.
    pub delete_property_values: bool,

    /// Snapshot file extension, without the dot.
    pub extension: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            read: true,
            write: false,
            attach: true,
            folder: PathBuf::from("sync"),
            archive: PathBuf::from("sync.archive"),
            versions: true,
            max_versions: 0,
            delete_property_values: false,
            extension: "json".to_string(),
        }
    }
}

impl SyncSettings {
    /// Creates settings with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads settings from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read or `Config` if it is not
    /// valid settings JSON.
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Parses settings from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the text is not valid settings JSON.
    pub fn from_json(text: &str) -> CoreResult<Self> {
        let settings: Self =
            serde_json::from_str(text).map_err(|e| CoreError::config(e.to_string()))?;
        if settings.extension.trim().is_empty() {
            return Err(CoreError::config("extension must not be empty"));
        }
        Ok(settings)
    }

    /// Sets whether snapshots are imported on startup.
    #[must_use]
    pub const fn read(mut self, value: bool) -> Self {
        self.read = value;
        self
    }

    /// Sets whether live content types are exported on startup.
    #[must_use]
    pub const fn write(mut self, value: bool) -> Self {
        self.write = value;
        self
    }

    /// Sets whether saves and deletes are exported as they happen.
    #[must_use]
    pub const fn attach(mut self, value: bool) -> Self {
        self.attach = value;
        self
    }

    /// Sets the snapshot root folder.
    #[must_use]
    pub fn folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.folder = folder.into();
        self
    }

    /// Sets the archive root folder.
    #[must_use]
    pub fn archive(mut self, archive: impl Into<PathBuf>) -> Self {
        self.archive = archive.into();
        self
    }

    /// Sets whether previous snapshots are archived.
    #[must_use]
    pub const fn versions(mut self, value: bool) -> Self {
        self.versions = value;
        self
    }

    /// Sets how many archived versions are kept.
    #[must_use]
    pub const fn max_versions(mut self, count: usize) -> Self {
        self.max_versions = count;
        self
    }

    /// Sets whether unmatched live properties are removed.
    #[must_use]
    pub const fn delete_property_values(mut self, value: bool) -> Self {
        self.delete_property_values = value;
        self
    }

    /// Sets the snapshot file extension.
    #[must_use]
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = SyncSettings::default();
        assert!(settings.read);
        assert!(!settings.write);
        assert!(settings.versions);
        assert_eq!(settings.max_versions, 0);
        assert!(!settings.delete_property_values);
        assert_eq!(settings.extension, "json");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let settings =
            SyncSettings::from_json(r#"{ "maxVersions": 3, "deletePropertyValues": true }"#)
                .unwrap();
        assert_eq!(settings.max_versions, 3);
        assert!(settings.delete_property_values);
        assert_eq!(settings.folder, PathBuf::from("sync"));
    }

    #[test]
    fn empty_extension_rejected() {
        let result = SyncSettings::from_json(r#"{ "extension": " " }"#);
        assert!(matches!(result, Err(CoreError::Config { .. })));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typesync.json");
        fs::write(&path, r#"{ "folder": "data/sync", "write": true }"#).unwrap();

        let settings = SyncSettings::load(&path).unwrap();
        assert!(settings.write);
        assert_eq!(settings.folder, PathBuf::from("data/sync"));
    }

    #[test]
    fn builder() {
        let settings = SyncSettings::new()
            .folder("a")
            .archive("b")
            .max_versions(2)
            .versions(false);
        assert_eq!(settings.folder, PathBuf::from("a"));
        assert_eq!(settings.archive, PathBuf::from("b"));
        assert_eq!(settings.max_versions, 2);
        assert!(!settings.versions);
    }
}

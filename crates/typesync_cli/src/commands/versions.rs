//! Versions command implementation.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use typesync_core::{SnapshotPath, SyncSettings, VersionedWriter};
use typesync_storage::FileBackend;

/// One archived version.
#[derive(Debug, Serialize)]
pub struct VersionEntry {
    /// Archive file path.
    pub path: String,
    /// Creation time, local.
    pub created: String,
}

/// Runs the versions command.
pub fn run(
    settings: &SyncSettings,
    type_name: &str,
    relative: &Path,
    name: &str,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let writer = VersionedWriter::from_settings(Arc::new(FileBackend::new()), settings);
    let path = SnapshotPath::new(type_name, name).with_relative(relative);

    let entries: Vec<VersionEntry> = writer
        .archived_versions(&path)?
        .into_iter()
        .map(|entry| VersionEntry {
            path: entry.path.display().to_string(),
            created: DateTime::<Local>::from(entry.created)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
        })
        .collect();

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("Archived versions of {}", writer.layout().live_path(&path).display());
    println!();
    if entries.is_empty() {
        println!("  (none)");
    }
    for entry in &entries {
        println!("  {}  {}", entry.created, entry.path);
    }

    Ok(())
}

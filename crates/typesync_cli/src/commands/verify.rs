//! Verify command implementation.

use std::sync::Arc;
use typesync_core::{Definition, SyncSettings, VersionedWriter};
use typesync_storage::FileBackend;

/// Verification result.
#[derive(Debug, Default)]
pub struct VerifyResult {
    /// Number of snapshot files checked.
    pub files_checked: usize,
    /// Number of files that parsed into a definition.
    pub valid_files: usize,
    /// List of errors found.
    pub errors: Vec<String>,
}

impl VerifyResult {
    fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs the verify command.
pub fn run(settings: &SyncSettings, type_name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let writer = VersionedWriter::from_settings(Arc::new(FileBackend::new()), settings);
    let root = writer.layout().type_root(type_name);
    println!("Verifying snapshots at {}", root.display());
    println!();

    let mut result = VerifyResult::default();
    for file in writer.snapshot_files(type_name)? {
        result.files_checked += 1;
        let parsed = writer
            .read_file(&file)
            .and_then(|doc| Definition::from_document(&doc));
        match parsed {
            Ok(definition) => {
                result.valid_files += 1;
                tracing::debug!(file = %file.display(), alias = %definition.alias, "ok");
            }
            Err(error) => result.errors.push(format!("{}: {error}", file.display())),
        }
    }

    println!("Files checked: {}", result.files_checked);
    println!("Valid files:   {}", result.valid_files);
    for error in &result.errors {
        println!("  - {error}");
    }

    println!();
    if result.is_ok() {
        println!("✓ Snapshot verification passed");
        Ok(())
    } else {
        println!("✗ Snapshot verification failed");
        Err("Verification failed".into())
    }
}

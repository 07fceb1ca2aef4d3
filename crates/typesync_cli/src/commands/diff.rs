//! Diff command implementation.

use super::read_document;
use serde::Serialize;
use std::path::Path;
use typesync_core::diff;

/// Which parts of a definition differ from the live export.
#[derive(Debug, Serialize)]
pub struct DiffResult {
    /// Alias named in the target's info section.
    pub alias: Option<String>,
    /// Info fields differ.
    pub info: bool,
    /// Properties or tabs differ.
    pub properties: bool,
    /// Allowed children differ.
    pub structure: bool,
    /// Parent link differs.
    pub parent: bool,
}

/// Runs the diff command.
pub fn run(
    target_path: &Path,
    live_path: &Path,
    live_parent: Option<&str>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let target = read_document(target_path)?;
    let live = read_document(live_path)?;
    let report = diff::diff(&target, &live, live_parent)?;

    let result = DiffResult {
        alias: target
            .get("Info")
            .and_then(|info| info.get("Alias"))
            .and_then(|alias| alias.as_text())
            .map(str::to_string),
        info: report.info_changed,
        properties: report.properties_changed,
        structure: report.structure_changed,
        parent: report.parent_changed,
    };

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_text_output(&result);
    }

    Ok(())
}

fn print_text_output(result: &DiffResult) {
    println!(
        "Definition: {}",
        result.alias.as_deref().unwrap_or("(no alias)")
    );
    println!();
    for (label, changed) in [
        ("Info", result.info),
        ("Properties", result.properties),
        ("Structure", result.structure),
        ("Parent", result.parent),
    ] {
        println!("  {label:<12} {}", if changed { "changed" } else { "same" });
    }
}

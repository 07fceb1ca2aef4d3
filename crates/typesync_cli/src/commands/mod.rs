//! CLI command implementations.

pub mod diff;
pub mod hash;
pub mod verify;
pub mod versions;

use std::fs;
use std::path::Path;
use typesync_codec::{from_json_str, Value};

/// Reads a definition document from a JSON file.
pub fn read_document(path: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
    Ok(from_json_str(&text).map_err(|e| format!("{}: {e}", path.display()))?)
}

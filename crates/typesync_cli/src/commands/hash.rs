//! Hash command implementation.

use super::read_document;
use serde::Serialize;
use std::path::Path;
use typesync_codec::to_json_string;
use typesync_core::{canonicalize, digest_canonical};

/// Digest of one definition file.
#[derive(Debug, Serialize)]
pub struct HashResult {
    /// File that was hashed.
    pub file: String,
    /// Hex SHA-256 of the canonical form.
    pub digest: String,
    /// Canonical form as JSON, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical: Option<String>,
}

/// Runs the hash command.
pub fn run(
    path: &Path,
    show_canonical: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let doc = read_document(path)?;
    let canonical = canonicalize(&doc)?;

    let result = HashResult {
        file: path.display().to_string(),
        digest: digest_canonical(&canonical),
        canonical: if show_canonical {
            Some(to_json_string(&canonical)?)
        } else {
            None
        },
    };

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}  {}", result.digest, result.file);
        if let Some(text) = &result.canonical {
            println!();
            println!("{text}");
        }
    }

    Ok(())
}

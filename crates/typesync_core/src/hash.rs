//! Content digests of definition documents.
//!
//! The digest of a document is the lowercase hex SHA-256 of the canonical
//! byte encoding of its canonical form. Equal canonical forms always give
//! equal digests.

use crate::canonical::canonicalize;
use crate::error::CoreResult;
use sha2::{Digest, Sha256};
use typesync_codec::{ByteSink, CanonicalEncoder, Value};

/// Length of a hex digest in characters.
pub const DIGEST_HEX_LEN: usize = 64;

/// Feeds encoder output straight into a hasher.
struct DigestSink(Sha256);

impl ByteSink for DigestSink {
    fn put(&mut self, bytes: &[u8]) {
        self.0.update(bytes);
    }
}

/// Digest of a whole definition document.
///
/// # Errors
///
/// Returns an error if the document cannot be canonicalized.
pub fn digest(doc: &Value) -> CoreResult<String> {
    Ok(digest_canonical(&canonicalize(doc)?))
}

/// Digest of a value that is already canonical.
#[must_use]
pub fn digest_canonical(canonical: &Value) -> String {
    let mut encoder = CanonicalEncoder::new(DigestSink(Sha256::new()));
    encoder.encode(canonical);
    hex(&encoder.into_inner().0.finalize())
}

/// Digest of the named fields of `node`, in the order given.
///
/// Each present field contributes its text; containers contribute the text
/// of every leaf below them. Absent fields contribute nothing.
#[must_use]
pub fn digest_fields(node: &Value, fields: &[&str]) -> String {
    let mut text = String::new();
    for field in fields {
        if let Some(value) = node.get(field) {
            push_text(value, &mut text);
        }
    }
    digest_str(&text)
}

/// Digest of a raw string.
#[must_use]
pub fn digest_str(text: &str) -> String {
    hex(&Sha256::digest(text.as_bytes()))
}

fn push_text(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => items.iter().for_each(|v| push_text(v, out)),
        Value::Map(pairs) => pairs.iter().for_each(|(_, v)| push_text(v, out)),
        leaf => {
            if let Some(t) = leaf.to_text() {
                out.push_str(&t);
            }
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use typesync_codec::from_json_str;

    fn doc(json: &str) -> Value {
        from_json_str(json).unwrap()
    }

    #[test]
    fn digest_is_hex_sha256() {
        let d = digest(&doc(r#"{"Info": {"Alias": "page"}}"#)).unwrap();
        assert_eq!(d.len(), DIGEST_HEX_LEN);
        assert!(d.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn equivalent_documents_share_a_digest() {
        let a = doc(r#"{"Info": {"Alias": "page", "Name": "Page"}, "Hash": "old"}"#);
        let b = doc(r#"{"Info": {"Name": "Page", "Alias": "page"}}"#);
        assert_eq!(digest(&a).unwrap(), digest(&b).unwrap());
    }

    #[test]
    fn meaningful_change_moves_the_digest() {
        let a = doc(r#"{"Info": {"Alias": "page", "Name": "Page"}}"#);
        let b = doc(r#"{"Info": {"Alias": "page", "Name": "Pages"}}"#);
        assert_ne!(digest(&a).unwrap(), digest(&b).unwrap());
    }

    #[test]
    fn digest_of_empty_string() {
        assert_eq!(
            digest_str(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn field_digest_uses_listed_fields_only() {
        let info = doc(r#"{"Alias": "page", "Name": "Page", "Icon": "icon-a"}"#);
        let other_icon = doc(r#"{"Alias": "page", "Name": "Page", "Icon": "icon-b"}"#);

        assert_eq!(
            digest_fields(&info, &["Alias", "Name"]),
            digest_fields(&other_icon, &["Alias", "Name"])
        );
        assert_eq!(digest_fields(&info, &["Alias", "Name"]), digest_str("pagePage"));
        assert_ne!(
            digest_fields(&info, &["Icon"]),
            digest_fields(&other_icon, &["Icon"])
        );
    }
}

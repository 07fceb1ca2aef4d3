//! Field names and accessors for definition documents.
//!
//! A definition document is a map shaped like:
//!
//! ```json
//! {
//!   "Info": { "Alias": "page", "Name": "Page", "Master": "base", "Container": false },
//!   "Structure": ["article"],
//!   "Tabs": [{ "Id": 12, "Caption": "Content", "SortOrder": 0 }],
//!   "GenericProperties": [
//!     { "Alias": "title", "Name": "Title", "Type": "textbox", "Tab": "Content",
//!       "Mandatory": true, "Order": 1 }
//!   ],
//!   "Hash": "..."
//! }
//! ```

use typesync_codec::Value;

pub(crate) const INFO: &str = "Info";
pub(crate) const ALIAS: &str = "Alias";
pub(crate) const NAME: &str = "Name";
pub(crate) const MASTER: &str = "Master";
pub(crate) const CONTAINER: &str = "Container";
pub(crate) const ICON: &str = "Icon";
pub(crate) const THUMBNAIL: &str = "Thumbnail";
pub(crate) const DESCRIPTION: &str = "Description";
pub(crate) const STRUCTURE: &str = "Structure";
pub(crate) const TABS: &str = "Tabs";
pub(crate) const TAB: &str = "Tab";
pub(crate) const CAPTION: &str = "Caption";
pub(crate) const ID: &str = "Id";
pub(crate) const ORDER: &str = "Order";
pub(crate) const SORT_ORDER: &str = "SortOrder";
pub(crate) const GENERIC_PROPERTIES: &str = "GenericProperties";
pub(crate) const TYPE: &str = "Type";
pub(crate) const MANDATORY: &str = "Mandatory";
pub(crate) const VALIDATION: &str = "Validation";
pub(crate) const HASH: &str = "Hash";
pub(crate) const NODES: &str = "Nodes";
pub(crate) const PRE_VALUES: &str = "PreValues";
pub(crate) const VALUE: &str = "Value";

/// Text of a leaf field, trimmed. Blank or absent fields give `None`.
pub(crate) fn text(node: &Value, key: &str) -> Option<String> {
    node.get(key)
        .and_then(Value::to_text)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// A boolean field, accepting `true`/`false` text as well.
pub(crate) fn flag(node: &Value, key: &str) -> Option<bool> {
    match node.get(key)? {
        Value::Bool(b) => Some(*b),
        other => match other.to_text()?.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
    }
}

/// An integer field, accepting decimal text as well.
pub(crate) fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(i) => Some(*i),
        Value::Text(t) => t.trim().parse().ok(),
        _ => None,
    }
}

/// Ordering of a tab or property: `Order` wins over `SortOrder`.
///
/// A present but blank `Order` yields `None` without falling back.
pub(crate) fn order(node: &Value) -> Option<i64> {
    match node.get(ORDER) {
        Some(value) => integer(value),
        None => node.get(SORT_ORDER).and_then(integer),
    }
}

/// Entries of a list field; absent or non-list fields give an empty slice.
pub(crate) fn entries<'a>(node: &'a Value, key: &str) -> &'a [Value] {
    node.get(key).and_then(Value::as_array).unwrap_or(&[])
}

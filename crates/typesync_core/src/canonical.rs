//! Canonical form of definition documents.
//!
//! Two documents that describe the same definition canonicalize to equal
//! trees, so their digests and diffs agree no matter which environment
//! produced them.
//!
//! ## Rules
//!
//! - Map fields are sorted by key; list order is kept
//! - `Hash` and `Nodes` are dropped
//! - Tab `Id`s are dropped, since they are environment-specific
//! - `SortOrder` on tabs and properties becomes `Order`; an existing
//!   `Order` wins and the `SortOrder` is dropped
//! - Blank fields inside `Info`, tabs and properties are dropped, so an
//!   empty `Master` is the same as no `Master`
//! - `Container` and `Mandatory` become booleans, accepting `"True"` and
//!   friends; a `Container` that is not a boolean is dropped
//! - Properties get the values a parse would assume when fields are
//!   missing: `Name` is the alias, `Mandatory` is false, `Order` is 0
//! - `PreValues` becomes the byte-wise sorted list of its value strings
//!
//! Canonicalization is idempotent: `canonicalize(canonicalize(d)) ==
//! canonicalize(d)`.

use crate::document::{
    self, ALIAS, CONTAINER, GENERIC_PROPERTIES, HASH, ID, INFO, MANDATORY, NAME, NODES, ORDER,
    PRE_VALUES, SORT_ORDER, TABS, VALUE,
};
use crate::error::{CoreError, CoreResult};
use typesync_codec::Value;

/// Returns the canonical form of a definition document.
///
/// # Errors
///
/// Returns `MalformedDocument` if the root is not a map or `Info` is not a
/// map, and `MissingField` if `Info` has no alias.
pub fn canonicalize(doc: &Value) -> CoreResult<Value> {
    if doc.as_map().is_none() {
        return Err(CoreError::malformed("document root must be a map"));
    }

    let mut canonical = sorted(doc);

    if let Some(info) = canonical.get_mut(INFO) {
        if info.as_map().is_none() {
            return Err(CoreError::malformed("Info must be a map"));
        }
        if document::text(info, ALIAS).is_none() {
            return Err(CoreError::missing_field("Info.Alias"));
        }
        drop_blank_fields(info);
        if info.contains_key(CONTAINER) {
            match document::flag(info, CONTAINER) {
                Some(container) => info.insert(CONTAINER, Value::Bool(container)),
                None => info.remove(CONTAINER),
            };
        }
    }

    canonical.remove(HASH);
    canonical.remove(NODES);

    if let Some(tabs) = canonical.get_mut(TABS).and_then(Value::as_array_mut) {
        for tab in tabs.iter_mut().filter(|t| t.as_map().is_some()) {
            tab.remove(ID);
            fold_order(tab);
            drop_blank_fields(tab);
        }
    }

    if let Some(properties) = canonical
        .get_mut(GENERIC_PROPERTIES)
        .and_then(Value::as_array_mut)
    {
        for property in properties.iter_mut().filter(|p| p.as_map().is_some()) {
            fold_order(property);
            drop_blank_fields(property);
            fill_property_defaults(property);
        }
    }

    if let Some(pre_values) = canonical.remove(PRE_VALUES) {
        canonical.insert(PRE_VALUES, pre_value_list(&pre_values));
    }

    Ok(canonical)
}

/// Rebuilds every map in canonical key order.
fn sorted(value: &Value) -> Value {
    match value {
        Value::Map(pairs) => Value::map(
            pairs
                .iter()
                .map(|(k, v)| (k.clone(), sorted(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        leaf => leaf.clone(),
    }
}

fn fold_order(entry: &mut Value) {
    let sort_order = entry.remove(SORT_ORDER);
    let chosen = entry.remove(ORDER).or(sort_order);
    if let Some(value) = chosen {
        let value = document::integer(&value).map_or(value, Value::Integer);
        entry.insert(ORDER, value);
    }
}

/// Makes implied property values explicit, so a minimal entry and a full
/// export of the same property compare equal.
fn fill_property_defaults(property: &mut Value) {
    if !property.contains_key(NAME) {
        if let Some(alias) = property.get(ALIAS).cloned() {
            property.insert(NAME, alias);
        }
    }

    let mandatory = document::flag(property, MANDATORY).unwrap_or(false);
    property.insert(MANDATORY, Value::Bool(mandatory));

    let order = property.get(ORDER).and_then(document::integer).unwrap_or(0);
    property.insert(ORDER, Value::Integer(order));
}

fn drop_blank_fields(entry: &mut Value) {
    if let Value::Map(pairs) = entry {
        pairs.retain(|(_, v)| !v.is_blank());
    }
}

fn pre_value_list(pre_values: &Value) -> Value {
    let items: Vec<&Value> = match pre_values {
        Value::Array(items) => items.iter().collect(),
        Value::Map(pairs) => pairs.iter().map(|(_, v)| v).collect(),
        leaf => vec![leaf],
    };

    let mut values: Vec<String> = items
        .into_iter()
        .filter_map(|item| item.get(VALUE).unwrap_or(item).to_text())
        .collect();
    // String ordering is byte-wise over UTF-8
    values.sort();

    Value::Array(values.into_iter().map(Value::Text).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use typesync_codec::from_json_str;

    fn doc(json: &str) -> Value {
        from_json_str(json).unwrap()
    }

    #[test]
    fn key_order_does_not_matter() {
        let a = doc(r#"{"Info": {"Alias": "page", "Name": "Page"}, "Structure": []}"#);
        let b = doc(r#"{"Structure": [], "Info": {"Name": "Page", "Alias": "page"}}"#);
        assert_eq!(canonicalize(&a).unwrap(), canonicalize(&b).unwrap());
    }

    #[test]
    fn environment_fields_are_ignored() {
        let a = doc(
            r#"{"Info": {"Alias": "page"}, "Hash": "abc", "Nodes": [1, 2],
                "Tabs": [{"Id": 7, "Caption": "Content", "SortOrder": 1}]}"#,
        );
        let b = doc(
            r#"{"Info": {"Alias": "page"},
                "Tabs": [{"Id": 99, "Caption": "Content", "Order": 1}]}"#,
        );
        assert_eq!(canonicalize(&a).unwrap(), canonicalize(&b).unwrap());
    }

    #[test]
    fn order_wins_over_sort_order() {
        let canonical = canonicalize(&doc(
            r#"{"GenericProperties": [{"Alias": "title", "Order": "3", "SortOrder": 8}]}"#,
        ))
        .unwrap();
        let property = &canonical.get("GenericProperties").unwrap().as_array().unwrap()[0];
        assert_eq!(property.get("Order"), Some(&Value::Integer(3)));
        assert!(property.get("SortOrder").is_none());
    }

    #[test]
    fn blank_master_equals_absent_master() {
        let a = doc(r#"{"Info": {"Alias": "page", "Master": ""}}"#);
        let b = doc(r#"{"Info": {"Alias": "page"}}"#);
        assert_eq!(canonicalize(&a).unwrap(), canonicalize(&b).unwrap());
    }

    #[test]
    fn pre_values_become_sorted_strings() {
        let canonical = canonicalize(&doc(
            r#"{"PreValues": [{"Id": 2, "Value": "b"}, {"Id": 1, "Value": "B"}, {"Id": 3, "Value": "a"}]}"#,
        ))
        .unwrap();
        assert_eq!(
            canonical.get("PreValues"),
            Some(&Value::Array(vec!["B".into(), "a".into(), "b".into()]))
        );
    }

    #[test]
    fn list_order_is_kept() {
        let a = doc(r#"{"Structure": ["a", "b"]}"#);
        let b = doc(r#"{"Structure": ["b", "a"]}"#);
        assert_ne!(canonicalize(&a).unwrap(), canonicalize(&b).unwrap());
    }

    #[test]
    fn idempotent() {
        let d = doc(
            r#"{"Info": {"Alias": "page", "Master": " "}, "Hash": "x",
                "Tabs": [{"Id": 1, "Caption": "Content", "SortOrder": 2}],
                "GenericProperties": [{"Alias": "title", "Type": "textbox", "SortOrder": 1, "Description": ""}],
                "PreValues": ["z", "y"]}"#,
        );
        let once = canonicalize(&d).unwrap();
        assert_eq!(canonicalize(&once).unwrap(), once);
    }

    #[test]
    fn text_flags_become_booleans() {
        let canonical = canonicalize(&doc(
            r#"{"Info": {"Alias": "page", "Container": "True"},
                "GenericProperties": [{"Alias": "title", "Mandatory": "TRUE"},
                                      {"Alias": "body", "Mandatory": "0"}]}"#,
        ))
        .unwrap();
        assert_eq!(
            canonical.get("Info").and_then(|i| i.get("Container")),
            Some(&Value::Bool(true))
        );
        let properties = canonical.get("GenericProperties").unwrap().as_array().unwrap();
        assert_eq!(properties[0].get("Mandatory"), Some(&Value::Bool(true)));
        assert_eq!(properties[1].get("Mandatory"), Some(&Value::Bool(false)));

        let garbled = canonicalize(&doc(r#"{"Info": {"Alias": "page", "Container": "maybe"}}"#))
            .unwrap();
        assert!(garbled.get("Info").unwrap().get("Container").is_none());
    }

    #[test]
    fn minimal_property_matches_full_property() {
        let minimal = doc(
            r#"{"Info": {"Alias": "page"},
                "GenericProperties": [{"Alias": "title", "Type": "textbox", "Tab": "Content"}]}"#,
        );
        let full = doc(
            r#"{"Info": {"Alias": "page"},
                "GenericProperties": [{"Alias": "title", "Name": "title", "Type": "textbox",
                    "Tab": "Content", "Description": "", "Mandatory": "False",
                    "Validation": "", "SortOrder": 0}]}"#,
        );
        assert_eq!(canonicalize(&minimal).unwrap(), canonicalize(&full).unwrap());

        let named = doc(
            r#"{"Info": {"Alias": "page"},
                "GenericProperties": [{"Alias": "title", "Name": "Title", "Type": "textbox"}]}"#,
        );
        assert_ne!(canonicalize(&minimal).unwrap(), canonicalize(&named).unwrap());
    }

    #[test]
    fn malformed_input() {
        assert!(matches!(
            canonicalize(&Value::Array(vec![])),
            Err(CoreError::MalformedDocument { .. })
        ));
        assert!(matches!(
            canonicalize(&doc(r#"{"Info": {"Name": "Page"}}"#)),
            Err(CoreError::MissingField { .. })
        ));
        assert!(matches!(
            canonicalize(&doc(r#"{"Info": "page"}"#)),
            Err(CoreError::MalformedDocument { .. })
        ));
    }

    #[test]
    fn missing_optional_sections_are_fine() {
        let canonical = canonicalize(&doc(r#"{"Info": {"Alias": "page"}}"#)).unwrap();
        assert!(canonical.get("Tabs").is_none());
    }
}

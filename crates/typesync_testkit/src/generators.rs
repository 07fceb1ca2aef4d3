//! Property-based test generators using proptest.
//!
//! Provides strategies for definition documents and for the cosmetic
//! noise that must not change their canonical form.

use crate::fixtures::{DocumentBuilder, EDITOR_KINDS};
use proptest::prelude::*;
use typesync_codec::Value;

/// Strategy for content type and property aliases.
pub fn alias_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-zA-Z0-9]{0,15}").expect("Invalid regex")
}

/// Strategy for tab captions.
pub fn caption_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["Content", "Meta", "Settings", "SEO"]).prop_map(str::to_string)
}

/// Strategy for editor kinds the seeded repository knows.
pub fn editor_kind_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(EDITOR_KINDS.to_vec()).prop_map(str::to_string)
}

/// How a generated property spells its `Mandatory` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MandatoryField {
    /// Left out, so it defaults to false.
    Absent,
    /// A boolean.
    Bool(bool),
    /// Text such as `"True"` or `"false"`.
    Text(String),
}

impl MandatoryField {
    fn value(&self) -> Option<Value> {
        match self {
            Self::Absent => None,
            Self::Bool(flag) => Some(Value::Bool(*flag)),
            Self::Text(text) => Some(Value::from(text.as_str())),
        }
    }
}

/// Strategy for the spellings of `Mandatory` found in hand-written files.
pub fn mandatory_strategy() -> impl Strategy<Value = MandatoryField> {
    prop_oneof![
        Just(MandatoryField::Absent),
        any::<bool>().prop_map(MandatoryField::Bool),
        prop::sample::select(vec!["True", "False", "true", "false"])
            .prop_map(|text| MandatoryField::Text(text.to_string())),
    ]
}

/// Optional fields of a generated property.
#[derive(Debug, Clone)]
pub struct PropertyFields {
    /// Display name, when written.
    pub name: Option<String>,
    /// The `Mandatory` field.
    pub mandatory: MandatoryField,
    /// Whether `SortOrder` is written.
    pub sort_order: bool,
}

/// Strategy for optional property fields.
pub fn property_fields_strategy() -> impl Strategy<Value = PropertyFields> {
    (
        prop::option::of("[A-Z][a-z]{0,10}"),
        mandatory_strategy(),
        any::<bool>(),
    )
        .prop_map(|(name, mandatory, sort_order)| PropertyFields {
            name,
            mandatory,
            sort_order,
        })
}

/// A generated property: alias, editor kind, tab caption, optional fields.
pub type PropertySpec = (String, String, String, PropertyFields);

/// Strategy for up to `max` properties with distinct aliases.
pub fn properties_strategy(max: usize) -> impl Strategy<Value = Vec<PropertySpec>> {
    prop::collection::btree_map(
        alias_strategy(),
        (
            editor_kind_strategy(),
            caption_strategy(),
            property_fields_strategy(),
        ),
        0..=max,
    )
    .prop_map(|props| {
        props
            .into_iter()
            .map(|(alias, (kind, tab, fields))| (alias, kind, tab, fields))
            .collect()
    })
}

/// Strategy for whole definition documents.
///
/// Aliases are unique. Property `Name`, `Mandatory` and `SortOrder` may be
/// left out or spelled as text, and `Tabs` may be left empty so groups come
/// from the properties alone, the way hand-written files often look.
pub fn document_strategy() -> impl Strategy<Value = Value> {
    (
        alias_strategy(),
        prop::option::of("[A-Z][a-z]{0,10}( [A-Z][a-z]{0,10})?"),
        properties_strategy(8),
        prop::collection::btree_set(alias_strategy(), 0..4),
        any::<bool>(),
    )
        .prop_map(|(alias, name, properties, children, list_tabs)| {
            let mut builder = DocumentBuilder::new(&alias);
            if let Some(name) = name {
                builder = builder.info("Name", name.as_str());
            }

            if list_tabs {
                let mut captions: Vec<&str> = properties.iter().map(|p| p.2.as_str()).collect();
                captions.sort_unstable();
                captions.dedup();
                for (order, caption) in captions.iter().enumerate() {
                    builder = builder.tab(caption, order as i64);
                }
            }

            for (order, (property, kind, tab, fields)) in properties.iter().enumerate() {
                let mut extra = Vec::new();
                if let Some(name) = &fields.name {
                    extra.push(("Name", Value::from(name.as_str())));
                }
                if let Some(mandatory) = fields.mandatory.value() {
                    extra.push(("Mandatory", mandatory));
                }
                if fields.sort_order {
                    extra.push(("SortOrder", Value::Integer(order as i64)));
                }
                builder = builder.property_with(property, kind, tab, extra);
            }
            for child in &children {
                builder = builder.child(child);
            }
            builder.build()
        })
}

/// Adds noise that canonicalization removes: a stale `Hash`, tab ids,
/// `Order` duplicating `SortOrder`, and blank optional fields.
pub fn with_cosmetic_noise(doc: &Value, seed: i64) -> Value {
    let mut noisy = doc.clone();
    noisy.insert("Hash", Value::from(format!("stale-{seed}")));

    if let Some(info) = noisy.get_mut("Info") {
        info.insert("Master", Value::from(""));
        info.insert("Description", Value::from("   "));
    }

    if let Some(tabs) = noisy.get_mut("Tabs").and_then(Value::as_array_mut) {
        for (i, tab) in tabs.iter_mut().enumerate() {
            tab.insert("Id", Value::Integer(seed.wrapping_add(i as i64)));
            if let Some(order) = tab.get("SortOrder").cloned() {
                tab.insert("Order", order);
            }
        }
    }

    if let Some(properties) = noisy
        .get_mut("GenericProperties")
        .and_then(Value::as_array_mut)
    {
        for property in properties.iter_mut() {
            property.insert("Validation", Value::from(""));
        }
    }

    noisy
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::test_runner::TestRunner;
    use typesync_core::Definition;

    #[test]
    fn generated_documents_parse() {
        let mut runner = TestRunner::default();
        runner
            .run(&document_strategy(), |doc| {
                prop_assert!(Definition::from_document(&doc).is_ok());
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn mandatory_text_reads_as_a_flag() {
        let doc = DocumentBuilder::new("page")
            .property_with(
                "intro",
                "richtext",
                "Content",
                [("Mandatory", MandatoryField::Text("True".into()).value().unwrap())],
            )
            .property("title", "textbox", "Content")
            .build();

        let definition = Definition::from_document(&doc).unwrap();
        assert!(definition.property("intro").unwrap().mandatory);
        let title = definition.property("title").unwrap();
        assert!(!title.mandatory);
        assert_eq!(title.name, "title");
        assert_eq!(title.sort_order, None);
    }
}

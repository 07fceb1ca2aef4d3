//! Target definitions parsed from documents.

use crate::document::{
    self, ALIAS, CAPTION, CONTAINER, DESCRIPTION, GENERIC_PROPERTIES, ICON, INFO, MANDATORY,
    MASTER, NAME, STRUCTURE, TAB, TABS, THUMBNAIL, TYPE, VALIDATION,
};
use crate::error::{CoreError, CoreResult};
use crate::hash::digest;
use typesync_codec::Value;

/// The desired state of one content type, read from a document.
///
/// Optional fields left as `None` are not touched on the live side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    /// Content type alias.
    pub alias: String,
    /// Display name.
    pub name: Option<String>,
    /// Icon name.
    pub icon: Option<String>,
    /// Thumbnail name.
    pub thumbnail: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Container flag.
    pub is_container: Option<bool>,
    /// Parent alias; `None` means no parent.
    pub parent_alias: Option<String>,
    /// Aliases of allowed child types, in document order.
    pub allowed_children: Vec<String>,
    /// Groups in document order.
    pub groups: Vec<GroupDefinition>,
    /// Properties whose `Tab` is blank.
    pub ungrouped: Vec<PropertyDefinition>,
    /// Digest of the source document.
    pub digest: String,
}

/// A group of a target definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDefinition {
    /// Group name.
    pub name: String,
    /// Display order, when the document gives one.
    pub sort_order: Option<i64>,
    /// Properties of the group, in document order.
    pub properties: Vec<PropertyDefinition>,
}

/// A property of a target definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDefinition {
    /// Alias, unique across the definition.
    pub alias: String,
    /// Display name; defaults to the alias.
    pub name: String,
    /// Editor kind.
    pub editor_kind: String,
    /// Help text.
    pub description: String,
    /// Whether a value is required.
    pub mandatory: bool,
    /// Validation pattern.
    pub validation: Option<String>,
    /// Display order, when the document gives one.
    pub sort_order: Option<i64>,
    /// Owning group name, `None` when the document's `Tab` is blank.
    pub group: Option<String>,
}

impl Definition {
    /// Parses a definition from a document.
    ///
    /// # Errors
    ///
    /// - `MalformedDocument` if the document is not a map
    /// - `MissingField` if `Info`, `Info.Alias` or a property's `Alias` or
    ///   `Type` is absent
    /// - `DuplicateAlias` if a property alias appears twice
    pub fn from_document(doc: &Value) -> CoreResult<Self> {
        let digest = digest(doc)?;
        let info = doc
            .get(INFO)
            .ok_or_else(|| CoreError::missing_field(INFO))?;
        let alias =
            document::text(info, ALIAS).ok_or_else(|| CoreError::missing_field("Info.Alias"))?;

        let allowed_children = document::entries(doc, STRUCTURE)
            .iter()
            .filter_map(|entry| entry.get(ALIAS).unwrap_or(entry).to_text())
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();

        let mut groups: Vec<GroupDefinition> = document::entries(doc, TABS)
            .iter()
            .filter_map(|tab| {
                document::text(tab, CAPTION).map(|name| GroupDefinition {
                    name,
                    sort_order: document::order(tab),
                    properties: Vec::new(),
                })
            })
            .collect();
        let mut ungrouped = Vec::new();
        let mut seen: Vec<(String, String)> = Vec::new();

        for entry in document::entries(doc, GENERIC_PROPERTIES) {
            let property = PropertyDefinition::from_entry(entry)?;
            let group_label = property.group.clone().unwrap_or_default();
            if let Some((_, first)) = seen.iter().find(|(a, _)| *a == property.alias) {
                return Err(CoreError::duplicate_alias(
                    property.alias.as_str(),
                    first.as_str(),
                    group_label,
                ));
            }
            seen.push((property.alias.clone(), group_label));

            match property.group.clone() {
                None => ungrouped.push(property),
                Some(name) => match groups.iter_mut().find(|g| g.name == name) {
                    Some(group) => group.properties.push(property),
                    None => groups.push(GroupDefinition {
                        name,
                        sort_order: None,
                        properties: vec![property],
                    }),
                },
            }
        }

        Ok(Self {
            name: document::text(info, NAME),
            icon: document::text(info, ICON),
            thumbnail: document::text(info, THUMBNAIL),
            description: document::text(info, DESCRIPTION),
            is_container: document::flag(info, CONTAINER),
            parent_alias: document::text(info, MASTER),
            alias,
            allowed_children,
            groups,
            ungrouped,
            digest,
        })
    }

    /// Looks up a property by alias in any group.
    #[must_use]
    pub fn property(&self, alias: &str) -> Option<&PropertyDefinition> {
        self.properties().find(|p| p.alias == alias)
    }

    /// Every property, grouped ones first.
    pub fn properties(&self) -> impl Iterator<Item = &PropertyDefinition> {
        self.groups
            .iter()
            .flat_map(|g| g.properties.iter())
            .chain(self.ungrouped.iter())
    }

    /// Looks up a group by name.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&GroupDefinition> {
        self.groups.iter().find(|g| g.name == name)
    }
}

impl PropertyDefinition {
    fn from_entry(entry: &Value) -> CoreResult<Self> {
        let alias = document::text(entry, ALIAS)
            .ok_or_else(|| CoreError::missing_field("GenericProperties.Alias"))?;
        let editor_kind = document::text(entry, TYPE).ok_or_else(|| {
            CoreError::missing_field(format!("GenericProperties[{alias}].Type"))
        })?;

        Ok(Self {
            name: document::text(entry, NAME).unwrap_or_else(|| alias.clone()),
            description: document::text(entry, DESCRIPTION).unwrap_or_default(),
            mandatory: document::flag(entry, MANDATORY).unwrap_or(false),
            validation: document::text(entry, VALIDATION),
            sort_order: document::order(entry),
            group: document::text(entry, TAB),
            alias,
            editor_kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use typesync_codec::from_json_str;

    fn parse(json: &str) -> CoreResult<Definition> {
        Definition::from_document(&from_json_str(json).unwrap())
    }

    #[test]
    fn parses_groups_and_properties() {
        let def = parse(
            r#"{
                "Info": {"Alias": "page", "Name": "Page", "Master": "", "Container": "True"},
                "Structure": ["article", " ", "gallery"],
                "Tabs": [{"Caption": "Meta", "SortOrder": 2}, {"Caption": "Content", "Order": 1}],
                "GenericProperties": [
                    {"Alias": "title", "Type": "textbox", "Tab": "Content", "Mandatory": true},
                    {"Alias": "seo", "Type": "textbox", "Tab": "Seo", "Order": 4},
                    {"Alias": "loose", "Type": "textbox", "Tab": ""}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(def.alias, "page");
        assert_eq!(def.parent_alias, None);
        assert_eq!(def.is_container, Some(true));
        assert_eq!(def.allowed_children, vec!["article", "gallery"]);

        let names: Vec<_> = def.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Meta", "Content", "Seo"]);
        assert_eq!(def.group("Content").unwrap().sort_order, Some(1));
        assert_eq!(def.group("Seo").unwrap().sort_order, None);

        let title = def.property("title").unwrap();
        assert!(title.mandatory);
        assert_eq!(title.name, "title");
        assert_eq!(def.property("seo").unwrap().sort_order, Some(4));
        assert_eq!(def.ungrouped.len(), 1);
        assert_eq!(def.properties().count(), 3);
        assert_eq!(def.digest.len(), 64);
    }

    #[test]
    fn duplicate_alias_across_groups() {
        let result = parse(
            r#"{"Info": {"Alias": "page"}, "GenericProperties": [
                {"Alias": "title", "Type": "textbox", "Tab": "A"},
                {"Alias": "title", "Type": "textbox", "Tab": "B"}
            ]}"#,
        );
        match result {
            Err(CoreError::DuplicateAlias {
                alias,
                first_group,
                second_group,
            }) => {
                assert_eq!(alias, "title");
                assert_eq!(first_group, "A");
                assert_eq!(second_group, "B");
            }
            other => panic!("expected duplicate alias, got {other:?}"),
        }
    }

    #[test]
    fn missing_fields() {
        assert!(matches!(parse("{}"), Err(CoreError::MissingField { .. })));
        assert!(matches!(
            parse(r#"{"Info": {"Alias": "page"}, "GenericProperties": [{"Alias": "x"}]}"#),
            Err(CoreError::MissingField { .. })
        ));
        assert!(matches!(parse("[]"), Err(CoreError::MalformedDocument { .. })));
    }
}

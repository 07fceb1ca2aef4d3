//! Live content-type model.
//!
//! A [`ContentType`] owns its groups, and each [`PropertyGroup`] owns its
//! properties. Property aliases are unique across the whole content type;
//! every mutator here preserves that.

use crate::error::{CoreError, CoreResult};

/// Storage identifier of a content type.
pub type ContentTypeId = i64;

/// Identifier for a root content type's path, before its own id.
pub const ROOT_PATH: &str = "-1";

/// A live content type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentType {
    /// Storage id (0 until first saved).
    pub id: ContentTypeId,
    /// Unique alias.
    pub alias: String,
    /// Display name.
    pub name: String,
    /// Icon name.
    pub icon: String,
    /// Thumbnail name.
    pub thumbnail: String,
    /// Free text description.
    pub description: String,
    /// Whether instances are shown as containers.
    pub is_container: bool,
    /// Parent content type, if any.
    pub parent_id: Option<ContentTypeId>,
    /// Comma separated ancestor ids, ending with this type's id.
    pub path: String,
    /// Content types allowed beneath instances of this one.
    pub allowed_children: Vec<ContentTypeId>,
    /// Property groups, in storage order.
    pub groups: Vec<PropertyGroup>,
}

/// A named group (tab) of properties.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertyGroup {
    /// Storage id (0 until first saved).
    pub id: i64,
    /// Group name, unique within its content type.
    pub name: String,
    /// Display order.
    pub sort_order: i64,
    /// Name of the same-named root group on the parent type.
    pub parent_group: Option<String>,
    /// Properties in this group.
    pub properties: Vec<PropertyType>,
}

/// A single property of a content type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertyType {
    /// Alias, unique across the content type.
    pub alias: String,
    /// Display name.
    pub name: String,
    /// Editor kind identifier.
    pub editor_kind: String,
    /// Storage definition backing the editor.
    pub data_type_id: i64,
    /// Help text.
    pub description: String,
    /// Whether a value is required.
    pub mandatory: bool,
    /// Validation pattern.
    pub validation: Option<String>,
    /// Display order within its group.
    pub sort_order: i64,
}

/// A storage definition for an editor kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTypeDefinition {
    /// Storage id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Editor kind this definition serves.
    pub editor_kind: String,
}

impl PropertyGroup {
    /// Creates an empty group.
    #[must_use]
    pub fn new(name: impl Into<String>, sort_order: i64) -> Self {
        Self {
            name: name.into(),
            sort_order,
            ..Self::default()
        }
    }
}

impl PropertyType {
    /// Creates a property with the given alias and editor kind.
    #[must_use]
    pub fn new(alias: impl Into<String>, editor_kind: impl Into<String>) -> Self {
        let alias = alias.into();
        Self {
            name: alias.clone(),
            alias,
            editor_kind: editor_kind.into(),
            ..Self::default()
        }
    }
}

impl ContentType {
    /// Creates an unsaved content type.
    #[must_use]
    pub fn new(alias: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Looks up a property by alias.
    #[must_use]
    pub fn property(&self, alias: &str) -> Option<&PropertyType> {
        self.groups
            .iter()
            .flat_map(|g| g.properties.iter())
            .find(|p| p.alias == alias)
    }

    /// Looks up a property by alias for mutation.
    pub fn property_mut(&mut self, alias: &str) -> Option<&mut PropertyType> {
        self.groups
            .iter_mut()
            .flat_map(|g| g.properties.iter_mut())
            .find(|p| p.alias == alias)
    }

    /// Every property alias, group by group.
    #[must_use]
    pub fn property_aliases(&self) -> Vec<String> {
        self.groups
            .iter()
            .flat_map(|g| g.properties.iter().map(|p| p.alias.clone()))
            .collect()
    }

    /// Number of properties across all groups.
    #[must_use]
    pub fn property_count(&self) -> usize {
        self.groups.iter().map(|g| g.properties.len()).sum()
    }

    /// Looks up a group by name.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&PropertyGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Looks up a group by name for mutation.
    pub fn group_mut(&mut self, name: &str) -> Option<&mut PropertyGroup> {
        self.groups.iter_mut().find(|g| g.name == name)
    }

    /// Name of the group holding the property.
    #[must_use]
    pub fn group_of(&self, alias: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|g| g.properties.iter().any(|p| p.alias == alias))
            .map(|g| g.name.as_str())
    }

    /// Adds an empty group. Returns false if the name is taken.
    pub fn add_group(&mut self, name: &str, sort_order: i64) -> bool {
        if self.group(name).is_some() {
            return false;
        }
        self.groups.push(PropertyGroup::new(name, sort_order));
        true
    }

    /// Adds a property to an existing group.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the alias is already used or the group
    /// does not exist.
    pub fn add_property(&mut self, group: &str, property: PropertyType) -> CoreResult<()> {
        if self.property(&property.alias).is_some() {
            return Err(CoreError::invalid_operation(format!(
                "property '{}' already exists on '{}'",
                property.alias, self.alias
            )));
        }
        let target = self.group_mut(group).ok_or_else(|| {
            CoreError::invalid_operation(format!("group '{group}' does not exist"))
        })?;
        target.properties.push(property);
        Ok(())
    }

    /// Removes a property from whichever group holds it.
    pub fn remove_property(&mut self, alias: &str) -> Option<PropertyType> {
        for group in &mut self.groups {
            if let Some(at) = group.properties.iter().position(|p| p.alias == alias) {
                return Some(group.properties.remove(at));
            }
        }
        None
    }

    /// Moves a property into another existing group.
    ///
    /// Returns false if either the property or the group is missing, in
    /// which case nothing changes.
    pub fn move_property(&mut self, alias: &str, group: &str) -> bool {
        if self.group(group).is_none() {
            return false;
        }
        if self.group_of(alias) == Some(group) {
            return true;
        }
        let Some(property) = self.remove_property(alias) else {
            return false;
        };
        match self.group_mut(group) {
            Some(target) => {
                target.properties.push(property);
                true
            }
            None => false,
        }
    }

    /// Removes every group without properties, returning their names.
    pub fn prune_empty_groups(&mut self) -> Vec<String> {
        let mut pruned = Vec::new();
        self.groups.retain(|g| {
            if g.properties.is_empty() {
                pruned.push(g.name.clone());
                false
            } else {
                true
            }
        });
        pruned
    }

    /// Checks that property aliases and group names are unique.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateAlias` naming both groups of the first repeat.
    pub fn validate(&self) -> CoreResult<()> {
        let mut seen: Vec<(&str, &str)> = Vec::new();
        for group in &self.groups {
            for property in &group.properties {
                if let Some((_, first)) = seen.iter().find(|(a, _)| *a == property.alias) {
                    return Err(CoreError::duplicate_alias(
                        property.alias.as_str(),
                        *first,
                        group.name.as_str(),
                    ));
                }
                seen.push((property.alias.as_str(), group.name.as_str()));
            }
        }

        for (i, group) in self.groups.iter().enumerate() {
            if self.groups[..i].iter().any(|g| g.name == group.name) {
                return Err(CoreError::invalid_operation(format!(
                    "group '{}' appears twice on '{}'",
                    group.name, self.alias
                )));
            }
        }
        Ok(())
    }
}

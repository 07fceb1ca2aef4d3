//! Live model repositories and the editor-kind lookup table.

use crate::error::{CoreError, CoreResult};
use crate::model::{ContentType, ContentTypeId, DataTypeDefinition, ROOT_PATH};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

/// Access to live content types.
///
/// Implementations hand out owned copies; changes only take effect
/// through [`ContentTypeRepository::save`].
pub trait ContentTypeRepository: Send + Sync {
    /// Finds a content type by alias.
    fn get_by_alias(&self, alias: &str) -> Option<ContentType>;

    /// Finds a content type by id.
    fn get_by_id(&self, id: ContentTypeId) -> Option<ContentType>;

    /// Every content type, in id order.
    fn all(&self) -> Vec<ContentType>;

    /// Creates and saves an empty content type.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the alias is taken, or `Persistence`
    /// if the store rejects the write.
    fn create(&self, alias: &str, name: &str) -> CoreResult<ContentType>;

    /// Saves a content type, assigning ids to new groups.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if the store rejects the write.
    fn save(&self, content_type: &mut ContentType) -> CoreResult<()>;
}

/// Access to storage definitions of editor kinds.
pub trait DataTypeRepository: Send + Sync {
    /// Every storage definition.
    fn data_types(&self) -> Vec<DataTypeDefinition>;
}

/// Maps editor kinds to storage definitions.
///
/// Built once from a [`DataTypeRepository`] and passed to whatever needs
/// it; call [`EditorKindTable::refresh`] after data types change. When
/// several definitions serve one editor kind, the lowest id wins.
#[derive(Debug, Clone, Default)]
pub struct EditorKindTable {
    by_kind: HashMap<String, DataTypeDefinition>,
}

impl EditorKindTable {
    /// Builds the table from a repository.
    #[must_use]
    pub fn load(repository: &dyn DataTypeRepository) -> Self {
        Self::from_definitions(repository.data_types())
    }

    /// Builds the table from a list of definitions.
    #[must_use]
    pub fn from_definitions(definitions: impl IntoIterator<Item = DataTypeDefinition>) -> Self {
        let mut definitions: Vec<_> = definitions.into_iter().collect();
        definitions.sort_by_key(|d| d.id);

        let mut by_kind = HashMap::new();
        for definition in definitions {
            by_kind
                .entry(definition.editor_kind.clone())
                .or_insert(definition);
        }
        Self { by_kind }
    }

    /// Rebuilds the table from a repository.
    pub fn refresh(&mut self, repository: &dyn DataTypeRepository) {
        *self = Self::load(repository);
    }

    /// Resolves an editor kind to its storage definition.
    #[must_use]
    pub fn resolve(&self, editor_kind: &str) -> Option<&DataTypeDefinition> {
        self.by_kind.get(editor_kind)
    }

    /// Number of editor kinds known.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_kind.len()
    }

    /// Returns true if no editor kinds are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }
}

#[derive(Debug)]
struct RepoState {
    content_types: BTreeMap<ContentTypeId, ContentType>,
    data_types: Vec<DataTypeDefinition>,
    next_id: i64,
    saves: usize,
    reject_saves: bool,
}

impl Default for RepoState {
    fn default() -> Self {
        Self {
            content_types: BTreeMap::new(),
            data_types: Vec::new(),
            next_id: 1000,
            saves: 0,
            reject_saves: false,
        }
    }
}

impl RepoState {
    fn allocate(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn store(&mut self, content_type: &mut ContentType) -> CoreResult<()> {
        if self.reject_saves {
            return Err(CoreError::persistence(format!(
                "save of '{}' rejected",
                content_type.alias
            )));
        }
        content_type.validate()?;

        let clash = self
            .content_types
            .values()
            .any(|c| c.alias == content_type.alias && c.id != content_type.id);
        if clash {
            return Err(CoreError::invalid_operation(format!(
                "alias '{}' is already used",
                content_type.alias
            )));
        }

        if content_type.id == 0 {
            content_type.id = self.allocate();
        }
        if content_type.path.is_empty() {
            content_type.path = match content_type
                .parent_id
                .and_then(|p| self.content_types.get(&p))
            {
                Some(parent) => format!("{},{}", parent.path, content_type.id),
                None => format!("{ROOT_PATH},{}", content_type.id),
            };
        }
        let mut next = self.next_id;
        for group in &mut content_type.groups {
            if group.id == 0 {
                group.id = next;
                next += 1;
            }
        }
        self.next_id = next;

        self.content_types
            .insert(content_type.id, content_type.clone());
        self.saves += 1;
        Ok(())
    }
}

/// An in-memory repository of content types and data types.
///
/// Ids are allocated from a counter. Useful for tests and for tools that
/// work on snapshots without a live store.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: RwLock<RepoState>,
}

impl MemoryRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a storage definition for an editor kind.
    pub fn add_data_type(
        &self,
        name: impl Into<String>,
        editor_kind: impl Into<String>,
    ) -> DataTypeDefinition {
        let mut state = self.state.write();
        let definition = DataTypeDefinition {
            id: state.allocate(),
            name: name.into(),
            editor_kind: editor_kind.into(),
        };
        state.data_types.push(definition.clone());
        definition
    }

    /// Saves a content type as-is and returns the stored copy.
    ///
    /// # Errors
    ///
    /// Returns an error if the content type is invalid or its alias is
    /// taken.
    pub fn insert(&self, mut content_type: ContentType) -> CoreResult<ContentType> {
        self.state.write().store(&mut content_type)?;
        Ok(content_type)
    }

    /// Makes every following save fail with `Persistence`.
    pub fn reject_saves(&self, reject: bool) {
        self.state.write().reject_saves = reject;
    }

    /// Number of successful saves so far.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.state.read().saves
    }
}

impl ContentTypeRepository for MemoryRepository {
    fn get_by_alias(&self, alias: &str) -> Option<ContentType> {
        self.state
            .read()
            .content_types
            .values()
            .find(|c| c.alias == alias)
            .cloned()
    }

    fn get_by_id(&self, id: ContentTypeId) -> Option<ContentType> {
        self.state.read().content_types.get(&id).cloned()
    }

    fn all(&self) -> Vec<ContentType> {
        self.state.read().content_types.values().cloned().collect()
    }

    fn create(&self, alias: &str, name: &str) -> CoreResult<ContentType> {
        let mut content_type = ContentType::new(alias, name);
        self.state.write().store(&mut content_type)?;
        Ok(content_type)
    }

    fn save(&self, content_type: &mut ContentType) -> CoreResult<()> {
        self.state.write().store(content_type)
    }
}

impl DataTypeRepository for MemoryRepository {
    fn data_types(&self) -> Vec<DataTypeDefinition> {
        self.state.read().data_types.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyType;

    #[test]
    fn lowest_id_wins_per_editor_kind() {
        let table = EditorKindTable::from_definitions([
            DataTypeDefinition {
                id: 9,
                name: "Wide textbox".into(),
                editor_kind: "textbox".into(),
            },
            DataTypeDefinition {
                id: 3,
                name: "Textbox".into(),
                editor_kind: "textbox".into(),
            },
        ]);
        assert_eq!(table.resolve("textbox").unwrap().id, 3);
        assert!(table.resolve("missing").is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn refresh_sees_new_data_types() {
        let repo = MemoryRepository::new();
        let mut table = EditorKindTable::load(&repo);
        assert!(table.is_empty());

        repo.add_data_type("Textbox", "textbox");
        assert!(table.resolve("textbox").is_none());
        table.refresh(&repo);
        assert!(table.resolve("textbox").is_some());
    }

    #[test]
    fn save_assigns_ids_and_paths() {
        let repo = MemoryRepository::new();
        let base = repo.create("base", "Base").unwrap();
        assert_eq!(base.path, format!("-1,{}", base.id));

        let mut page = ContentType::new("page", "Page");
        page.parent_id = Some(base.id);
        page.add_group("Content", 0);
        page.add_property("Content", PropertyType::new("title", "textbox"))
            .unwrap();
        repo.save(&mut page).unwrap();

        assert_ne!(page.id, 0);
        assert_ne!(page.groups[0].id, 0);
        assert_eq!(page.path, format!("{},{}", base.path, page.id));
        assert_eq!(repo.get_by_alias("page").unwrap(), page);
        assert_eq!(repo.save_count(), 2);
    }

    #[test]
    fn alias_must_be_unique() {
        let repo = MemoryRepository::new();
        repo.create("page", "Page").unwrap();
        assert!(matches!(
            repo.create("page", "Other"),
            Err(CoreError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn rejected_saves() {
        let repo = MemoryRepository::new();
        let mut page = repo.create("page", "Page").unwrap();
        repo.reject_saves(true);
        page.name = "Renamed".into();
        assert!(matches!(
            repo.save(&mut page),
            Err(CoreError::Persistence { .. })
        ));
        assert_eq!(repo.get_by_alias("page").unwrap().name, "Page");
    }
}

//! Test fixtures and snapshot folder helpers.
//!
//! Provides builders for definition documents, a repository seeded with
//! the usual editor kinds, and writers over temp or in-memory folders.

use chrono::{NaiveDate, NaiveDateTime};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use typesync_codec::Value;
use typesync_core::{
    EditorKindTable, ManualClock, MemoryRepository, SyncLayout, SyncSettings, VersionPolicy,
    VersionedWriter,
};
use typesync_storage::{FileBackend, InMemoryBackend};

/// Editor kinds registered by [`seeded_repository`].
pub const EDITOR_KINDS: [&str; 5] = ["textbox", "textarea", "richtext", "tags", "number"];

/// Builds definition documents field by field.
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    info: Vec<(String, Value)>,
    tabs: Vec<Value>,
    properties: Vec<Value>,
    structure: Vec<Value>,
    extra: Vec<(String, Value)>,
}

impl DocumentBuilder {
    /// Starts a document for `alias`, named after it.
    pub fn new(alias: &str) -> Self {
        Self {
            info: vec![
                ("Alias".into(), Value::from(alias)),
                ("Name".into(), Value::from(alias)),
            ],
            tabs: Vec::new(),
            properties: Vec::new(),
            structure: Vec::new(),
            extra: Vec::new(),
        }
    }

    /// Sets an `Info` field, replacing any earlier value.
    pub fn info(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.info.retain(|(k, _)| k != field);
        self.info.push((field.to_string(), value.into()));
        self
    }

    /// Sets the parent alias.
    pub fn master(self, alias: &str) -> Self {
        self.info("Master", alias)
    }

    /// Adds a tab.
    pub fn tab(mut self, caption: &str, order: i64) -> Self {
        self.tabs.push(Value::object([
            ("Caption", Value::from(caption)),
            ("SortOrder", Value::Integer(order)),
        ]));
        self
    }

    /// Adds a property on `tab`.
    pub fn property(self, alias: &str, editor_kind: &str, tab: &str) -> Self {
        self.property_with(alias, editor_kind, tab, std::iter::empty())
    }

    /// Adds a property with extra fields.
    ///
    /// Only `Alias`, `Type` and `Tab` are written; the rest of the
    /// property fields take their defaults unless given in `fields`.
    pub fn property_with<'a>(
        mut self,
        alias: &str,
        editor_kind: &str,
        tab: &str,
        fields: impl IntoIterator<Item = (&'a str, Value)>,
    ) -> Self {
        let mut property = Value::object([
            ("Alias", Value::from(alias)),
            ("Type", Value::from(editor_kind)),
            ("Tab", Value::from(tab)),
        ]);
        for (field, value) in fields {
            property.insert(field, value);
        }
        self.properties.push(property);
        self
    }

    /// Adds an allowed child alias.
    pub fn child(mut self, alias: &str) -> Self {
        self.structure.push(Value::from(alias));
        self
    }

    /// Sets any top-level field.
    pub fn field(mut self, field: &str, value: Value) -> Self {
        self.extra.push((field.to_string(), value));
        self
    }

    /// Finishes the document.
    pub fn build(self) -> Value {
        let mut doc = Value::object([
            ("Info", Value::object(self.info)),
            ("Structure", Value::Array(self.structure)),
            ("Tabs", Value::Array(self.tabs)),
            ("GenericProperties", Value::Array(self.properties)),
        ]);
        for (field, value) in self.extra {
            doc.insert(&field, value);
        }
        doc
    }
}

/// A repository with one data type per entry of [`EDITOR_KINDS`].
pub fn seeded_repository() -> MemoryRepository {
    let repo = MemoryRepository::new();
    for kind in EDITOR_KINDS {
        repo.add_data_type(format!("{kind} (default)"), kind);
    }
    repo
}

/// Editor kind table loaded from `repo`.
pub fn editor_table(repo: &MemoryRepository) -> EditorKindTable {
    EditorKindTable::load(repo)
}

/// 2026-10-19 10:15:00.
pub fn fixed_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 19)
        .and_then(|d| d.and_hms_opt(10, 15, 0))
        .expect("valid fixed time")
}

/// A versioned writer over an in-memory backend with a manual clock.
pub struct MemoryFolder {
    /// The writer.
    pub writer: VersionedWriter,
    /// The backend, for inspection and fault injection.
    pub backend: Arc<InMemoryBackend>,
    /// The clock driving archive stamps.
    pub clock: Arc<ManualClock>,
}

impl MemoryFolder {
    /// Creates a folder under `/sync` that keeps at most `max_versions`
    /// archives (0 for unlimited).
    pub fn new(max_versions: usize) -> Self {
        let backend = Arc::new(InMemoryBackend::new());
        let clock = Arc::new(ManualClock::new(fixed_time()));
        let policy = VersionPolicy {
            versions: true,
            max_versions,
        };
        let writer = VersionedWriter::new(
            backend.clone(),
            SyncLayout::new("/sync", "/sync.archive", "json"),
            policy,
        )
        .with_clock(clock.clone());
        Self {
            writer,
            backend,
            clock,
        }
    }
}

/// A versioned writer over a temp directory, removed on drop.
pub struct TempFolder {
    /// The writer.
    pub writer: VersionedWriter,
    /// Settings the writer was built from.
    pub settings: SyncSettings,
    /// The clock driving archive stamps.
    pub clock: Arc<ManualClock>,
    _dir: TempDir,
}

impl TempFolder {
    /// Creates a folder with default settings, writing enabled.
    pub fn new() -> Self {
        Self::with_settings(SyncSettings::new().write(true))
    }

    /// Creates a folder; `settings` folders are moved under the temp dir.
    pub fn with_settings(settings: SyncSettings) -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let settings = settings
            .folder(dir.path().join("sync"))
            .archive(dir.path().join("sync.archive"));
        let clock = Arc::new(ManualClock::new(fixed_time()));
        let writer = VersionedWriter::from_settings(Arc::new(FileBackend::new()), &settings)
            .with_clock(clock.clone());
        Self {
            writer,
            settings,
            clock,
            _dir: dir,
        }
    }

    /// The temp directory root.
    pub fn path(&self) -> &Path {
        self._dir.path()
    }
}

impl Default for TempFolder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use typesync_core::Definition;

    #[test]
    fn builder_output_parses() {
        let doc = DocumentBuilder::new("page")
            .master("base")
            .tab("Content", 1)
            .property("title", "textbox", "Content")
            .child("article")
            .build();

        let definition = Definition::from_document(&doc).unwrap();
        assert_eq!(definition.alias, "page");
        assert_eq!(definition.parent_alias.as_deref(), Some("base"));
        assert!(definition.property("title").is_some());
        assert_eq!(definition.allowed_children, vec!["article"]);
    }

    #[test]
    fn seeded_repository_resolves_every_kind() {
        let repo = seeded_repository();
        let editors = editor_table(&repo);
        for kind in EDITOR_KINDS {
            assert!(editors.resolve(kind).is_some(), "{kind}");
        }
    }
}

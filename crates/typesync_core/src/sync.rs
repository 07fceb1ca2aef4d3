//! Batch import and export of content types.
//!
//! Document types and media types share the engine. A runner works on one
//! [`TypeKind`], and each kind keeps its snapshots under its own type
//! folder, e.g. `DocumentType/` and `MediaType/`.

use crate::config::SyncSettings;
use crate::definition::Definition;
use crate::diff;
use crate::error::CoreResult;
use crate::export::{export_content_type, parent_alias, sync_path};
use crate::hash::digest;
use crate::layout::SnapshotPath;
use crate::model::ContentType;
use crate::reconcile::{ReconcilePolicy, Reconciler};
use crate::repository::{ContentTypeRepository, EditorKindTable};
use crate::writer::VersionedWriter;
use std::fmt;
use tracing::{debug, info, warn};
use typesync_codec::Value;

/// Type name of document type snapshots.
pub const DOCUMENT_TYPE: &str = "cms.DocumentType";

/// Type name of media type snapshots.
pub const MEDIA_TYPE: &str = "cms.MediaType";

/// Which family of content types a runner syncs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TypeKind {
    /// Document types.
    #[default]
    Document,
    /// Media types.
    Media,
}

impl TypeKind {
    /// Snapshot type name of this kind.
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Document => DOCUMENT_TYPE,
            Self::Media => MEDIA_TYPE,
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// File stem of every content type snapshot.
pub const DEFINITION_FILE: &str = "def";

/// Result of syncing one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The destination was updated.
    Changed,
    /// The destination already matched.
    Unchanged,
    /// The item failed.
    Errored,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Changed => "changed",
            Self::Unchanged => "unchanged",
            Self::Errored => "errored",
        };
        f.write_str(label)
    }
}

/// Outcome of one item in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    /// Alias or file of the item.
    pub name: String,
    /// What happened.
    pub outcome: Outcome,
    /// Errors and warnings, one per line.
    pub messages: Vec<String>,
}

impl ItemOutcome {
    fn new(name: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            name: name.into(),
            outcome,
            messages: Vec::new(),
        }
    }

    fn errored(name: impl Into<String>, message: impl fmt::Display) -> Self {
        Self {
            name: name.into(),
            outcome: Outcome::Errored,
            messages: vec![message.to_string()],
        }
    }
}

/// Outcomes of a startup run.
#[derive(Debug, Default)]
pub struct StartupReport {
    /// Export outcomes, when `write` is on.
    pub exported: Vec<ItemOutcome>,
    /// Import outcomes, when `read` is on.
    pub imported: Vec<ItemOutcome>,
}

/// Returns true if the document's digest differs from the live export.
///
/// A document whose alias has no live content type counts as changed.
///
/// # Errors
///
/// Returns an error if the document is malformed.
pub fn definition_changed(
    doc: &Value,
    repository: &dyn ContentTypeRepository,
) -> CoreResult<bool> {
    let target = Definition::from_document(doc)?;
    let Some(live) = repository.get_by_alias(&target.alias) else {
        return Ok(true);
    };
    let exported = export_content_type(&live, repository);
    Ok(digest(&exported)? != target.digest)
}

/// Moves content types between snapshot files and the live model.
pub struct SyncRunner<'a> {
    repository: &'a dyn ContentTypeRepository,
    editors: &'a EditorKindTable,
    writer: &'a VersionedWriter,
    settings: &'a SyncSettings,
    kind: TypeKind,
}

impl<'a> SyncRunner<'a> {
    /// Creates a runner for document types.
    ///
    /// `repository` must hold the content types of the runner's kind; use
    /// [`SyncRunner::with_kind`] and a media type repository for media.
    #[must_use]
    pub fn new(
        repository: &'a dyn ContentTypeRepository,
        editors: &'a EditorKindTable,
        writer: &'a VersionedWriter,
        settings: &'a SyncSettings,
    ) -> Self {
        Self {
            repository,
            editors,
            writer,
            settings,
            kind: TypeKind::Document,
        }
    }

    /// Switches the family of content types this runner syncs.
    #[must_use]
    pub const fn with_kind(mut self, kind: TypeKind) -> Self {
        self.kind = kind;
        self
    }

    /// The family of content types this runner syncs.
    #[must_use]
    pub const fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Exports and/or imports everything, as the settings ask.
    ///
    /// # Errors
    ///
    /// Returns an error only if the snapshot folder cannot be listed;
    /// per-item failures are in the report.
    pub fn startup(&self) -> CoreResult<StartupReport> {
        let mut report = StartupReport::default();
        if self.settings.write {
            report.exported = self.export_all();
        }
        if self.settings.read {
            report.imported = self.import_all()?;
        }
        Ok(report)
    }

    /// Imports every content type snapshot, parents before children.
    ///
    /// # Errors
    ///
    /// Returns an error only if the snapshot folder cannot be listed.
    pub fn import_all(&self) -> CoreResult<Vec<ItemOutcome>> {
        let files = self.writer.snapshot_files(self.kind.type_name())?;
        let mut outcomes = Vec::with_capacity(files.len());

        for file in files {
            let name = file.display().to_string();
            let outcome = match self.writer.read_file(&file) {
                Ok(doc) => self.import_document(&doc).unwrap_or_else(|error| {
                    warn!(file = %name, %error, "import failed");
                    ItemOutcome::errored(name.as_str(), error)
                }),
                Err(error) => {
                    warn!(file = %name, %error, "unreadable snapshot");
                    ItemOutcome::errored(name.as_str(), error)
                }
            };
            outcomes.push(outcome);
        }

        let changed = outcomes.iter().filter(|o| o.outcome == Outcome::Changed).count();
        info!(total = outcomes.len(), changed, "import finished");
        Ok(outcomes)
    }

    /// Imports one document into the live model.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or the live model
    /// cannot be saved.
    pub fn import_document(&self, doc: &Value) -> CoreResult<ItemOutcome> {
        let target = Definition::from_document(doc)?;

        let (mut live, created) = match self.repository.get_by_alias(&target.alias) {
            Some(existing) => {
                if self.already_matches(doc, &target, &existing)? {
                    debug!(content_type = %target.alias, "unchanged");
                    return Ok(ItemOutcome::new(target.alias, Outcome::Unchanged));
                }
                (existing, false)
            }
            None => {
                let name = target.name.as_deref().unwrap_or(&target.alias);
                info!(content_type = %target.alias, "creating content type");
                (self.repository.create(&target.alias, name)?, true)
            }
        };

        let reconciler = Reconciler::new(
            self.repository,
            self.editors,
            ReconcilePolicy::from(self.settings),
        );
        let report = reconciler.reconcile(&target, &mut live)?;

        let outcome = if created || report.persisted {
            Outcome::Changed
        } else {
            Outcome::Unchanged
        };
        Ok(ItemOutcome {
            name: target.alias,
            outcome,
            messages: report.error_messages(),
        })
    }

    /// Exports every live content type.
    pub fn export_all(&self) -> Vec<ItemOutcome> {
        let outcomes: Vec<ItemOutcome> = self
            .repository
            .all()
            .iter()
            .map(|content_type| {
                self.export(content_type).unwrap_or_else(|error| {
                    warn!(content_type = %content_type.alias, %error, "export failed");
                    ItemOutcome::errored(content_type.alias.as_str(), error)
                })
            })
            .collect();

        let changed = outcomes.iter().filter(|o| o.outcome == Outcome::Changed).count();
        info!(total = outcomes.len(), changed, "export finished");
        outcomes
    }

    /// Writes the snapshot of one content type unless it is already current.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    pub fn export(&self, content_type: &ContentType) -> CoreResult<ItemOutcome> {
        let path = self.snapshot_path(content_type);
        let mut doc = export_content_type(content_type, self.repository);
        let current = digest(&doc)?;

        let on_disk = match self.writer.read(&path) {
            Ok(existing) => existing,
            Err(error) => {
                warn!(
                    content_type = %content_type.alias,
                    %error,
                    "unreadable snapshot, overwriting"
                );
                None
            }
        };
        if let Some(existing) = on_disk {
            if digest(&existing).ok().as_deref() == Some(current.as_str()) {
                debug!(content_type = %content_type.alias, "snapshot already current");
                return Ok(ItemOutcome::new(content_type.alias.as_str(), Outcome::Unchanged));
            }
        }

        doc.insert(crate::document::HASH, Value::Text(current));
        self.writer.write(&path, &doc)?;
        Ok(ItemOutcome::new(content_type.alias.as_str(), Outcome::Changed))
    }

    /// Exports a content type after it was saved, if attached.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    pub fn on_saved(&self, content_type: &ContentType) -> CoreResult<Option<ItemOutcome>> {
        if !self.settings.attach {
            return Ok(None);
        }
        self.export(content_type).map(Some)
    }

    /// Archives and removes the snapshot of a deleted content type, if
    /// attached.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be removed.
    pub fn on_deleted(&self, content_type: &ContentType) -> CoreResult<bool> {
        if !self.settings.attach {
            return Ok(false);
        }
        self.writer.delete(&self.snapshot_path(content_type))
    }

    /// Logical snapshot location of a content type.
    #[must_use]
    pub fn snapshot_path(&self, content_type: &ContentType) -> SnapshotPath {
        SnapshotPath::new(self.kind.type_name(), DEFINITION_FILE)
            .with_relative(sync_path(content_type, self.repository))
    }

    fn already_matches(
        &self,
        doc: &Value,
        target: &Definition,
        live: &ContentType,
    ) -> CoreResult<bool> {
        let exported = export_content_type(live, self.repository);
        if digest(&exported)? == target.digest {
            return Ok(true);
        }
        let live_parent = parent_alias(live, self.repository);
        Ok(!diff::any_changed(doc, &exported, live_parent.as_deref())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::SyncLayout;
    use crate::model::PropertyType;
    use crate::repository::MemoryRepository;
    use crate::writer::VersionPolicy;
    use std::path::PathBuf;
    use std::sync::Arc;
    use typesync_codec::from_json_str;
    use typesync_storage::{InMemoryBackend, SnapshotBackend};

    struct Env {
        repo: MemoryRepository,
        editors: EditorKindTable,
        backend: Arc<InMemoryBackend>,
        writer: VersionedWriter,
        settings: SyncSettings,
    }

    impl Env {
        fn new(settings: SyncSettings) -> Self {
            let repo = MemoryRepository::new();
            repo.add_data_type("Textbox", "textbox");
            let editors = EditorKindTable::load(&repo);
            let backend = Arc::new(InMemoryBackend::new());
            let writer = VersionedWriter::new(
                backend.clone(),
                SyncLayout::new("sync", "archive", "json"),
                VersionPolicy::default(),
            );
            Self {
                repo,
                editors,
                backend,
                writer,
                settings,
            }
        }

        fn runner(&self) -> SyncRunner<'_> {
            SyncRunner::new(&self.repo, &self.editors, &self.writer, &self.settings)
        }
    }

    fn page_type(repo: &MemoryRepository) -> ContentType {
        let mut page = ContentType::new("page", "Page");
        page.add_group("Content", 0);
        page.add_property("Content", PropertyType::new("title", "textbox"))
            .unwrap();
        repo.insert(page).unwrap()
    }

    #[test]
    fn export_then_import_is_unchanged() {
        let env = Env::new(SyncSettings::default());
        let page = page_type(&env.repo);
        let runner = env.runner();

        let exported = runner.export(&page).unwrap();
        assert_eq!(exported.outcome, Outcome::Changed);
        assert_eq!(runner.export(&page).unwrap().outcome, Outcome::Unchanged);

        let snapshot = env.writer.read(&runner.snapshot_path(&page)).unwrap().unwrap();
        assert!(!definition_changed(&snapshot, &env.repo).unwrap());

        let outcomes = runner.import_all().unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].outcome, Outcome::Unchanged);
    }

    #[test]
    fn import_creates_missing_types() {
        let env = Env::new(SyncSettings::default());
        let doc = from_json_str(
            r#"{"Info": {"Alias": "news", "Name": "News"},
                "GenericProperties": [{"Alias": "headline", "Type": "textbox", "Tab": "Content"}]}"#,
        )
        .unwrap();

        let outcome = env.runner().import_document(&doc).unwrap();
        assert_eq!(outcome.outcome, Outcome::Changed);
        let news = env.repo.get_by_alias("news").unwrap();
        assert_eq!(news.name, "News");
        assert_eq!(news.group_of("headline"), Some("Content"));

        let again = env.runner().import_document(&doc).unwrap();
        assert_eq!(again.outcome, Outcome::Unchanged);
    }

    #[test]
    fn bad_snapshot_is_reported_not_fatal() {
        let env = Env::new(SyncSettings::default());
        let page = page_type(&env.repo);
        let runner = env.runner();
        runner.export(&page).unwrap();

        let broken = SnapshotPath::new(DOCUMENT_TYPE, DEFINITION_FILE).with_relative("broken");
        let nameless = Value::object([("Info", Value::object([("Name", Value::from("x"))]))]);
        env.writer.write(&broken, &nameless).unwrap();

        let outcomes = runner.import_all().unwrap();
        assert_eq!(outcomes.len(), 2);
        let errored: Vec<_> = outcomes
            .iter()
            .filter(|o| o.outcome == Outcome::Errored)
            .collect();
        assert_eq!(errored.len(), 1);
        assert!(errored[0].name.contains("broken"));
    }

    #[test]
    fn detached_hooks_do_nothing() {
        let env = Env::new(SyncSettings::default().attach(false));
        let page = page_type(&env.repo);
        let runner = env.runner();
        assert!(runner.on_saved(&page).unwrap().is_none());
        assert!(!runner.on_deleted(&page).unwrap());
    }

    #[test]
    fn attached_hooks_write_and_delete() {
        let env = Env::new(SyncSettings::default());
        let page = page_type(&env.repo);
        let runner = env.runner();

        let saved = runner.on_saved(&page).unwrap().unwrap();
        assert_eq!(saved.outcome, Outcome::Changed);
        assert_eq!(
            env.writer.layout().live_path(&runner.snapshot_path(&page)),
            PathBuf::from("sync/DocumentType/page/def.json")
        );
        assert!(runner.on_deleted(&page).unwrap());
        assert!(env.writer.read(&runner.snapshot_path(&page)).unwrap().is_none());
    }

    #[test]
    fn startup_honours_read_and_write() {
        let env = Env::new(SyncSettings::default().write(true).read(false));
        page_type(&env.repo);
        let report = env.runner().startup().unwrap();
        assert_eq!(report.exported.len(), 1);
        assert!(report.imported.is_empty());
    }

    #[test]
    fn media_types_use_their_own_folder() {
        let env = Env::new(SyncSettings::default());
        let mut image = ContentType::new("image", "Image");
        image.add_group("Image", 0);
        image
            .add_property("Image", PropertyType::new("caption", "textbox"))
            .unwrap();
        let image = env.repo.insert(image).unwrap();

        let media = env.runner().with_kind(TypeKind::Media);
        assert_eq!(media.kind().type_name(), MEDIA_TYPE);
        assert_eq!(media.export(&image).unwrap().outcome, Outcome::Changed);
        assert_eq!(
            env.writer.layout().live_path(&media.snapshot_path(&image)),
            PathBuf::from("sync/MediaType/image/def.json")
        );

        assert!(env.runner().import_all().unwrap().is_empty());
        let outcomes = media.import_all().unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].outcome, Outcome::Unchanged);
    }

    #[test]
    fn unreadable_snapshot_is_overwritten_on_export() {
        let env = Env::new(SyncSettings::default());
        let page = page_type(&env.repo);
        let runner = env.runner();

        let file = env.writer.layout().live_path(&runner.snapshot_path(&page));
        env.backend
            .create_dir_all(file.parent().unwrap())
            .unwrap();
        env.backend.write(&file, b"{ not json").unwrap();
        assert!(env.writer.read(&runner.snapshot_path(&page)).is_err());

        assert_eq!(runner.export(&page).unwrap().outcome, Outcome::Changed);
        let snapshot = env.writer.read(&runner.snapshot_path(&page)).unwrap().unwrap();
        assert!(!definition_changed(&snapshot, &env.repo).unwrap());
    }
}

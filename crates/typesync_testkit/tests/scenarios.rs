//! End-to-end scenarios across parsing, reconciliation and the writer.

use typesync_codec::{from_json_str, Value};
use typesync_core::{
    definition_changed, diff, digest, export_content_type, ContentType, ContentTypeRepository,
    Outcome, PropertyType, ReconcilePolicy, Reconciler, SnapshotPath, SyncRunner,
    DEFINITION_FILE, DOCUMENT_TYPE,
};
use typesync_testkit::prelude::*;

fn content_page() -> Value {
    DocumentBuilder::new("page")
        .info("Icon", "icon-doc")
        .tab("Content", 0)
        .property("title", "textbox", "Content")
        .build()
}

#[test]
fn title_lands_in_a_new_content_group() {
    let repo = seeded_repository();
    let editors = editor_table(&repo);
    let mut live = repo.create("page", "Page").unwrap();

    let report = Reconciler::new(&repo, &editors, ReconcilePolicy::default())
        .reconcile_document(&content_page(), &mut live)
        .unwrap();
    assert!(report.is_clean());

    let stored = repo.get_by_alias("page").unwrap();
    let groups: Vec<_> = stored.groups.iter().filter(|g| g.name == "Content").collect();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].properties.len(), 1);
    assert_eq!(groups[0].properties[0].alias, "title");
    assert_eq!(groups[0].properties[0].editor_kind, "textbox");

    let exported = export_content_type(&stored, &repo);
    let again = diff::diff(&content_page(), &exported, None).unwrap();
    assert!(!again.any(), "minimal target did not converge: {exported:?}");
}

#[test]
fn empty_master_clears_the_parent() {
    let repo = seeded_repository();
    let editors = editor_table(&repo);
    let base = repo.create("base", "Base").unwrap();
    let mut page = ContentType::new("page", "Page");
    page.parent_id = Some(base.id);
    let mut live = repo.insert(page).unwrap();

    let target = DocumentBuilder::new("page").master("").build();
    let report = Reconciler::new(&repo, &editors, ReconcilePolicy::default())
        .reconcile_document(&target, &mut live)
        .unwrap();

    assert!(report.parent_changed);
    let stored = repo.get_by_alias("page").unwrap();
    assert_eq!(stored.parent_id, None);
    assert_eq!(stored.path, format!("-1,{}", stored.id));
}

#[test]
fn moved_property_keeps_one_copy() {
    let repo = seeded_repository();
    let editors = editor_table(&repo);
    let mut page = ContentType::new("page", "Page");
    page.add_group("Content", 0);
    page.add_property("Content", PropertyType::new("title", "textbox"))
        .unwrap();
    let mut live = repo.insert(page).unwrap();

    let target = DocumentBuilder::new("page")
        .tab("Meta", 1)
        .property("title", "textbox", "Meta")
        .build();
    let report = Reconciler::new(&repo, &editors, ReconcilePolicy::default())
        .reconcile_document(&target, &mut live)
        .unwrap();

    assert_eq!(report.moved, vec![("title".to_string(), "Meta".to_string())]);
    assert!(report.removed.is_empty());

    let stored = repo.get_by_alias("page").unwrap();
    assert_eq!(stored.group_of("title"), Some("Meta"));
    assert!(stored.group("Content").is_none());
    let copies = stored
        .property_aliases()
        .iter()
        .filter(|a| a.as_str() == "title")
        .count();
    assert_eq!(copies, 1);
}

#[test]
fn unmatched_properties_survive_unless_pruning() {
    let repo = seeded_repository();
    let editors = editor_table(&repo);
    let mut page = ContentType::new("page", "Page");
    page.add_group("Content", 0);
    page.add_property("Content", PropertyType::new("title", "textbox"))
        .unwrap();
    let mut legacy = PropertyType::new("legacy", "textarea");
    legacy.description = "kept around".into();
    page.add_property("Content", legacy.clone()).unwrap();
    let mut live = repo.insert(page).unwrap();

    let report = Reconciler::new(&repo, &editors, ReconcilePolicy::default())
        .reconcile_document(&content_page(), &mut live)
        .unwrap();
    assert_eq!(report.kept_unmatched, vec!["legacy"]);
    let stored = repo.get_by_alias("page").unwrap();
    assert_eq!(stored.property("legacy"), Some(&legacy));

    let mut live = stored;
    let pruning = ReconcilePolicy::default().prune_unmatched(true);
    let report = Reconciler::new(&repo, &editors, pruning)
        .reconcile_document(&content_page(), &mut live)
        .unwrap();
    assert_eq!(report.removed, vec!["legacy"]);
    assert!(repo.get_by_alias("page").unwrap().property("legacy").is_none());
}

#[test]
fn unknown_editor_kind_fails_only_that_property() {
    let repo = seeded_repository();
    let editors = editor_table(&repo);
    let mut live = repo.create("page", "Page").unwrap();

    let target = DocumentBuilder::new("page")
        .tab("Content", 0)
        .property("title", "textbox", "Content")
        .property("swatch", "colorpicker", "Content")
        .build();
    let report = Reconciler::new(&repo, &editors, ReconcilePolicy::default())
        .reconcile_document(&target, &mut live)
        .unwrap();

    assert_eq!(report.added, vec!["title"]);
    assert_eq!(report.property_errors.len(), 1);
    assert_eq!(report.property_errors[0].alias, "swatch");
    assert!(report.persisted);
}

#[test]
fn diff_flags_only_the_facet_that_moved() {
    let base = content_page();
    let check =
        |changed: Value, parent: Option<&str>| diff::diff(&changed, &base, parent).unwrap();

    let renamed = DocumentBuilder::new("page")
        .info("Icon", "icon-folder")
        .tab("Content", 0)
        .property("title", "textbox", "Content")
        .build();
    let report = check(renamed, None);
    assert!(report.info_changed);
    assert!(!report.properties_changed && !report.structure_changed && !report.parent_changed);

    let retyped = DocumentBuilder::new("page")
        .info("Icon", "icon-doc")
        .tab("Content", 0)
        .property("title", "textarea", "Content")
        .build();
    let report = check(retyped, None);
    assert!(report.properties_changed);
    assert!(!report.info_changed && !report.structure_changed && !report.parent_changed);

    let with_child = DocumentBuilder::new("page")
        .info("Icon", "icon-doc")
        .tab("Content", 0)
        .property("title", "textbox", "Content")
        .child("article")
        .build();
    let report = check(with_child, None);
    assert!(report.structure_changed);
    assert!(!report.info_changed && !report.properties_changed && !report.parent_changed);

    let report = check(content_page(), Some("base"));
    assert!(report.parent_changed);
    assert!(!report.info_changed && !report.properties_changed && !report.structure_changed);
}

#[test]
fn digest_ignores_key_order_and_pre_value_order() {
    let a = from_json_str(
        r#"{"Info": {"Alias": "picker", "Name": "Picker"},
            "PreValues": [{"Value": "red"}, {"Value": "blue"}]}"#,
    )
    .unwrap();
    let b = from_json_str(
        r#"{"PreValues": [{"Value": "blue"}, {"Value": "red"}],
            "Info": {"Name": "Picker", "Alias": "picker"}}"#,
    )
    .unwrap();
    assert_eq!(digest(&a).unwrap(), digest(&b).unwrap());
}

#[test]
fn retention_keeps_three_versions_and_the_live_file() {
    let folder = MemoryFolder::new(3);
    let path = SnapshotPath::new(DOCUMENT_TYPE, DEFINITION_FILE).with_relative("page");

    for i in 0..5 {
        let doc = DocumentBuilder::new("page").info("Name", format!("Page {i}")).build();
        folder.writer.write(&path, &doc).unwrap();
        folder.clock.advance_secs(1);
    }

    assert_eq!(folder.writer.archived_versions(&path).unwrap().len(), 3);
    let live = folder.writer.read(&path).unwrap().unwrap();
    assert_eq!(
        live.get("Info").and_then(|i| i.get("Name")),
        Some(&Value::from("Page 4"))
    );
}

#[test]
fn export_then_import_into_a_fresh_model() {
    let folder = TempFolder::new();

    let source = seeded_repository();
    let source_editors = editor_table(&source);
    let base = source.create("base", "Base").unwrap();
    let mut page = ContentType::new("page", "Page");
    page.parent_id = Some(base.id);
    page.add_group("Content", 0);
    page.add_property("Content", PropertyType::new("title", "textbox"))
        .unwrap();
    source.insert(page).unwrap();

    let exporter = SyncRunner::new(&source, &source_editors, &folder.writer, &folder.settings);
    let exported = exporter.export_all();
    assert!(exported.iter().all(|o| o.outcome == Outcome::Changed));

    let target = seeded_repository();
    let target_editors = editor_table(&target);
    let importer = SyncRunner::new(&target, &target_editors, &folder.writer, &folder.settings);
    let imported = importer.import_all().unwrap();
    assert_eq!(imported.len(), 2);
    assert!(imported.iter().all(|o| o.outcome == Outcome::Changed), "{imported:?}");

    let page = target.get_by_alias("page").unwrap();
    let base = target.get_by_alias("base").unwrap();
    assert_eq!(page.parent_id, Some(base.id));
    assert_eq!(page.group_of("title"), Some("Content"));

    let again = importer.import_all().unwrap();
    assert!(again.iter().all(|o| o.outcome == Outcome::Unchanged), "{again:?}");

    let snapshot = folder
        .writer
        .read(&importer.snapshot_path(&page))
        .unwrap()
        .unwrap();
    assert!(!definition_changed(&snapshot, &target).unwrap());
}

#[test]
fn one_broken_snapshot_does_not_stop_the_batch() {
    let folder = TempFolder::new();
    let repo = seeded_repository();
    let editors = editor_table(&repo);

    let broken = SnapshotPath::new(DOCUMENT_TYPE, DEFINITION_FILE).with_relative("broken");
    let no_alias = Value::object([("Info", Value::object([("Name", Value::from("Broken"))]))]);
    folder.writer.write(&broken, &no_alias).unwrap();

    let good = SnapshotPath::new(DOCUMENT_TYPE, DEFINITION_FILE).with_relative("page");
    folder.writer.write(&good, &content_page()).unwrap();

    let runner = SyncRunner::new(&repo, &editors, &folder.writer, &folder.settings);
    let outcomes = runner.import_all().unwrap();

    assert_eq!(outcomes.len(), 2);
    let errored: Vec<_> = outcomes.iter().filter(|o| o.outcome == Outcome::Errored).collect();
    assert_eq!(errored.len(), 1);
    assert!(errored[0].name.contains("broken"));
    assert!(repo.get_by_alias("page").unwrap().property("title").is_some());
}

//! Applying a target definition to a live content type.
//!
//! Reconciliation runs in a fixed order:
//!
//! 1. Parent: resolve the target parent and update the live link and path
//! 2. Info and allowed children
//! 3. Group sort orders
//! 4. Properties: update matched ones, plan moves and removals, add
//!    missing ones
//! 5. Apply removals (only when pruning is on), then moves
//! 6. Prune empty groups
//! 7. Link groups to same-named root groups of the parent
//! 8. Save, only if something changed
//!
//! Unresolvable references (parent, editor kind, missing group) are
//! recorded in the report and skip only the item concerned. A failed save
//! is a hard error.

use crate::config::SyncSettings;
use crate::definition::{Definition, PropertyDefinition};
use crate::error::{CoreError, CoreResult};
use crate::model::{ContentType, PropertyType, ROOT_PATH};
use crate::repository::{ContentTypeRepository, EditorKindTable};
use tracing::{debug, info, warn};
use typesync_codec::Value;

/// Options that change what reconciliation may do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcilePolicy {
    /// Remove live properties the target does not list.
    pub prune_unmatched: bool,
}

impl ReconcilePolicy {
    /// Sets whether unmatched live properties are removed.
    #[must_use]
    pub const fn prune_unmatched(mut self, value: bool) -> Self {
        self.prune_unmatched = value;
        self
    }
}

impl From<&SyncSettings> for ReconcilePolicy {
    fn from(settings: &SyncSettings) -> Self {
        Self {
            prune_unmatched: settings.delete_property_values,
        }
    }
}

/// A reconciliation error that affected a single property.
#[derive(Debug)]
pub struct PropertyError {
    /// Alias of the property.
    pub alias: String,
    /// What went wrong.
    pub error: CoreError,
}

/// What a reconciliation changed.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// The parent link or path changed.
    pub parent_changed: bool,
    /// The target parent could not be resolved.
    pub parent_error: Option<CoreError>,
    /// Name, icon, thumbnail, description or container flag changed.
    pub info_changed: bool,
    /// The allowed child list changed.
    pub structure_changed: bool,
    /// Child aliases that did not resolve and were skipped.
    pub unresolved_children: Vec<String>,
    /// Groups whose sort order changed.
    pub groups_reordered: Vec<String>,
    /// Groups created for moved or added properties.
    pub groups_created: Vec<String>,
    /// Properties added from the target.
    pub added: Vec<String>,
    /// Matched properties whose fields changed.
    pub updated: Vec<String>,
    /// Properties removed because the target no longer lists them.
    pub removed: Vec<String>,
    /// Unmatched properties left in place because pruning is off.
    pub kept_unmatched: Vec<String>,
    /// Properties moved, as `(alias, new group)`.
    pub moved: Vec<(String, String)>,
    /// Groups removed because they were empty.
    pub groups_pruned: Vec<String>,
    /// Groups whose parent link changed.
    pub groups_relinked: Vec<String>,
    /// Per-property errors.
    pub property_errors: Vec<PropertyError>,
    /// The live content type was saved.
    pub persisted: bool,
}

impl ReconcileReport {
    /// Returns true if the live content type was modified.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.parent_changed
            || self.info_changed
            || self.structure_changed
            || !self.groups_reordered.is_empty()
            || !self.groups_created.is_empty()
            || !self.added.is_empty()
            || !self.updated.is_empty()
            || !self.removed.is_empty()
            || !self.moved.is_empty()
            || !self.groups_pruned.is_empty()
            || !self.groups_relinked.is_empty()
    }

    /// Returns true if no item failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.parent_error.is_none() && self.property_errors.is_empty()
    }

    /// One line per failed item.
    #[must_use]
    pub fn error_messages(&self) -> Vec<String> {
        self.parent_error
            .iter()
            .map(ToString::to_string)
            .chain(self.property_errors.iter().map(|e| e.error.to_string()))
            .collect()
    }

    fn property_error(&mut self, alias: &str, error: CoreError) {
        warn!(property = alias, %error, "property not reconciled");
        self.property_errors.push(PropertyError {
            alias: alias.to_string(),
            error,
        });
    }
}

/// Applies target definitions to live content types.
///
/// # Example
///
/// ```
/// use typesync_core::{
///     ContentTypeRepository, Definition, EditorKindTable, MemoryRepository, ReconcilePolicy,
///     Reconciler,
/// };
/// use typesync_codec::from_json_str;
///
/// let repo = MemoryRepository::new();
/// repo.add_data_type("Textbox", "textbox");
/// let editors = EditorKindTable::load(&repo);
///
/// let doc = from_json_str(r#"{
///     "Info": {"Alias": "page", "Name": "Page"},
///     "GenericProperties": [{"Alias": "title", "Type": "textbox", "Tab": "Content"}]
/// }"#).unwrap();
/// let target = Definition::from_document(&doc).unwrap();
///
/// let mut live = repo.create("page", "Page").unwrap();
/// let report = Reconciler::new(&repo, &editors, ReconcilePolicy::default())
///     .reconcile(&target, &mut live)
///     .unwrap();
/// assert_eq!(report.added, vec!["title"]);
/// assert!(report.persisted);
/// ```
pub struct Reconciler<'a> {
    repository: &'a dyn ContentTypeRepository,
    editors: &'a EditorKindTable,
    policy: ReconcilePolicy,
}

impl<'a> Reconciler<'a> {
    /// Creates a reconciler.
    #[must_use]
    pub fn new(
        repository: &'a dyn ContentTypeRepository,
        editors: &'a EditorKindTable,
        policy: ReconcilePolicy,
    ) -> Self {
        Self {
            repository,
            editors,
            policy,
        }
    }

    /// Parses `doc` and reconciles `live` against it.
    ///
    /// # Errors
    ///
    /// Returns any parse error, or `Persistence` if the save fails.
    pub fn reconcile_document(
        &self,
        doc: &Value,
        live: &mut ContentType,
    ) -> CoreResult<ReconcileReport> {
        let target = Definition::from_document(doc)?;
        self.reconcile(&target, live)
    }

    /// Reconciles `live` against `target` and saves it if anything changed.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` (or whatever the repository reports) if the
    /// save fails. Per-item failures are in the report instead.
    pub fn reconcile(
        &self,
        target: &Definition,
        live: &mut ContentType,
    ) -> CoreResult<ReconcileReport> {
        let mut report = ReconcileReport::default();

        self.apply_parent(target, live, &mut report);
        Self::apply_info(target, live, &mut report);
        self.apply_structure(target, live, &mut report);
        Self::apply_group_order(target, live, &mut report);

        let (removals, moves) = self.update_properties(target, live, &mut report);
        self.add_properties(target, live, &mut report);

        for alias in removals {
            if self.policy.prune_unmatched {
                if live.remove_property(&alias).is_some() {
                    info!(content_type = %live.alias, property = %alias, "removed property");
                    report.removed.push(alias);
                }
            } else {
                debug!(content_type = %live.alias, property = %alias, "kept unmatched property");
                report.kept_unmatched.push(alias);
            }
        }

        for (alias, group) in moves {
            if live.move_property(&alias, &group) {
                info!(
                    content_type = %live.alias,
                    property = %alias,
                    group = %group,
                    "moved property"
                );
                report.moved.push((alias, group));
            }
        }

        report.groups_pruned = live.prune_empty_groups();
        for group in &report.groups_pruned {
            info!(content_type = %live.alias, group = %group, "pruned empty group");
        }

        self.link_groups(live, &mut report);

        if report.has_changes() {
            self.repository.save(live)?;
            report.persisted = true;
            info!(content_type = %live.alias, "saved content type");
        } else {
            debug!(content_type = %live.alias, "no changes");
        }

        Ok(report)
    }

    fn apply_parent(
        &self,
        target: &Definition,
        live: &mut ContentType,
        report: &mut ReconcileReport,
    ) {
        let Some(alias) = target.parent_alias.as_deref() else {
            if live.parent_id.is_some() {
                live.parent_id = None;
                live.path = format!("{ROOT_PATH},{}", live.id);
                report.parent_changed = true;
            }
            return;
        };

        if alias == live.alias {
            report.parent_error = Some(CoreError::invalid_operation(format!(
                "'{alias}' cannot be its own parent"
            )));
            return;
        }

        match self.repository.get_by_alias(alias) {
            Some(parent) => {
                let path = format!("{},{}", parent.path, live.id);
                if live.parent_id != Some(parent.id) || live.path != path {
                    live.parent_id = Some(parent.id);
                    live.path = path;
                    report.parent_changed = true;
                }
            }
            None => {
                warn!(content_type = %live.alias, parent = alias, "parent not found");
                report.parent_error = Some(CoreError::unresolved_parent(alias));
            }
        }
    }

    fn apply_info(target: &Definition, live: &mut ContentType, report: &mut ReconcileReport) {
        let mut changed = false;
        for (wanted, current) in [
            (&target.name, &mut live.name),
            (&target.icon, &mut live.icon),
            (&target.thumbnail, &mut live.thumbnail),
            (&target.description, &mut live.description),
        ] {
            if let Some(wanted) = wanted {
                if *current != *wanted {
                    current.clone_from(wanted);
                    changed = true;
                }
            }
        }
        if let Some(container) = target.is_container {
            if live.is_container != container {
                live.is_container = container;
                changed = true;
            }
        }
        report.info_changed = changed;
    }

    fn apply_structure(
        &self,
        target: &Definition,
        live: &mut ContentType,
        report: &mut ReconcileReport,
    ) {
        let mut children = Vec::with_capacity(target.allowed_children.len());
        for alias in &target.allowed_children {
            let id = if *alias == live.alias {
                Some(live.id)
            } else {
                self.repository.get_by_alias(alias).map(|c| c.id)
            };
            match id {
                Some(id) if !children.contains(&id) => children.push(id),
                Some(_) => {}
                None => {
                    debug!(content_type = %live.alias, child = %alias, "allowed child not found");
                    report.unresolved_children.push(alias.clone());
                }
            }
        }
        if live.allowed_children != children {
            live.allowed_children = children;
            report.structure_changed = true;
        }
    }

    fn apply_group_order(
        target: &Definition,
        live: &mut ContentType,
        report: &mut ReconcileReport,
    ) {
        for group in &target.groups {
            let Some(order) = group.sort_order else {
                continue;
            };
            if let Some(existing) = live.group_mut(&group.name) {
                if existing.sort_order != order {
                    existing.sort_order = order;
                    report.groups_reordered.push(group.name.clone());
                }
            }
        }
    }

    /// Updates matched properties in place and returns the planned
    /// removals and moves.
    fn update_properties(
        &self,
        target: &Definition,
        live: &mut ContentType,
        report: &mut ReconcileReport,
    ) -> (Vec<String>, Vec<(String, String)>) {
        let mut removals = Vec::new();
        let mut moves = Vec::new();

        for alias in live.property_aliases() {
            let Some(wanted) = target.property(&alias) else {
                removals.push(alias);
                continue;
            };

            let resolved = match live.property(&alias) {
                Some(current) if current.editor_kind != wanted.editor_kind => {
                    match self.editors.resolve(&wanted.editor_kind) {
                        Some(definition) => Some(definition.id),
                        None => {
                            report.property_error(
                                &alias,
                                CoreError::unknown_editor_kind(&alias, &wanted.editor_kind),
                            );
                            continue;
                        }
                    }
                }
                _ => None,
            };

            if let Some(property) = live.property_mut(&alias) {
                let mut changed = false;
                if let Some(data_type_id) = resolved {
                    property.editor_kind.clone_from(&wanted.editor_kind);
                    property.data_type_id = data_type_id;
                    changed = true;
                }
                changed |= overwrite(property, wanted);
                if changed {
                    debug!(content_type = %live.alias, property = %alias, "updated property");
                    report.updated.push(alias.clone());
                }
            }

            // A blank group never moves the property
            let Some(group) = wanted.group.as_deref() else {
                continue;
            };
            Self::ensure_group(target, live, group, report);
            if live.group_of(&alias) != Some(group) {
                moves.push((alias, group.to_string()));
            }
        }

        (removals, moves)
    }

    fn add_properties(
        &self,
        target: &Definition,
        live: &mut ContentType,
        report: &mut ReconcileReport,
    ) {
        for wanted in target.properties() {
            if live.property(&wanted.alias).is_some() {
                continue;
            }
            let Some(group) = wanted.group.as_deref() else {
                report.property_error(&wanted.alias, CoreError::ungrouped(&wanted.alias));
                continue;
            };
            let Some(definition) = self.editors.resolve(&wanted.editor_kind) else {
                report.property_error(
                    &wanted.alias,
                    CoreError::unknown_editor_kind(&wanted.alias, &wanted.editor_kind),
                );
                continue;
            };

            let mut property = PropertyType::new(&wanted.alias, &wanted.editor_kind);
            property.data_type_id = definition.id;
            overwrite(&mut property, wanted);

            Self::ensure_group(target, live, group, report);
            match live.add_property(group, property) {
                Ok(()) => {
                    info!(
                        content_type = %live.alias,
                        property = %wanted.alias,
                        group,
                        "added property"
                    );
                    report.added.push(wanted.alias.clone());
                }
                Err(error) => report.property_error(&wanted.alias, error),
            }
        }
    }

    fn ensure_group(
        target: &Definition,
        live: &mut ContentType,
        name: &str,
        report: &mut ReconcileReport,
    ) {
        if live.group(name).is_some() {
            return;
        }
        let sort_order = target
            .group(name)
            .and_then(|g| g.sort_order)
            .unwrap_or_else(|| live.groups.iter().map(|g| g.sort_order + 1).max().unwrap_or(0));
        live.add_group(name, sort_order);
        debug!(content_type = %live.alias, group = name, "created group");
        report.groups_created.push(name.to_string());
    }

    fn link_groups(&self, live: &mut ContentType, report: &mut ReconcileReport) {
        let parent = live.parent_id.and_then(|id| self.repository.get_by_id(id));
        for group in &mut live.groups {
            let link = parent.as_ref().and_then(|p| {
                p.groups
                    .iter()
                    .find(|g| g.name == group.name && g.parent_group.is_none())
                    .map(|g| g.name.clone())
            });
            if group.parent_group != link {
                group.parent_group = link;
                report.groups_relinked.push(group.name.clone());
            }
        }
    }
}

/// Copies the target's scalar fields onto a live property.
fn overwrite(property: &mut PropertyType, wanted: &PropertyDefinition) -> bool {
    let before = property.clone();
    property.name.clone_from(&wanted.name);
    property.description.clone_from(&wanted.description);
    property.mandatory = wanted.mandatory;
    property.validation.clone_from(&wanted.validation);
    property.sort_order = wanted.sort_order.unwrap_or(0);
    *property != before
}

//! Structural diff between a target document and a live export.
//!
//! Each facet answers one question: does the live side already satisfy
//! the target? Comparison is one-directional. The target is the source of
//! truth, and extra information on the live side only shows up through
//! the descendant counts that guard the property and structure facets.
//!
//! Both sides are canonicalized before comparison, so field order,
//! `Hash`/`Nodes`, tab ids and `SortOrder` spelling never register as
//! changes.

use crate::canonical::canonicalize;
use crate::document::{
    self, ALIAS, CAPTION, GENERIC_PROPERTIES, INFO, MASTER, STRUCTURE, TABS, TYPE,
};
use crate::error::{CoreError, CoreResult};
use crate::hash::digest_canonical;
use typesync_codec::Value;

/// Which facets of a definition differ from the live side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffReport {
    /// Name, icon, alias and other `Info` fields.
    pub info_changed: bool,
    /// Properties or tabs.
    pub properties_changed: bool,
    /// Allowed child types.
    pub structure_changed: bool,
    /// Parent type.
    pub parent_changed: bool,
}

impl DiffReport {
    /// Returns true if any facet changed.
    #[must_use]
    pub const fn any(&self) -> bool {
        self.info_changed
            || self.properties_changed
            || self.structure_changed
            || self.parent_changed
    }
}

/// Compares the `Info` blocks.
///
/// # Errors
///
/// Returns `MissingField` if the target has no `Info`, or any
/// canonicalization error.
pub fn info_changed(target: &Value, live: &Value) -> CoreResult<bool> {
    let (target, live) = canonical_pair(target, live)?;
    info_facet(&target, &live)
}

/// Compares properties and tabs.
///
/// # Errors
///
/// Returns any canonicalization error.
pub fn properties_changed(target: &Value, live: &Value) -> CoreResult<bool> {
    let (target, live) = canonical_pair(target, live)?;
    Ok(properties_facet(&target, &live))
}

/// Compares the allowed child lists.
///
/// # Errors
///
/// Returns any canonicalization error.
pub fn structure_changed(target: &Value, live: &Value) -> CoreResult<bool> {
    let (target, live) = canonical_pair(target, live)?;
    Ok(structure_facet(&target, &live))
}

/// Compares the target `Master` alias with the live parent alias.
///
/// An empty alias and an absent one are the same.
///
/// # Errors
///
/// Returns `MissingField` if the target has no `Info`.
pub fn parent_changed(target: &Value, live_parent_alias: Option<&str>) -> CoreResult<bool> {
    let info = target
        .get(INFO)
        .ok_or_else(|| CoreError::missing_field(INFO))?;
    Ok(parent_facet(info, live_parent_alias))
}

/// Runs every facet.
///
/// # Errors
///
/// Returns `MissingField` if the target has no `Info`, or any
/// canonicalization error.
pub fn diff(
    target: &Value,
    live: &Value,
    live_parent_alias: Option<&str>,
) -> CoreResult<DiffReport> {
    let (target, live) = canonical_pair(target, live)?;
    let info_changed = info_facet(&target, &live)?;
    let target_info = target
        .get(INFO)
        .ok_or_else(|| CoreError::missing_field(INFO))?;

    Ok(DiffReport {
        info_changed,
        properties_changed: properties_facet(&target, &live),
        structure_changed: structure_facet(&target, &live),
        parent_changed: parent_facet(target_info, live_parent_alias),
    })
}

/// Returns true as soon as one facet differs, checking info, properties,
/// structure and parent in that order.
///
/// # Errors
///
/// Returns `MissingField` if the target has no `Info`, or any
/// canonicalization error.
pub fn any_changed(
    target: &Value,
    live: &Value,
    live_parent_alias: Option<&str>,
) -> CoreResult<bool> {
    let (target, live) = canonical_pair(target, live)?;
    if info_facet(&target, &live)?
        || properties_facet(&target, &live)
        || structure_facet(&target, &live)
    {
        return Ok(true);
    }
    let info = target
        .get(INFO)
        .ok_or_else(|| CoreError::missing_field(INFO))?;
    Ok(parent_facet(info, live_parent_alias))
}

fn canonical_pair(target: &Value, live: &Value) -> CoreResult<(Value, Value)> {
    Ok((canonicalize(target)?, canonicalize(live)?))
}

fn info_facet(target: &Value, live: &Value) -> CoreResult<bool> {
    let info = target
        .get(INFO)
        .ok_or_else(|| CoreError::missing_field(INFO))?;
    Ok(node_changed(info, live.get(INFO)))
}

fn properties_facet(target: &Value, live: &Value) -> bool {
    let target_count = target.get(GENERIC_PROPERTIES).map_or(0, Value::descendant_count);
    let live_count = live.get(GENERIC_PROPERTIES).map_or(0, Value::descendant_count);
    if target_count != live_count {
        return true;
    }

    let live_properties = document::entries(live, GENERIC_PROPERTIES);
    for property in document::entries(target, GENERIC_PROPERTIES) {
        let alias = document::text(property, ALIAS);
        let kind = document::text(property, TYPE);
        let counterpart = live_properties.iter().find(|p| {
            document::text(p, ALIAS) == alias && document::text(p, TYPE) == kind
        });
        let same = counterpart.is_some_and(|p| digest_canonical(p) == digest_canonical(property));
        if !same {
            return true;
        }
    }

    let live_tabs = document::entries(live, TABS);
    for tab in document::entries(target, TABS) {
        let caption = document::text(tab, CAPTION);
        let counterpart = live_tabs
            .iter()
            .find(|t| document::text(t, CAPTION) == caption);
        if let Some(live_tab) = counterpart {
            if node_changed(tab, Some(live_tab)) {
                return true;
            }
        }
    }

    false
}

fn structure_facet(target: &Value, live: &Value) -> bool {
    let target_structure = target.get(STRUCTURE);
    let live_structure = live.get(STRUCTURE);

    let changed = target_structure.is_some_and(|s| node_changed(s, live_structure));
    changed
        || target_structure.map_or(0, Value::descendant_count)
            != live_structure.map_or(0, Value::descendant_count)
}

fn parent_facet(target_info: &Value, live_parent_alias: Option<&str>) -> bool {
    let target_parent = document::text(target_info, MASTER).unwrap_or_default();
    let live_parent = live_parent_alias.map(str::trim).unwrap_or_default();
    target_parent != live_parent
}

/// Returns true unless every non-blank leaf below `source` has a leaf of
/// the same name and text somewhere below `target`.
fn node_changed(source: &Value, target: Option<&Value>) -> bool {
    let mut wanted = Vec::new();
    collect_leaves(source, "", &mut wanted);

    let mut available = Vec::new();
    if let Some(target) = target {
        collect_leaves(target, "", &mut available);
    }

    wanted
        .iter()
        .filter(|(_, value)| !value.is_blank())
        .any(|(name, value)| {
            let text = value.to_text();
            !available
                .iter()
                .any(|(other_name, other)| other_name == name && other.to_text() == text)
        })
}

/// Leaves paired with the name of the nearest enclosing map field.
fn collect_leaves<'a>(value: &'a Value, name: &'a str, out: &mut Vec<(&'a str, &'a Value)>) {
    match value {
        Value::Map(pairs) => {
            for (key, child) in pairs {
                collect_leaves(child, key.as_text().unwrap_or(name), out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_leaves(item, name, out);
            }
        }
        leaf => out.push((name, leaf)),
    }
}

//! Rendering live content types as definition documents.

use crate::document::{
    ALIAS, CAPTION, CONTAINER, DESCRIPTION, GENERIC_PROPERTIES, ICON, ID, INFO, MANDATORY,
    MASTER, NAME, ORDER, SORT_ORDER, STRUCTURE, TAB, TABS, THUMBNAIL, TYPE, VALIDATION,
};
use crate::layout::scrub_file_name;
use crate::model::{ContentType, ContentTypeId};
use crate::repository::ContentTypeRepository;
use std::path::PathBuf;
use typesync_codec::Value;

/// Renders a live content type as a definition document.
///
/// References to other content types (parent, allowed children) are
/// written as aliases, looked up through `repository`. Children that no
/// longer exist are left out.
#[must_use]
pub fn export_content_type(
    content_type: &ContentType,
    repository: &dyn ContentTypeRepository,
) -> Value {
    let master = parent_alias(content_type, repository).unwrap_or_default();

    let info = Value::object([
        (ALIAS, Value::from(content_type.alias.as_str())),
        (NAME, Value::from(content_type.name.as_str())),
        (ICON, Value::from(content_type.icon.as_str())),
        (THUMBNAIL, Value::from(content_type.thumbnail.as_str())),
        (DESCRIPTION, Value::from(content_type.description.as_str())),
        (MASTER, Value::from(master)),
        (CONTAINER, Value::from(content_type.is_container)),
    ]);

    let structure = content_type
        .allowed_children
        .iter()
        .filter_map(|id| alias_of(*id, content_type, repository))
        .map(Value::Text)
        .collect();

    let mut groups: Vec<_> = content_type.groups.iter().collect();
    groups.sort_by_key(|g| g.sort_order);

    let tabs = groups
        .iter()
        .map(|group| {
            Value::object([
                (ID, Value::Integer(group.id)),
                (CAPTION, Value::from(group.name.as_str())),
                (SORT_ORDER, Value::Integer(group.sort_order)),
                (ORDER, Value::Integer(group.sort_order)),
            ])
        })
        .collect();

    let mut properties = Vec::with_capacity(content_type.property_count());
    for group in &groups {
        let mut members: Vec<_> = group.properties.iter().collect();
        members.sort_by_key(|p| p.sort_order);
        for property in members {
            properties.push(Value::object([
                (ALIAS, Value::from(property.alias.as_str())),
                (NAME, Value::from(property.name.as_str())),
                (TYPE, Value::from(property.editor_kind.as_str())),
                (TAB, Value::from(group.name.as_str())),
                (DESCRIPTION, Value::from(property.description.as_str())),
                (MANDATORY, Value::from(property.mandatory)),
                (
                    VALIDATION,
                    Value::from(property.validation.clone().unwrap_or_default()),
                ),
                (SORT_ORDER, Value::Integer(property.sort_order)),
            ]));
        }
    }

    Value::object([
        (INFO, info),
        (STRUCTURE, Value::Array(structure)),
        (TABS, Value::Array(tabs)),
        (GENERIC_PROPERTIES, Value::Array(properties)),
    ])
}

/// Alias of the live parent, if it resolves.
#[must_use]
pub fn parent_alias(
    content_type: &ContentType,
    repository: &dyn ContentTypeRepository,
) -> Option<String> {
    content_type
        .parent_id
        .and_then(|id| repository.get_by_id(id))
        .map(|parent| parent.alias)
}

/// Folder of a content type's snapshot, relative to the type folder.
///
/// The chain of scrubbed aliases from the root ancestor down to the
/// content type itself, e.g. `base/page`.
#[must_use]
pub fn sync_path(content_type: &ContentType, repository: &dyn ContentTypeRepository) -> PathBuf {
    let mut chain = vec![scrub_file_name(&content_type.alias)];
    let mut visited = vec![content_type.id];
    let mut next = content_type.parent_id;

    while let Some(id) = next {
        if visited.contains(&id) {
            break;
        }
        let Some(parent) = repository.get_by_id(id) else {
            break;
        };
        visited.push(id);
        chain.push(scrub_file_name(&parent.alias));
        next = parent.parent_id;
    }

    chain.iter().rev().collect()
}

fn alias_of(
    id: ContentTypeId,
    owner: &ContentType,
    repository: &dyn ContentTypeRepository,
) -> Option<String> {
    if id == owner.id {
        return Some(owner.alias.clone());
    }
    repository.get_by_id(id).map(|c| c.alias)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyType;
    use crate::repository::MemoryRepository;

    #[test]
    fn exports_every_section() {
        let repo = MemoryRepository::new();
        let base = repo.create("base", "Base").unwrap();
        let article = repo.create("article", "Article").unwrap();

        let mut page = ContentType::new("page", "Page");
        page.parent_id = Some(base.id);
        page.allowed_children = vec![article.id, 424_242];
        page.add_group("Meta", 2);
        page.add_group("Content", 1);
        let mut body = PropertyType::new("body", "richtext");
        body.sort_order = 2;
        page.add_property("Content", body).unwrap();
        page.add_property("Content", PropertyType::new("title", "textbox"))
            .unwrap();
        page.add_property("Meta", PropertyType::new("keywords", "tags"))
            .unwrap();
        let page = repo.insert(page).unwrap();

        let doc = export_content_type(&page, &repo);
        let info = doc.get("Info").unwrap();
        assert_eq!(info.get("Master"), Some(&Value::from("base")));
        assert_eq!(
            doc.get("Structure"),
            Some(&Value::Array(vec![Value::from("article")]))
        );

        let tabs = doc.get("Tabs").unwrap().as_array().unwrap();
        assert_eq!(tabs[0].get("Caption"), Some(&Value::from("Content")));

        let aliases: Vec<_> = doc
            .get("GenericProperties")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|p| p.get("Alias").and_then(Value::as_text))
            .collect();
        assert_eq!(aliases, vec!["title", "body", "keywords"]);
    }

    #[test]
    fn sync_path_follows_ancestors() {
        let repo = MemoryRepository::new();
        let base = repo.create("base", "Base").unwrap();

        let mut page = ContentType::new("page", "Page");
        page.parent_id = Some(base.id);
        let page = repo.insert(page).unwrap();

        let mut news = ContentType::new("news?", "News");
        news.parent_id = Some(page.id);
        let news = repo.insert(news).unwrap();

        assert_eq!(sync_path(&base, &repo), PathBuf::from("base"));
        assert_eq!(sync_path(&news, &repo), PathBuf::from("base/page/news"));
    }

    #[test]
    fn orphan_exports_blank_master() {
        let repo = MemoryRepository::new();
        let page = repo.create("page", "Page").unwrap();
        let doc = export_content_type(&page, &repo);
        assert_eq!(
            doc.get("Info").and_then(|i| i.get("Master")),
            Some(&Value::from(""))
        );
    }
}

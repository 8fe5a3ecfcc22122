use super::{LOG_TARGET, id_string};
use crate::badge::{Badge, BadgeMap};
use crate::sources::TreeSnapshot;
use crate::sources::keywords::{self, ENMITY, ENMITY_DEFAULT};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Deserialize)]
struct Definition {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    url: Option<Urls>,
}

#[derive(Deserialize)]
struct Urls {
    #[serde(default)]
    dark: Option<String>,
}

/// Resolves each user's badge ids against the definition files.
///
/// Badges whose name matches a known role use the bundled icon for that role; the rest use their
/// own dark-theme icon. Unnamed badges, and badges with no usable icon, are skipped.
#[must_use]
pub fn normalize(tree: &TreeSnapshot) -> BadgeMap {
    let definitions: HashMap<String, Definition> = tree
        .definitions
        .iter()
        .filter_map(|value| match Definition::deserialize(value) {
            Ok(def) => Some((def.id.clone(), def)),
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Skipping malformed enmity badge definition: {e}");
                None
            }
        })
        .collect();

    tree.users
        .iter()
        .map(|(user_id, ids)| {
            let badges = ids
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(id_string)
                .filter_map(|id| definitions.get(&id))
                .filter_map(resolve)
                .collect();
            (user_id.clone(), badges)
        })
        .collect()
}

fn resolve(def: &Definition) -> Option<Badge> {
    let name = def.name.as_deref().filter(|name| !name.is_empty())?;
    let kind = keywords::classify(name, ENMITY, ENMITY_DEFAULT);
    let icon = if kind.is_empty() {
        def.url.as_ref()?.dark.clone()?
    } else {
        format!("/public/badges/enmity/{kind}.png")
    };

    Some(Badge::new(name, icon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree() -> TreeSnapshot {
        TreeSnapshot {
            users: vec![("11".to_string(), json!(["staff", "art", "blank", "iconless", "missing"]))],
            definitions: vec![
                json!({"id": "staff", "name": "Enmity Staff", "url": {"dark": "https://cdn.example.com/s.png"}}),
                json!({"id": "art", "name": "Artist", "url": {"dark": "https://cdn.example.com/art.png", "light": "x"}}),
                json!({"id": "blank", "name": "", "url": {"dark": "https://cdn.example.com/b.png"}}),
                json!({"id": "iconless", "name": "Friend"}),
                json!({"name": "no id"}),
            ],
        }
    }

    #[test]
    fn test_resolves_ids_with_keyword_icons() {
        let map = normalize(&tree());
        assert_eq!(
            map.get("11").unwrap(),
            [
                Badge::new("Enmity Staff", "/public/badges/enmity/staff.png"),
                Badge::new("Artist", "https://cdn.example.com/art.png"),
            ]
        );
    }
}

use super::id_string;
use crate::badge::{Badge, BadgeMap};
use serde_json::Value;
use std::collections::BTreeSet;

/// Gives every plugin author listed in `manifest` one `contributor` badge.
///
/// Authors appearing on several plugins get a single badge, and users who already carry a badge
/// with the same tooltip are left alone.
pub fn append(map: &mut BadgeMap, manifest: &Value, contributor: &Badge) {
    let authors: BTreeSet<String> = manifest
        .as_array()
        .into_iter()
        .flatten()
        .flat_map(|plugin| plugin["authors"].as_array().into_iter().flatten())
        .filter_map(|author| id_string(&author["id"]))
        .collect();

    for author in authors {
        let _ = map.push_unique(author, contributor.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_one_badge_per_author() {
        let manifest = json!([
            {"name": "A", "authors": [{"name": "x", "id": "100"}, {"name": "y", "id": "200"}]},
            {"name": "B", "authors": [{"name": "x", "id": "100"}]},
            {"name": "C", "authors": [{"name": "nobody"}]},
            {"name": "D"},
        ]);
        let contributor = Badge::new("Vencord Contributor", "/public/badges/vencord.png");

        let mut map = BadgeMap::new();
        append(&mut map, &manifest, &contributor);

        assert_eq!(map.user_count(), 2);
        assert_eq!(map.get("100").unwrap(), [contributor.clone()]);
        assert_eq!(map.get("200").unwrap(), [contributor]);
    }

    #[test]
    fn test_existing_badge_with_same_tooltip_is_kept() {
        let contributor = Badge::new("Vencord Contributor", "/public/badges/vencord.png");
        let mut map = BadgeMap::new();
        map.push("100", Badge::new("Vencord Contributor", "https://cdn.example.com/custom.png"));
        map.push("100", Badge::new("Donor", "https://cdn.example.com/donor.png"));

        append(&mut map, &json!([{"authors": [{"id": 100}]}]), &contributor);

        let badges = map.get("100").unwrap();
        assert_eq!(badges.len(), 2);
        assert_eq!(badges[0].badge, "https://cdn.example.com/custom.png");
    }
}

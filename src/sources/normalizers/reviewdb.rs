use super::records;
use crate::badge::{Badge, BadgeMap};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
struct Record {
    #[serde(rename = "discordID")]
    discord_id: String,
    name: String,
    icon: String,
}

/// Groups the flat record list by user.
#[must_use]
pub fn normalize(value: &Value) -> BadgeMap {
    let mut map = BadgeMap::new();
    for record in records::<Record>(value) {
        map.push(record.discord_id, Badge::new(record.name, record.icon));
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_groups_by_user_in_order() {
        let value = json!([
            {"discordID": "1", "name": "Admin", "icon": "https://cdn.example.com/admin.png", "type": 1},
            {"discordID": "2", "name": "Donor", "icon": "https://cdn.example.com/donor.png"},
            {"discordID": "1", "name": "Donor", "icon": "https://cdn.example.com/donor.png"},
            {"name": "orphan", "icon": "x"},
        ]);

        let map = normalize(&value);
        assert_eq!(map.user_count(), 2);
        let first = map.get("1").unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].tooltip, "Admin");
        assert_eq!(first[1].tooltip, "Donor");
    }
}

use super::{LOG_TARGET, records};
use crate::badge::{Badge, BadgeMap};
use crate::sources::TreeSnapshot;
use serde::Deserialize;

#[derive(Deserialize)]
struct Record {
    name: String,
    badge: String,
    #[serde(default)]
    pending: Option<bool>,
}

/// Reads one file per user. Blocked users and pending badges are left out.
#[must_use]
pub fn normalize(tree: &TreeSnapshot) -> BadgeMap {
    tree.users
        .iter()
        .filter(|(user_id, doc)| {
            let blocked = doc["blocked"].as_bool() == Some(true);
            if blocked {
                log::debug!(target: LOG_TARGET, "Skipping blocked badgevault user '{user_id}'");
            }
            !blocked
        })
        .map(|(user_id, doc)| {
            let badges = records::<Record>(&doc["badges"])
                .filter(|r| r.pending != Some(true))
                .map(|r| Badge::new(r.name, r.badge))
                .collect();
            (user_id.clone(), badges)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blocked_and_pending_are_suppressed() {
        let tree = TreeSnapshot {
            users: vec![
                (
                    "1".to_string(),
                    json!({"badges": [
                        {"name": "Approved", "badge": "https://cdn.example.com/a.png"},
                        {"name": "Waiting", "badge": "https://cdn.example.com/w.png", "pending": true},
                        {"name": "Explicit", "badge": "https://cdn.example.com/e.png", "pending": false},
                    ]}),
                ),
                (
                    "2".to_string(),
                    json!({"blocked": true, "badges": [{"name": "Hidden", "badge": "https://cdn.example.com/h.png"}]}),
                ),
            ],
            definitions: Vec::new(),
        };

        let map = normalize(&tree);
        assert_eq!(map.user_count(), 1);
        let badges = map.get("1").unwrap();
        assert_eq!(badges.len(), 2);
        assert_eq!(badges[0].tooltip, "Approved");
        assert_eq!(badges[1].tooltip, "Explicit");
    }
}

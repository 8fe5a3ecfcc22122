use super::{entries, records};
use crate::badge::{Badge, BadgeMap};
use serde::Deserialize;
use serde_json::Value;

/// Roles that come with a bundled icon. Other roles are not shown.
const ICON_ROLES: &[&str] = &["donor", "contributor", "dev"];

#[derive(Deserialize)]
struct Custom {
    url: String,
    text: String,
}

/// Turns recognized roles into bundled-icon badges, followed by the user's custom badges.
#[must_use]
pub fn normalize(value: &Value) -> BadgeMap {
    entries(&value["users"])
        .map(|(user_id, user)| {
            let roles = records::<String>(&user["roles"]).filter_map(|role| {
                let lower = role.to_lowercase();
                ICON_ROLES
                    .contains(&lower.as_str())
                    .then(|| Badge::new(role, format!("/public/badges/aliucord/{lower}.png")))
            });
            let custom = records::<Custom>(&user["custom"]).map(|c| Badge::new(c.text, c.url));
            (user_id.clone(), roles.chain(custom).collect())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_roles_then_custom() {
        let value = json!({
            "users": {
                "5": {
                    "roles": ["DEV", "moderator", "Donor"],
                    "custom": [{"url": "https://cdn.example.com/c.png", "text": "Cool"}, {"text": "no url"}],
                },
                "6": {"roles": ["moderator"]},
            },
        });

        let map = normalize(&value);
        assert_eq!(map.user_count(), 1);
        assert_eq!(
            map.get("5").unwrap(),
            [
                Badge::new("DEV", "/public/badges/aliucord/dev.png"),
                Badge::new("Donor", "/public/badges/aliucord/donor.png"),
                Badge::new("Cool", "https://cdn.example.com/c.png"),
            ]
        );
    }
}

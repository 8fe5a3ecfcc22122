use super::{entries, records};
use crate::badge::{Badge, BadgeMap};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
struct Record {
    label: String,
    url: String,
}

#[must_use]
pub fn normalize(value: &Value) -> BadgeMap {
    entries(value)
        .map(|(user_id, items)| {
            let badges = records::<Record>(items).map(|r| Badge::new(r.label, r.url)).collect();
            (user_id.clone(), badges)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_label_becomes_tooltip() {
        let map = normalize(&json!({"3": [{"label": "Owner", "url": "https://cdn.example.com/o.png"}]}));
        assert_eq!(map.get("3").unwrap(), [Badge::new("Owner", "https://cdn.example.com/o.png")]);
    }
}

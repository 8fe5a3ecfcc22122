use super::{entries, records};
use crate::badge::{Badge, BadgeMap};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
struct Record {
    tooltip: String,
    badge: String,
}

#[must_use]
pub fn normalize(value: &Value) -> BadgeMap {
    entries(value)
        .map(|(user_id, items)| {
            let badges = records::<Record>(items).map(|r| Badge::new(r.tooltip, r.badge)).collect();
            (user_id.clone(), badges)
        })
        .collect()
}

use super::{entries, records};
use crate::badge::{Badge, BadgeMap};
use crate::sources::keywords::{self, AERO, AERO_DEFAULT};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
struct Record {
    text: String,
}

/// Uses the badge text as tooltip and picks a bundled icon from it.
#[must_use]
pub fn normalize(value: &Value) -> BadgeMap {
    entries(value)
        .map(|(user_id, items)| {
            let badges = records::<Record>(items)
                .map(|record| {
                    let kind = keywords::classify(&record.text, AERO, AERO_DEFAULT);
                    Badge::new(record.text, format!("/public/badges/aero/{kind}.png"))
                })
                .collect();
            (user_id.clone(), badges)
        })
        .collect()
}

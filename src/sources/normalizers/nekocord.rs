use super::{LOG_TARGET, entries, id_string};
use crate::badge::{Badge, BadgeMap};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Deserialize)]
struct Definition {
    name: String,
    image: String,
}

/// Joins per-user badge id lists against the shared definition table.
#[must_use]
pub fn normalize(value: &Value) -> BadgeMap {
    let definitions: HashMap<&str, Definition> = entries(&value["badges"])
        .filter_map(|(id, def)| match Definition::deserialize(def) {
            Ok(def) => Some((id.as_str(), def)),
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Skipping malformed nekocord badge definition '{id}': {e}");
                None
            }
        })
        .collect();

    entries(&value["users"])
        .map(|(user_id, user)| {
            let badges = user["badges"]
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(id_string)
                .filter_map(|id| definitions.get(id.as_str()))
                .map(|def| Badge::new(&def.name, &def.image))
                .collect();
            (user_id.clone(), badges)
        })
        .collect()
}

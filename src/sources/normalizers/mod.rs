//! One normalizer per upstream format.
//!
//! Every normalizer is tolerant: a record that does not fit the expected shape is skipped with a
//! debug log, never failing the whole payload.

pub mod aero;
pub mod aliucord;
pub mod badgevault;
pub mod contributors;
pub mod direct;
pub mod enmity;
pub mod nekocord;
pub mod ra1ncord;
pub mod reviewdb;

use serde::de::DeserializeOwned;
use serde_json::Value;

const LOG_TARGET: &str = " normalize";

/// Deserializes each element of a JSON array, skipping elements that do not fit `T`.
fn records<T: DeserializeOwned>(value: &Value) -> impl Iterator<Item = T> {
    value.as_array().into_iter().flatten().filter_map(|item| match T::deserialize(item) {
        Ok(record) => Some(record),
        Err(e) => {
            log::debug!(target: LOG_TARGET, "Skipping malformed record: {e}");
            None
        }
    })
}

/// Iterates the members of a JSON object. Anything else yields nothing.
fn entries(value: &Value) -> impl Iterator<Item = (&String, &Value)> {
    if !value.is_object() && !value.is_null() {
        log::debug!(target: LOG_TARGET, "Expected a JSON object, ignoring value");
    }

    value.as_object().into_iter().flatten()
}

/// Reads an id that upstreams publish either as a string or as a number.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

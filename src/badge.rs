//! The common badge shape every source is normalized into.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;

/// A single badge shown for a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Badge {
    /// Display label.
    pub tooltip: String,

    /// Icon URL, or a server-relative path starting with `/`.
    pub badge: String,
}

impl Badge {
    #[must_use]
    pub fn new(tooltip: impl Into<String>, badge: impl Into<String>) -> Self {
        Self {
            tooltip: tooltip.into(),
            badge: badge.into(),
        }
    }

    /// Returns a copy whose server-relative icon path is prefixed with `origin`.
    ///
    /// Absolute icon URLs are returned unchanged, as is everything when no origin is given.
    #[must_use]
    pub fn with_origin(&self, origin: Option<&str>) -> Self {
        match origin {
            Some(origin) if self.badge.starts_with('/') => Self {
                tooltip: self.tooltip.clone(),
                badge: format!("{}{}", origin.trim_end_matches('/'), self.badge),
            },
            _ => self.clone(),
        }
    }
}

/// Normalized data of one source: user id to that user's badges, in source order.
///
/// Serializes as a plain JSON object so the cached payload stays readable by other consumers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BadgeMap(BTreeMap<String, Vec<Badge>>);

impl BadgeMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Badges for `user_id`, if the user has any.
    #[must_use]
    pub fn get(&self, user_id: &str) -> Option<&[Badge]> {
        self.0.get(user_id).map(Vec::as_slice)
    }

    /// Appends a badge to the user's list, creating the list if needed.
    pub fn push(&mut self, user_id: impl Into<String>, badge: Badge) {
        self.0.entry(user_id.into()).or_default().push(badge);
    }

    /// Appends a badge unless the user already has one with the same tooltip.
    ///
    /// Returns `true` if the badge was added.
    pub fn push_unique(&mut self, user_id: impl Into<String>, badge: Badge) -> bool {
        let badges = self.0.entry(user_id.into()).or_default();
        if badges.iter().any(|existing| existing.tooltip == badge.tooltip) {
            return false;
        }

        badges.push(badge);
        true
    }

    /// Replaces the user's list. Empty lists are not stored.
    pub fn insert(&mut self, user_id: impl Into<String>, badges: Vec<Badge>) {
        if badges.is_empty() {
            return;
        }

        let _ = self.0.insert(user_id.into(), badges);
    }

    /// Number of users with at least one badge.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Vec<Badge>> {
        self.0.iter()
    }
}

impl FromIterator<(String, Vec<Badge>)> for BadgeMap {
    fn from_iter<I: IntoIterator<Item = (String, Vec<Badge>)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (user_id, badges) in iter {
            map.insert(user_id, badges);
        }
        map
    }
}

impl<'a> IntoIterator for &'a BadgeMap {
    type Item = (&'a String, &'a Vec<Badge>);
    type IntoIter = btree_map::Iter<'a, String, Vec<Badge>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

//! Read access to cached badge data.

use crate::badge::{Badge, BadgeMap};
use crate::metrics::MetricsSnapshot;
use crate::sources::{SourceId, SourceRegistry};
use crate::store::{BadgeCache, KvStore};
use std::collections::{BTreeMap, HashMap};

const LOG_TARGET: &str = "     query";

/// One user's badges, grouped by source in the order the sources were requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserBadges {
    by_source: Vec<(SourceId, Vec<Badge>)>,
}

impl UserBadges {
    /// All badges in one list, sources in request order.
    #[must_use]
    pub fn combined(&self) -> Vec<Badge> {
        self.by_source.iter().flat_map(|(_, badges)| badges.iter().cloned()).collect()
    }

    /// Badges keyed by source. Sources with cached data but no badges for the user map to an empty list.
    #[must_use]
    pub fn separated(&self) -> BTreeMap<SourceId, Vec<Badge>> {
        self.by_source.iter().cloned().collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_source.iter().all(|(_, badges)| badges.is_empty())
    }
}

/// Reads cached source data for consumers such as an HTTP layer.
///
/// Reads never fail. A store failure or an undecodable entry reads as absent and is counted in
/// the metrics.
#[derive(Debug, Clone)]
pub struct QueryService<S> {
    cache: BadgeCache<S>,
    registry: SourceRegistry,
}

impl<S: KvStore> QueryService<S> {
    #[must_use]
    pub const fn new(cache: BadgeCache<S>, registry: SourceRegistry) -> Self {
        Self { cache, registry }
    }

    /// Cached data for one source.
    pub async fn get_one(&self, source: SourceId) -> Option<BadgeMap> {
        self.cache.read(source).await
    }

    /// Cached data for several sources in one store round trip. Sources without data are absent.
    pub async fn get_many(&self, sources: &[SourceId]) -> HashMap<SourceId, BadgeMap> {
        self.cache.read_many(sources).await
    }

    /// One user's badges across `sources`.
    ///
    /// External sources are served live elsewhere and are skipped here. When `origin` is given,
    /// server-relative icon paths are prefixed with it.
    pub async fn badges_for_user(&self, user_id: &str, sources: &[SourceId], origin: Option<&str>) -> UserBadges {
        let mut requested: Vec<SourceId> = Vec::with_capacity(sources.len());
        for &source in sources {
            if requested.contains(&source) {
                continue;
            }

            match self.registry.get(source) {
                Some(descriptor) if descriptor.kind.is_cached() => requested.push(source),
                Some(_) => log::debug!(target: LOG_TARGET, "Source {source} is served live, skipping"),
                None => log::debug!(target: LOG_TARGET, "Source {source} is not registered, skipping"),
            }
        }

        let mut cached = self.get_many(&requested).await;

        let by_source = requested
            .into_iter()
            .filter_map(|source| {
                let Some(map) = cached.remove(&source) else {
                    log::warn!(target: LOG_TARGET, "No cached data for source {source}");
                    return None;
                };

                let badges = map
                    .get(user_id)
                    .unwrap_or_default()
                    .iter()
                    .map(|badge| badge.with_origin(origin))
                    .collect();
                Some((source, badges))
            })
            .collect();

        UserBadges { by_source }
    }

    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.cache.metrics()
    }

    pub fn reset_metrics(&self) {
        self.cache.reset_metrics();
    }
}

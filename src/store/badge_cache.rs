use super::{CacheKeys, KvStore};
use crate::Result;
use crate::badge::BadgeMap;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::sources::{SourceId, SourceRegistry};
use chrono::{DateTime, TimeDelta, Utc};
use core::time::Duration;
use ohno::{EnrichableExt, IntoAppError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use strum::Display;

const LOG_TARGET: &str = "     cache";

/// How a source's cache entry compares to the refresh interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Freshness {
    /// Both keys are present and younger than the interval.
    Fresh,

    /// The data or timestamp key is absent or unreadable.
    Missing,

    /// Both keys are present but at least one interval old.
    Expired,
}

/// Badge data for every source, stored in a [`KvStore`].
///
/// Each source has a data key holding its serialized [`BadgeMap`] and a timestamp key holding the
/// start time of the refresh cycle that wrote it, in milliseconds since the epoch. Both keys are
/// written together with the same expiry.
///
/// A data key may also hold the upstream document as fetched, written by an older deployment or
/// by hand. Such entries are normalized on read with the source's format from the registry.
#[derive(Debug, Clone)]
pub struct BadgeCache<S> {
    store: S,
    keys: CacheKeys,
    ttl: Duration,
    registry: SourceRegistry,
    metrics: Arc<Metrics>,
}

impl<S: KvStore> BadgeCache<S> {
    #[must_use]
    pub fn new(store: S, keys: CacheKeys, ttl: Duration, registry: SourceRegistry) -> Self {
        Self {
            store,
            keys,
            ttl,
            registry,
            metrics: Arc::new(Metrics::new()),
        }
    }

    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }

    /// Reads one source's data.
    ///
    /// Store failures and undecodable entries are logged and reported as absent.
    pub async fn read(&self, source: SourceId) -> Option<BadgeMap> {
        let key = self.keys.data(source);
        match self.store.get(&key).await {
            Ok(Some(raw)) => self.decode(source, &raw),
            Ok(None) => {
                self.metrics.record_miss();
                None
            }
            Err(e) => {
                self.metrics.record_error();
                log::warn!(target: LOG_TARGET, "Could not read cached data for source {source}: {e:#}");
                None
            }
        }
    }

    /// Reads several sources in one round trip.
    ///
    /// Only sources with decodable data appear in the result. Each source counts as one hit, miss,
    /// or error; a failed round trip counts as a single error.
    pub async fn read_many(&self, sources: &[SourceId]) -> HashMap<SourceId, BadgeMap> {
        if sources.is_empty() {
            return HashMap::new();
        }

        let keys: Vec<String> = sources.iter().map(|&s| self.keys.data(s)).collect();
        let values = match self.store.get_many(&keys).await {
            Ok(values) => values,
            Err(e) => {
                self.metrics.record_error();
                log::warn!(target: LOG_TARGET, "Could not read cached data for {} sources: {e:#}", sources.len());
                return HashMap::new();
            }
        };

        sources
            .iter()
            .zip(values)
            .filter_map(|(&source, value)| {
                let Some(raw) = value else {
                    self.metrics.record_miss();
                    return None;
                };

                self.decode(source, &raw).map(|map| (source, map))
            })
            .collect()
    }

    /// Decodes a data key, counting a hit or an error.
    fn decode(&self, source: SourceId, raw: &str) -> Option<BadgeMap> {
        let decoded = serde_json::from_str::<BadgeMap>(raw).or_else(|e| {
            let document: Value = serde_json::from_str(raw).map_err(|_| e.to_string())?;
            let descriptor = self.registry.get(source).ok_or_else(|| e.to_string())?;
            log::debug!(target: LOG_TARGET, "Normalizing stored upstream document for source {source}");
            descriptor.normalize_document(document).ok_or_else(|| e.to_string())
        });

        match decoded {
            Ok(map) => {
                self.metrics.record_hit();
                Some(map)
            }
            Err(e) => {
                self.metrics.record_error();
                log::warn!(target: LOG_TARGET, "Could not decode cached data for source {source}: {e}");
                None
            }
        }
    }

    /// Stores one source's data along with the cycle start time.
    pub async fn write(&self, source: SourceId, badges: &BadgeMap, cycle_started: DateTime<Utc>) -> Result<()> {
        let payload = serde_json::to_string(badges).into_app_err_with(|| format!("serializing badges for source {source}"))?;
        let entries = [
            (self.keys.data(source), payload),
            (self.keys.timestamp(source), cycle_started.timestamp_millis().to_string()),
        ];

        self.store
            .set_all_ex(&entries, self.ttl)
            .await
            .map_err(|e| e.enrich_with(|| format!("storing badges for source {source}")))
    }

    /// Compares the stored timestamp against `interval`.
    pub async fn freshness(&self, source: SourceId, now: DateTime<Utc>, interval: Duration) -> Result<Freshness> {
        let keys = [self.keys.data(source), self.keys.timestamp(source)];
        let values = self.store.get_many(&keys).await?;

        let (Some(Some(_)), Some(Some(stamp))) = (values.first(), values.get(1)) else {
            return Ok(Freshness::Missing);
        };

        let Some(stored) = stamp.parse::<i64>().ok().and_then(DateTime::<Utc>::from_timestamp_millis) else {
            log::debug!(target: LOG_TARGET, "Unreadable timestamp '{stamp}' for source {source}");
            return Ok(Freshness::Missing);
        };

        let interval = TimeDelta::from_std(interval).unwrap_or(TimeDelta::MAX);
        if now.signed_duration_since(stored) < interval {
            Ok(Freshness::Fresh)
        } else {
            Ok(Freshness::Expired)
        }
    }

    /// Removes one source's data and timestamp keys.
    ///
    /// Returns the number of keys addressed, whether or not they existed.
    pub async fn clear(&self, source: SourceId) -> Result<usize> {
        let keys = [self.keys.data(source), self.keys.timestamp(source)];
        let removed = self.store.delete(&keys).await?;
        log::debug!(target: LOG_TARGET, "Cleared source {source} ({removed} keys present)");
        Ok(keys.len())
    }
}

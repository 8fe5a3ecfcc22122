use super::file_tree;
use super::git;
use super::lock::DistributedLock;
use super::resilient_http::{FetchError, Fetcher};
use crate::Result;
use crate::config::Config;
use crate::metrics::MetricsSnapshot;
use crate::query::QueryService;
use crate::sources::{RawPayload, SourceDescriptor, SourceId, SourceKind, SourceRegistry, TreeLayout, TreeSnapshot};
use crate::store::{BadgeCache, CacheKeys, Freshness, KvStore};
use chrono::{DateTime, Utc};
use core::fmt;
use core::time::Duration;
use futures_util::future::join_all;
use ohno::{AppError, EnrichableExt, app_err, bail};
use serde_json::Value;
use std::path::PathBuf;
use url::Url;

const LOG_TARGET: &str = "   refresh";

/// Why a source was left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another instance holds the sync lock.
    LockHeld,

    /// The source is served live and has nothing to cache.
    NotCached,

    /// Every upstream part refused the request.
    NoData,
}

/// Result of refreshing one source.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// New data was stored.
    Updated { users: usize },

    Skipped(SkipReason),

    /// Nothing was stored. The previous cache entry, if any, stays in place.
    Failed(AppError),
}

impl RefreshOutcome {
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for RefreshOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Updated { users } => write!(f, "updated ({users} users)"),
            Self::Skipped(SkipReason::LockHeld) => write!(f, "skipped (sync in progress elsewhere)"),
            Self::Skipped(SkipReason::NotCached) => write!(f, "skipped (served live)"),
            Self::Skipped(SkipReason::NoData) => write!(f, "skipped (no data available)"),
            Self::Failed(e) => write!(f, "failed: {e:#}"),
        }
    }
}

/// Per-source outcomes of a refresh, in the order the sources were processed.
#[derive(Debug, Default)]
pub struct RefreshReport {
    outcomes: Vec<(SourceId, RefreshOutcome)>,
}

impl RefreshReport {
    pub fn iter(&self) -> impl Iterator<Item = (SourceId, &RefreshOutcome)> {
        self.outcomes.iter().map(|(id, outcome)| (*id, outcome))
    }

    #[must_use]
    pub fn get(&self, source: SourceId) -> Option<&RefreshOutcome> {
        self.outcomes.iter().find(|(id, _)| *id == source).map(|(_, outcome)| outcome)
    }

    #[must_use]
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|(_, outcome)| outcome.is_failure()).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Drives validity checks and refreshes for every source.
///
/// One refresh cycle checks whether any cached source is missing or stale and, if so, refreshes
/// all of them concurrently. A failing source never prevents the others from being stored.
pub struct Orchestrator<S> {
    registry: SourceRegistry,
    store: S,
    cache: BadgeCache<S>,
    lock: DistributedLock<S>,
    fetcher: Fetcher,
    refresh_interval: Duration,
    store_timeout: Duration,
    working_tree_dir: PathBuf,
    github_token: Option<String>,
}

impl<S> fmt::Debug for Orchestrator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("registry", &self.registry)
            .field("refresh_interval", &self.refresh_interval)
            .field("working_tree_dir", &self.working_tree_dir)
            .finish_non_exhaustive()
    }
}

impl<S: KvStore> Orchestrator<S> {
    pub fn new(store: S, config: &Config, registry: SourceRegistry, github_token: Option<String>) -> Result<Self> {
        let fetcher = Fetcher::new(&config.user_agent, config.retry_policy())?;
        let cache = BadgeCache::new(store.clone(), CacheKeys::new(&config.cache_version), config.cache_ttl(), registry.clone());
        let lock = DistributedLock::new(store.clone(), config.git_lock_ttl());

        Ok(Self {
            registry,
            store,
            cache,
            lock,
            fetcher,
            refresh_interval: config.refresh_interval(),
            store_timeout: config.redis_timeout(),
            working_tree_dir: config.working_tree_dir.clone().into_std_path_buf(),
            github_token: github_token.filter(|t| !t.is_empty()),
        })
    }

    #[must_use]
    pub const fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// A read handle sharing this orchestrator's cache and metrics.
    #[must_use]
    pub fn query(&self) -> QueryService<S> {
        QueryService::new(self.cache.clone(), self.registry.clone())
    }

    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.cache.metrics()
    }

    pub fn reset_metrics(&self) {
        self.cache.reset_metrics();
    }

    /// Verifies the store answers within the configured timeout.
    ///
    /// This is the only failure that should stop the process.
    pub async fn initialize(&self) -> Result<()> {
        log::info!(target: LOG_TARGET, "Testing store connection");
        match tokio::time::timeout(self.store_timeout, self.store.ping()).await {
            Ok(Ok(())) => {
                log::info!(target: LOG_TARGET, "Store connection established");
                Ok(())
            }
            Ok(Err(e)) => Err(e.enrich_with(|| "store is unreachable".to_string())),
            Err(_) => {
                bail!("store connection timeout after {}ms", self.store_timeout.as_millis());
            }
        }
    }

    /// The startup cycle: either refresh everything, or behave like a timer tick.
    pub async fn warm_up(&self, preload: bool) -> Option<RefreshReport> {
        if preload {
            log::info!(target: LOG_TARGET, "Preloading all sources");
            Some(self.refresh_all().await)
        } else {
            self.run_cycle().await
        }
    }

    /// One timer tick: refresh every source if any is missing or stale.
    pub async fn run_cycle(&self) -> Option<RefreshReport> {
        if self.needs_refresh().await {
            Some(self.refresh_all().await)
        } else {
            None
        }
    }

    /// Whether any cached source is missing, stale, or lacks its working tree.
    ///
    /// Store failures count as stale.
    pub async fn needs_refresh(&self) -> bool {
        let now = Utc::now();
        for descriptor in self.registry.cached() {
            let id = descriptor.id;
            match self.cache.freshness(id, now, self.refresh_interval).await {
                Ok(Freshness::Fresh) => {}
                Ok(freshness) => {
                    log::info!(target: LOG_TARGET, "Cache {freshness} for source {id}, refresh needed");
                    return true;
                }
                Err(e) => {
                    log::warn!(target: LOG_TARGET, "Could not check cache for source {id}, forcing refresh: {e:#}");
                    return true;
                }
            }

            if descriptor.kind.is_git_tree() && !git::has_working_tree(&self.working_tree(id)) {
                log::info!(target: LOG_TARGET, "Working tree for source {id} is missing, refresh needed");
                return true;
            }
        }

        log::debug!(target: LOG_TARGET, "All source caches are valid");
        false
    }

    /// Refreshes every cached source concurrently.
    pub async fn refresh_all(&self) -> RefreshReport {
        let cycle_started = Utc::now();
        log::info!(target: LOG_TARGET, "Refreshing all sources");

        let descriptors: Vec<&SourceDescriptor> = self.registry.cached().collect();
        let outcomes = join_all(descriptors.iter().map(|d| self.refresh_source(d, cycle_started))).await;

        let report = RefreshReport {
            outcomes: descriptors.iter().map(|d| d.id).zip(outcomes).collect(),
        };

        log::info!(
            target: LOG_TARGET,
            "Refreshed {} sources in {}ms ({} failed)",
            report.len(),
            (Utc::now() - cycle_started).num_milliseconds(),
            report.failures()
        );
        report
    }

    /// Refreshes one named source, or every cached source one after another.
    ///
    /// Naming an unknown source is an error.
    pub async fn force_refresh(&self, source: Option<&str>) -> Result<RefreshReport> {
        let descriptors: Vec<&SourceDescriptor> = match source {
            Some(name) => vec![self.registry.find(name)?],
            None => self.registry.cached().collect(),
        };

        let mut report = RefreshReport::default();
        for descriptor in descriptors {
            let outcome = self.refresh_source(descriptor, Utc::now()).await;
            report.outcomes.push((descriptor.id, outcome));
        }

        Ok(report)
    }

    /// Removes cached data for one named source, or for every cached source.
    ///
    /// Returns the number of keys addressed.
    pub async fn clear(&self, source: Option<&str>) -> Result<usize> {
        let ids: Vec<SourceId> = match source {
            Some(name) => {
                let descriptor = self.registry.find(name)?;
                if !descriptor.kind.is_cached() {
                    bail!("source '{}' is served live and has no cached data", descriptor.id);
                }
                vec![descriptor.id]
            }
            None => self.registry.cached().map(|d| d.id).collect(),
        };

        let mut cleared = 0;
        for id in ids {
            cleared += self.cache.clear(id).await?;
        }

        log::info!(target: LOG_TARGET, "Cleared {cleared} cache keys");
        Ok(cleared)
    }

    async fn refresh_source(&self, descriptor: &SourceDescriptor, cycle_started: DateTime<Utc>) -> RefreshOutcome {
        let id = descriptor.id;

        let raw = match &descriptor.kind {
            SourceKind::External => return RefreshOutcome::Skipped(SkipReason::NotCached),
            SourceKind::HttpJson { url, .. } => self.fetch_required(url).await.map(|value| Some(RawPayload::Json(value))),
            SourceKind::HttpJsonWithManifest {
                url,
                manifest_url,
                contributor,
            } => {
                let (badges, manifest) = tokio::join!(self.fetch_optional(id, url), self.fetch_optional(id, manifest_url));
                match (badges, manifest) {
                    (Ok(None), Ok(None)) => Ok(None),
                    (Ok(badges), Ok(manifest)) => Ok(Some(RawPayload::JsonWithManifest {
                        badges,
                        manifest,
                        contributor: contributor.clone(),
                    })),
                    (Err(e), _) | (_, Err(e)) => Err(e),
                }
            }
            SourceKind::GitTree { remote, layout, .. } => match self.lock.try_acquire(id).await {
                Ok(true) => {
                    let result = self.load_tree(id, remote, layout).await;
                    self.lock.release(id).await;
                    result.map(|tree| Some(RawPayload::Tree(tree)))
                }
                Ok(false) => {
                    log::warn!(target: LOG_TARGET, "Sync of source {id} already in progress elsewhere, skipping");
                    return RefreshOutcome::Skipped(SkipReason::LockHeld);
                }
                Err(e) => Err(e.enrich_with(|| format!("acquiring sync lock for source {id}"))),
            },
        };

        let raw = match raw {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                log::warn!(target: LOG_TARGET, "No data available for source {id}, keeping previous cache");
                return RefreshOutcome::Skipped(SkipReason::NoData);
            }
            Err(e) => {
                log::error!(target: LOG_TARGET, "Could not refresh source {id}: {e:#}");
                return RefreshOutcome::Failed(e);
            }
        };

        let badges = descriptor.normalize(&raw);
        match self.cache.write(id, &badges, cycle_started).await {
            Ok(()) => {
                log::debug!(target: LOG_TARGET, "Stored {} users for source {id}", badges.user_count());
                RefreshOutcome::Updated {
                    users: badges.user_count(),
                }
            }
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Could not store source {id}, will retry next cycle: {e:#}");
                RefreshOutcome::Failed(e)
            }
        }
    }

    async fn fetch_required(&self, url: &Url) -> Result<Value> {
        self.fetcher.fetch_json(url).await.map_err(|e| app_err!("{e}"))
    }

    /// A refused request yields `None`. Other failures are errors.
    async fn fetch_optional(&self, id: SourceId, url: &Url) -> Result<Option<Value>> {
        match self.fetcher.fetch_json(url).await {
            Ok(value) => Ok(Some(value)),
            Err(FetchError::Terminal { status, .. }) => {
                log::warn!(target: LOG_TARGET, "'{url}' refused with {status}, continuing source {id} without it");
                Ok(None)
            }
            Err(e) => Err(app_err!("{e}")),
        }
    }

    /// Syncs the working tree, falling back to the existing tree if the sync fails.
    async fn load_tree(&self, id: SourceId, remote: &Url, layout: &TreeLayout) -> Result<TreeSnapshot> {
        let path = self.working_tree(id);

        if let Err(e) = git::sync_repo(&path, remote, self.github_token.as_deref()).await {
            if !git::has_working_tree(&path) {
                return Err(e.enrich_with(|| format!("syncing repository for source {id}")));
            }
            log::warn!(target: LOG_TARGET, "Could not sync source {id}, using existing working tree: {e:#}");
        }

        file_tree::read_tree(path, layout.clone()).await
    }

    fn working_tree(&self, id: SourceId) -> PathBuf {
        self.working_tree_dir.join(id.as_str())
    }
}

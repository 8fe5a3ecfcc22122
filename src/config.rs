//! Runtime configuration.
//!
//! Loaded from `badges.toml`, `badges.yml`, `badges.yaml`, or `badges.json` in the working
//! directory, or from an explicit path. Every field has a default, so an empty file (or no file)
//! is a valid configuration.

use crate::Result;
use crate::refresh::RetryPolicy;
use crate::sources::{SourceId, SourceOverride};
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;

const CONFIG_FILE_STEM: &str = "badges";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Period between refresh checks, in milliseconds.
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,

    /// Expiry of cached entries in seconds. Derived from the refresh interval when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl_secs: Option<u64>,

    /// Multiple of the refresh interval used as expiry when `cache_ttl_secs` is absent.
    #[serde(default = "default_cache_ttl_multiplier")]
    pub cache_ttl_multiplier: u32,

    /// Limit on a single upstream request, in milliseconds.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,

    /// Retries after the first failed upstream request.
    #[serde(default = "default_http_max_retries")]
    pub http_max_retries: u32,

    /// Delay before the first retry, in milliseconds. Doubles with every retry.
    #[serde(default = "default_http_retry_base_delay_ms")]
    pub http_retry_base_delay_ms: u64,

    /// Version segment of the cache keys.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Refresh every source at startup instead of only the stale ones.
    #[serde(default = "default_preload_on_startup")]
    pub preload_on_startup: bool,

    /// Limit on reaching the store at startup, in milliseconds.
    #[serde(default = "default_redis_timeout_ms")]
    pub redis_timeout_ms: u64,

    /// Expiry of the lock held while syncing a git-backed source, in seconds.
    #[serde(default = "default_git_lock_ttl_secs")]
    pub git_lock_ttl_secs: u64,

    /// Directory holding one working tree per git-backed source.
    #[serde(default = "default_working_tree_dir")]
    pub working_tree_dir: Utf8PathBuf,

    /// `User-Agent` sent to upstream sources.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Endpoint overrides, keyed by source name.
    #[serde(default)]
    pub sources: BTreeMap<SourceId, SourceOverride>,
}

const fn default_refresh_interval_ms() -> u64 {
    60 * 60 * 1000
}

const fn default_cache_ttl_multiplier() -> u32 {
    2
}

const fn default_http_timeout_ms() -> u64 {
    10_000
}

const fn default_http_max_retries() -> u32 {
    3
}

const fn default_http_retry_base_delay_ms() -> u64 {
    1000
}

fn default_cache_version() -> String {
    "v1".to_string()
}

const fn default_preload_on_startup() -> bool {
    true
}

const fn default_redis_timeout_ms() -> u64 {
    5000
}

const fn default_git_lock_ttl_secs() -> u64 {
    300
}

fn default_working_tree_dir() -> Utf8PathBuf {
    Utf8PathBuf::from("cache")
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval_ms(),
            cache_ttl_secs: None,
            cache_ttl_multiplier: default_cache_ttl_multiplier(),
            http_timeout_ms: default_http_timeout_ms(),
            http_max_retries: default_http_max_retries(),
            http_retry_base_delay_ms: default_http_retry_base_delay_ms(),
            cache_version: default_cache_version(),
            preload_on_startup: default_preload_on_startup(),
            redis_timeout_ms: default_redis_timeout_ms(),
            git_lock_ttl_secs: default_git_lock_ttl_secs(),
            working_tree_dir: default_working_tree_dir(),
            user_agent: default_user_agent(),
            sources: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, the first of `badges.{toml,yml,yaml,json}` found in `base_dir`
    /// is used.
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading configuration from {path}"))?;
            (path.clone(), text)
        } else {
            let candidates = ["toml", "yml", "yaml", "json"].map(|ext| base_dir.join(format!("{CONFIG_FILE_STEM}.{ext}")));

            let mut found = None;
            for path in &candidates {
                match fs::read_to_string(path) {
                    Ok(text) => {
                        found = Some((path.clone(), text));
                        break;
                    }
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e).into_app_err_with(|| format!("reading configuration from {path}")),
                }
            }

            let Some(result) = found else {
                return Ok(Self::default());
            };
            result
        };

        let extension = final_path.extension().unwrap_or_default();
        let config: Self = match extension {
            "toml" => toml::from_str(&text).into_app_err_with(|| format!("parsing TOML configuration from {final_path}"))?,
            "yml" | "yaml" => serde_yaml::from_str(&text).into_app_err_with(|| format!("parsing YAML configuration from {final_path}"))?,
            "json" => serde_json::from_str(&text).into_app_err_with(|| format!("parsing JSON configuration from {final_path}"))?,
            _ => return Err(app_err!("unsupported configuration file extension: {extension}")),
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file, in the format implied by its extension
    pub fn save(&self, output_path: &Utf8Path) -> Result<()> {
        let extension = output_path.extension().unwrap_or_default();
        let text = match extension {
            "toml" => toml::to_string_pretty(self)
                .into_app_err_with(|| format!("serializing configuration to TOML for saving to {output_path}"))?,
            "yml" | "yaml" => serde_yaml::to_string(self)
                .into_app_err_with(|| format!("serializing configuration to YAML for saving to {output_path}"))?,
            "json" => serde_json::to_string_pretty(self)
                .into_app_err_with(|| format!("serializing configuration to JSON for saving to {output_path}"))?,
            _ => return Err(app_err!("unsupported configuration file extension: {extension}")),
        };

        fs::write(output_path, text).into_app_err_with(|| format!("writing configuration to {output_path}"))?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.refresh_interval_ms == 0 {
            return Err(app_err!("refresh_interval_ms must be greater than zero"));
        }

        if self.cache_ttl_secs == Some(0) || (self.cache_ttl_secs.is_none() && self.cache_ttl_multiplier == 0) {
            return Err(app_err!("the cache expiry must be greater than zero"));
        }

        if self.git_lock_ttl_secs == 0 {
            return Err(app_err!("git_lock_ttl_secs must be greater than zero"));
        }

        if self.http_timeout_ms == 0 {
            return Err(app_err!("http_timeout_ms must be greater than zero"));
        }

        if self.cache_version.is_empty() || self.cache_version.contains(':') {
            return Err(app_err!("cache_version must be non-empty and must not contain ':', got '{}'", self.cache_version));
        }

        Ok(())
    }

    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    /// Expiry applied to cached entries.
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl_secs
            .map_or_else(|| self.refresh_interval().saturating_mul(self.cache_ttl_multiplier), Duration::from_secs)
    }

    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_millis(self.http_timeout_ms),
            max_retries: self.http_max_retries,
            base_delay: Duration::from_millis(self.http_retry_base_delay_ms),
        }
    }

    #[must_use]
    pub const fn redis_timeout(&self) -> Duration {
        Duration::from_millis(self.redis_timeout_ms)
    }

    #[must_use]
    pub const fn git_lock_ttl(&self) -> Duration {
        Duration::from_secs(self.git_lock_ttl_secs)
    }
}

use crate::sources::SourceId;

/// Names the cache entries of each source.
///
/// Data and timestamp keys carry a version segment. Entries written under another version are
/// never read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    version: String,
}

impl CacheKeys {
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self { version: version.into() }
    }

    #[must_use]
    pub fn data(&self, source: SourceId) -> String {
        format!("badge_service_data:{}:{source}", self.version)
    }

    #[must_use]
    pub fn timestamp(&self, source: SourceId) -> String {
        format!("badge_cache_timestamp:{}:{source}", self.version)
    }

    /// Lock keys are not versioned.
    #[must_use]
    pub fn lock(source: SourceId) -> String {
        format!("git_lock:{source}")
    }
}

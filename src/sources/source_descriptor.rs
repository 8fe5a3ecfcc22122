use super::{Format, RawPayload, SourceId};
use crate::badge::{Badge, BadgeMap};
use serde_json::Value;
use url::Url;

/// Where a git-backed source keeps its files, relative to the working tree root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeLayout {
    /// Directory holding one `<user id>.json` file per user. Empty means the tree root.
    pub users_dir: String,

    /// Directory holding badge definition files, for sources whose user files only carry ids.
    pub definitions_dir: Option<String>,
}

/// How a source is retrieved.
#[derive(Debug, Clone)]
pub enum SourceKind {
    /// A single JSON document.
    HttpJson { url: Url, format: Format },

    /// A direct-format JSON document plus a plugin manifest whose authors earn `contributor`.
    HttpJsonWithManifest {
        url: Url,
        manifest_url: Url,
        contributor: Badge,
    },

    /// A git repository synced into a local working tree.
    GitTree { remote: Url, layout: TreeLayout, format: Format },

    /// Looked up live per user by the serving layer. Never cached here.
    External,
}

impl SourceKind {
    /// The normalizer for this kind, or `None` for external sources.
    #[must_use]
    pub const fn format(&self) -> Option<Format> {
        match self {
            Self::HttpJson { format, .. } | Self::GitTree { format, .. } => Some(*format),
            Self::HttpJsonWithManifest { .. } => Some(Format::Direct),
            Self::External => None,
        }
    }

    #[must_use]
    pub const fn is_cached(&self) -> bool {
        !matches!(self, Self::External)
    }

    #[must_use]
    pub const fn is_git_tree(&self) -> bool {
        matches!(self, Self::GitTree { .. })
    }
}

/// Static description of one source.
#[derive(Debug, Clone)]
pub struct SourceDescriptor {
    pub id: SourceId,
    pub kind: SourceKind,
}

impl SourceDescriptor {
    #[must_use]
    pub const fn new(id: SourceId, kind: SourceKind) -> Self {
        Self { id, kind }
    }

    /// Converts a raw payload into the common badge shape.
    ///
    /// External sources have nothing to normalize and produce an empty map.
    #[must_use]
    pub fn normalize(&self, raw: &RawPayload) -> BadgeMap {
        self.kind.format().map_or_else(BadgeMap::new, |format| format.normalize(raw))
    }

    /// Normalizes an upstream document that was stored as fetched.
    ///
    /// Only document-based sources can have been stored that way. Other kinds yield `None`.
    #[must_use]
    pub fn normalize_document(&self, document: Value) -> Option<BadgeMap> {
        let raw = match &self.kind {
            SourceKind::HttpJson { .. } => RawPayload::Json(document),
            SourceKind::HttpJsonWithManifest { contributor, .. } => RawPayload::JsonWithManifest {
                badges: Some(document),
                manifest: None,
                contributor: contributor.clone(),
            },
            SourceKind::GitTree { .. } | SourceKind::External => return None,
        };
        Some(self.normalize(&raw))
    }
}

use super::{Format, SourceDescriptor, SourceId, SourceKind, TreeLayout};
use crate::Result;
use crate::badge::Badge;
use core::str::FromStr;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use url::Url;

const VENCORD_BADGES: &str = "https://badges.vencord.dev/badges.json";
const VENCORD_PLUGINS: &str = "https://raw.githubusercontent.com/Vencord/builds/main/plugins.json";
const EQUICORD_BADGES: &str = "https://raw.githubusercontent.com/Equicord/Equibored/refs/heads/main/badges.json";
const EQUICORD_PLUGINS: &str = "https://raw.githubusercontent.com/Equicord/Equibored/refs/heads/main/plugins.json";
const NEKOCORD_BADGES: &str = "https://nekocord.dev/assets/badges.json";
const REVIEWDB_BADGES: &str = "https://manti.vendicated.dev/api/reviewdb/badges";
const AERO_BADGES: &str = "https://gist.githubusercontent.com/TheCommieAxolotl/58c22cb5e91c71ce85818395dbe80c24/raw/badges.json";
const ALIUCORD_BADGES: &str = "https://aliucord.com/files/badges/data.json";
const RA1NCORD_BADGES: &str = "https://raw.githubusercontent.com/ra1ncord/badges/main/badges.json";
const BADGEVAULT_REPO: &str = "https://github.com/WolfPlugs/BadgeVault.git";
const ENMITY_REPO: &str = "https://github.com/enmity-mod/badges.git";

/// Per-source endpoint overrides, usually from the configuration file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SourceOverride {
    /// Replaces the badge document URL of an HTTP source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Replaces the plugin manifest URL of a source with contributor badges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_url: Option<String>,

    /// Replaces the remote of a git-backed source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
}

/// The closed table of known sources, built once at startup.
///
/// Cheap to clone. Iteration order is stable.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: Arc<BTreeMap<SourceId, SourceDescriptor>>,
}

impl SourceRegistry {
    /// The built-in source table.
    pub fn builtin() -> Result<Self> {
        Ok(Self::from_descriptors([
            SourceDescriptor::new(
                SourceId::Vencord,
                SourceKind::HttpJsonWithManifest {
                    url: parse_url(VENCORD_BADGES)?,
                    manifest_url: parse_url(VENCORD_PLUGINS)?,
                    contributor: Badge::new("Vencord Contributor", "/public/badges/vencord.png"),
                },
            ),
            SourceDescriptor::new(
                SourceId::Equicord,
                SourceKind::HttpJsonWithManifest {
                    url: parse_url(EQUICORD_BADGES)?,
                    manifest_url: parse_url(EQUICORD_PLUGINS)?,
                    contributor: Badge::new("Equicord Contributor", "/public/badges/equicord.svg"),
                },
            ),
            http(SourceId::Nekocord, NEKOCORD_BADGES, Format::Nekocord)?,
            http(SourceId::ReviewDb, REVIEWDB_BADGES, Format::ReviewDb)?,
            http(SourceId::Aero, AERO_BADGES, Format::Aero)?,
            http(SourceId::Aliucord, ALIUCORD_BADGES, Format::Aliucord)?,
            http(SourceId::Ra1ncord, RA1NCORD_BADGES, Format::Ra1ncord)?,
            SourceDescriptor::new(
                SourceId::BadgeVault,
                SourceKind::GitTree {
                    remote: parse_url(BADGEVAULT_REPO)?,
                    layout: TreeLayout {
                        users_dir: "User".to_string(),
                        definitions_dir: None,
                    },
                    format: Format::BadgeVault,
                },
            ),
            SourceDescriptor::new(
                SourceId::Enmity,
                SourceKind::GitTree {
                    remote: parse_url(ENMITY_REPO)?,
                    layout: TreeLayout {
                        users_dir: String::new(),
                        definitions_dir: Some("data".to_string()),
                    },
                    format: Format::Enmity,
                },
            ),
            SourceDescriptor::new(SourceId::Discord, SourceKind::External),
            SourceDescriptor::new(SourceId::Replugged, SourceKind::External),
        ]))
    }

    /// Builds a registry from explicit descriptors. A later descriptor for the same id replaces an earlier one.
    #[must_use]
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = SourceDescriptor>) -> Self {
        Self {
            sources: Arc::new(descriptors.into_iter().map(|d| (d.id, d)).collect()),
        }
    }

    /// Returns a registry with endpoints replaced per `overrides`.
    ///
    /// An override naming an endpoint the source does not have is an error, as is an external source.
    pub fn with_overrides(&self, overrides: &BTreeMap<SourceId, SourceOverride>) -> Result<Self> {
        let mut sources = (*self.sources).clone();

        for (id, source_override) in overrides {
            let descriptor = sources.get_mut(id).into_app_err_with(|| format!("unknown source '{id}' in overrides"))?;
            apply_override(descriptor, source_override)?;
        }

        Ok(Self {
            sources: Arc::new(sources),
        })
    }

    #[must_use]
    pub fn get(&self, id: SourceId) -> Option<&SourceDescriptor> {
        self.sources.get(&id)
    }

    /// Looks a source up by its case-insensitive name.
    pub fn find(&self, name: &str) -> Result<&SourceDescriptor> {
        SourceId::from_str(name)
            .ok()
            .and_then(|id| self.get(id))
            .ok_or_else(|| app_err!("source not found: {name}"))
    }

    /// All sources, external ones included.
    pub fn iter(&self) -> impl Iterator<Item = &SourceDescriptor> {
        self.sources.values()
    }

    /// Sources whose data lives in the cache.
    pub fn cached(&self) -> impl Iterator<Item = &SourceDescriptor> {
        self.iter().filter(|d| d.kind.is_cached())
    }
}

fn http(id: SourceId, url: &str, format: Format) -> Result<SourceDescriptor> {
    Ok(SourceDescriptor::new(
        id,
        SourceKind::HttpJson {
            url: parse_url(url)?,
            format,
        },
    ))
}

fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).into_app_err_with(|| format!("invalid source URL '{url}'"))
}

fn apply_override(descriptor: &mut SourceDescriptor, source_override: &SourceOverride) -> Result<()> {
    let id = descriptor.id;
    let not_applicable = |field: &str| app_err!("source '{id}' has no '{field}' to override");

    match &mut descriptor.kind {
        SourceKind::HttpJson { url, .. } => {
            if source_override.manifest_url.is_some() {
                return Err(not_applicable("manifest_url"));
            }
            if source_override.remote.is_some() {
                return Err(not_applicable("remote"));
            }
            if let Some(new_url) = &source_override.url {
                *url = parse_url(new_url)?;
            }
        }
        SourceKind::HttpJsonWithManifest { url, manifest_url, .. } => {
            if source_override.remote.is_some() {
                return Err(not_applicable("remote"));
            }
            if let Some(new_url) = &source_override.url {
                *url = parse_url(new_url)?;
            }
            if let Some(new_url) = &source_override.manifest_url {
                *manifest_url = parse_url(new_url)?;
            }
        }
        SourceKind::GitTree { remote, .. } => {
            if source_override.url.is_some() {
                return Err(not_applicable("url"));
            }
            if source_override.manifest_url.is_some() {
                return Err(not_applicable("manifest_url"));
            }
            if let Some(new_remote) = &source_override.remote {
                *remote = parse_url(new_remote)?;
            }
        }
        SourceKind::External => return Err(app_err!("source '{id}' is served live and cannot be overridden")),
    }

    Ok(())
}

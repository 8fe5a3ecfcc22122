use super::RawPayload;
use super::normalizers::{aero, aliucord, badgevault, contributors, direct, enmity, nekocord, ra1ncord, reviewdb};
use crate::badge::BadgeMap;

const LOG_TARGET: &str = " normalize";

/// The upstream data shape a source publishes, which selects its normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `{ user: [{ tooltip, badge }] }`, already in the common shape.
    Direct,

    /// `{ users: { user: { badges: [id] } }, badges: { id: { name, image } } }`
    Nekocord,

    /// `[{ discordID, name, icon }]`
    ReviewDb,

    /// `{ user: [{ text, image, color }] }`, icons chosen by keyword.
    Aero,

    /// `{ users: { user: { roles, custom: [{ url, text }] } } }`
    Aliucord,

    /// `{ user: [{ label, url }] }`
    Ra1ncord,

    /// One file per user: `{ blocked, badges: [{ name, badge, pending }] }`
    BadgeVault,

    /// One id list per user plus `{ id, name, url: { dark } }` definitions.
    Enmity,
}

impl Format {
    /// Converts a raw payload into the common badge shape.
    ///
    /// Individual records that do not match the expected shape are skipped. A payload of the wrong
    /// kind for this format produces an empty map.
    #[must_use]
    pub fn normalize(self, raw: &RawPayload) -> BadgeMap {
        match (self, raw) {
            (Self::Direct, RawPayload::Json(value)) => direct::normalize(value),
            (
                Self::Direct,
                RawPayload::JsonWithManifest {
                    badges,
                    manifest,
                    contributor,
                },
            ) => {
                let mut map = badges.as_ref().map_or_else(BadgeMap::new, direct::normalize);
                if let Some(manifest) = manifest {
                    contributors::append(&mut map, manifest, contributor);
                }
                map
            }
            (Self::Nekocord, RawPayload::Json(value)) => nekocord::normalize(value),
            (Self::ReviewDb, RawPayload::Json(value)) => reviewdb::normalize(value),
            (Self::Aero, RawPayload::Json(value)) => aero::normalize(value),
            (Self::Aliucord, RawPayload::Json(value)) => aliucord::normalize(value),
            (Self::Ra1ncord, RawPayload::Json(value)) => ra1ncord::normalize(value),
            (Self::BadgeVault, RawPayload::Tree(tree)) => badgevault::normalize(tree),
            (Self::Enmity, RawPayload::Tree(tree)) => enmity::normalize(tree),
            (format, _) => {
                log::warn!(target: LOG_TARGET, "Payload kind does not match the {format:?} format, ignoring it");
                BadgeMap::new()
            }
        }
    }
}

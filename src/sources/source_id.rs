use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Identifies one upstream badge source.
///
/// The lowercase name is used in cache keys, working tree directories, and on the command line.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter, IntoStaticStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    Vencord,
    Equicord,
    Nekocord,
    ReviewDb,
    Aero,
    Aliucord,
    Ra1ncord,
    BadgeVault,
    Enmity,
    Discord,
    Replugged,
}

impl SourceId {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

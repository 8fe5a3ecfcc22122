//! Keyword tables that map free-form badge text to an icon type.
//!
//! Tables are ordered: the first type with any keyword contained in the lowercased text wins.

/// `(type, keywords)` pairs, checked in order.
pub type KeywordTable = &'static [(&'static str, &'static [&'static str])];

pub const AERO: KeywordTable = &[
    ("contributor", &["contributor"]),
    ("tester", &["tester"]),
    ("developer", &["developer"]),
];

pub const AERO_DEFAULT: &str = "developer";

pub const ENMITY: KeywordTable = &[
    ("dev", &["dev"]),
    ("staff", &["staff"]),
    ("supporter", &["support"]),
    ("contributor", &["contributor"]),
];

/// Enmity badges matching no keyword keep their own icon.
pub const ENMITY_DEFAULT: &str = "";

/// Returns the first type whose keywords appear in `text`, or `default`.
#[must_use]
pub fn classify(text: &str, table: KeywordTable, default: &'static str) -> &'static str {
    let text = text.to_lowercase();
    table
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| text.contains(keyword)))
        .map_or(default, |&(kind, _)| kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_wins() {
        // "dev" is checked before "contributor"
        assert_eq!(classify("Developer & Contributor", ENMITY, ENMITY_DEFAULT), "dev");
        assert_eq!(classify("Enmity Supporter", ENMITY, ENMITY_DEFAULT), "supporter");
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classify("BETA TESTER", AERO, AERO_DEFAULT), "tester");
    }

    #[test]
    fn test_falls_back_to_default() {
        assert_eq!(classify("Cool Person", AERO, AERO_DEFAULT), "developer");
        assert_eq!(classify("Cool Person", ENMITY, ENMITY_DEFAULT), "");
    }
}

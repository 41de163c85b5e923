//! Bidirectional mapping between language display names and short codes.
//!
//! The table is a compile-time constant: language lists are data, not
//! design, so the table only needs to be kept alphabetically tidy and free
//! of duplicate keys (the source table this is modeled on carried one
//! duplicate "Macedonian" entry; this table does not reproduce it).

/// One (short code, canonical display name) pair.
pub type LanguageEntry = (&'static str, &'static str);

/// Compile-time table of known languages, seeded from Project Gutenberg's
/// observed language tags. Codes are lowercase, 2-3 letters.
pub const LANGUAGE_TABLE: &[LanguageEntry] = &[
    ("af", "Afrikaans"),
    ("sq", "Albanian"),
    ("arp", "Arapaho"),
    ("ar", "Arabic"),
    ("hy", "Armenian"),
    ("br", "Breton"),
    ("bg", "Bulgarian"),
    ("ca", "Catalan"),
    ("ceb", "Cebuano"),
    ("zh", "Chinese"),
    ("cs", "Czech"),
    ("da", "Danish"),
    ("nl", "Dutch"),
    ("en", "English"),
    ("eo", "Esperanto"),
    ("et", "Estonian"),
    ("fi", "Finnish"),
    ("fr", "French"),
    ("fy", "Frisian"),
    ("gl", "Galician"),
    ("ka", "Georgian"),
    ("de", "German"),
    ("el", "Greek"),
    ("grc", "Ancient Greek"),
    ("he", "Hebrew"),
    ("hu", "Hungarian"),
    ("is", "Icelandic"),
    ("ilo", "Iloko"),
    ("ia", "Interlingua"),
    ("ga", "Irish"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("kha", "Khasi"),
    ("ko", "Korean"),
    ("la", "Latin"),
    ("lv", "Latvian"),
    ("lt", "Lithuanian"),
    ("mk", "Macedonian"),
    ("myn", "Mayan Languages"),
    ("nah", "Nahuatl"),
    ("nap", "Neapolitan"),
    ("no", "Norwegian"),
    ("oc", "Occitan"),
    ("oji", "Ojibwa"),
    ("fa", "Persian"),
    ("pl", "Polish"),
    ("pt", "Portuguese"),
    ("ro", "Romanian"),
    ("ru", "Russian"),
    ("sa", "Sanskrit"),
    ("gd", "Scottish Gaelic"),
    ("sr", "Serbian"),
    ("sk", "Slovak"),
    ("sl", "Slovenian"),
    ("es", "Spanish"),
    ("sw", "Swahili"),
    ("sv", "Swedish"),
    ("tl", "Tagalog"),
    ("te", "Telugu"),
    ("th", "Thai"),
    ("tr", "Turkish"),
    ("uk", "Ukrainian"),
    ("vi", "Vietnamese"),
    ("cy", "Welsh"),
    ("yi", "Yiddish"),
];

/// Bidirectional lookup over [`LANGUAGE_TABLE`].
///
/// All lookups are case-insensitive in both directions.
pub struct LanguageMapper;

impl LanguageMapper {
    /// Try to resolve `input` to a `(code, name)` pair.
    ///
    /// - If `input` is 2-3 characters and matches a known code, returns
    ///   `(code.to_lowercase(), canonical_name)`.
    /// - Else if `input` matches a known display name, returns
    ///   `(code, canonical_name)` using the table's spelling.
    /// - Else returns `None` (a miss).
    #[must_use]
    pub fn try_map(input: &str) -> Option<(&'static str, &'static str)> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }

        if (2..=3).contains(&trimmed.len()) {
            if let Some(&(code, name)) = LANGUAGE_TABLE
                .iter()
                .find(|(code, _)| code.eq_ignore_ascii_case(trimmed))
            {
                return Some((code, name));
            }
        }

        LANGUAGE_TABLE
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(trimmed))
            .map(|&(code, name)| (code, name))
    }

    /// Number of languages in the table.
    #[must_use]
    pub const fn len() -> usize {
        LANGUAGE_TABLE.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn table_has_at_least_sixty_entries() {
        assert!(LanguageMapper::len() >= 60, "table has {} entries", LanguageMapper::len());
    }

    #[test]
    fn table_has_unique_codes() {
        let mut seen = HashSet::new();
        for (code, _) in LANGUAGE_TABLE {
            assert!(seen.insert(code.to_ascii_lowercase()), "duplicate code: {code}");
        }
    }

    #[test]
    fn every_entry_round_trips_by_code_and_name() {
        for &(code, name) in LANGUAGE_TABLE {
            let by_code = LanguageMapper::try_map(code);
            assert_eq!(by_code, Some((code, name)), "code lookup failed for {code}");

            let by_name = LanguageMapper::try_map(name);
            assert_eq!(by_name, Some((code, name)), "name lookup failed for {name}");
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(LanguageMapper::try_map("EN"), Some(("en", "English")));
        assert_eq!(LanguageMapper::try_map("english"), Some(("en", "English")));
        assert_eq!(LanguageMapper::try_map("FRENCH"), Some(("fr", "French")));
    }

    #[test]
    fn unknown_input_misses() {
        assert_eq!(LanguageMapper::try_map("klingon"), None);
        assert_eq!(LanguageMapper::try_map("xyz"), None);
    }

    #[test]
    fn whitespace_and_empty_input_miss_cleanly() {
        assert_eq!(LanguageMapper::try_map("   "), None);
        assert_eq!(LanguageMapper::try_map(""), None);
    }
}

//! Free-text search needle.

/// Case-insensitive substring needle typed into a listing's search box.
///
/// Leading and trailing whitespace is ignored. Empty or whitespace-only text
/// is inactive: it matches everything instead of nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchText {
    raw: String,
    needle: String,
}

impl SearchText {
    #[must_use]
    pub fn new(text: &str) -> Self {
        let raw = text.trim().to_owned();
        let needle = raw.to_lowercase();
        Self { raw, needle }
    }

    /// Whether the predicate participates in filtering.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.needle.is_empty()
    }

    /// The trimmed text as typed (original case).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether `haystack` contains the needle, ignoring case.
    #[must_use]
    pub fn matches(&self, haystack: &str) -> bool {
        !self.is_active() || haystack.to_lowercase().contains(&self.needle)
    }

    /// Whether any of `fields` matches. Absent fields never match.
    #[must_use]
    pub fn matches_any<'a, I>(&self, fields: I) -> bool
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        !self.is_active() || fields.into_iter().flatten().any(|field| self.matches(field))
    }
}

impl From<&str> for SearchText {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_is_inactive() {
        let search = SearchText::new("   \t");
        assert!(!search.is_active());
        assert!(search.matches("anything"));
        assert!(search.matches_any([None]));
    }

    #[test]
    fn test_match_ignores_case_and_padding() {
        let search = SearchText::new("  wIdGeT ");
        assert_eq!(search.as_str(), "wIdGeT");
        assert!(search.matches("AlphaWidget"));
        assert!(!search.matches("BetaTool"));
    }

    #[test]
    fn test_matches_any_skips_missing_fields() {
        let search = SearchText::new("cluj");
        assert!(search.matches_any([Some("artisan44"), None, Some("Str. Cluj-Napoca 4")]));
        assert!(!search.matches_any([Some("artisan44"), None]));
    }
}

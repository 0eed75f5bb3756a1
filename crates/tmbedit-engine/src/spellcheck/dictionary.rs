use indexmap::IndexSet;

/// Typographic apostrophe, treated as equivalent to `'`.
pub const RIGHT_SINGLE_QUOTE: char = '\u{2019}';

/// Replace typographic apostrophes with ASCII ones.
pub fn normalize_quotes(word: &str) -> std::borrow::Cow<'_, str> {
    if word.contains(RIGHT_SINGLE_QUOTE) {
        std::borrow::Cow::Owned(word.replace(RIGHT_SINGLE_QUOTE, "'"))
    } else {
        std::borrow::Cow::Borrowed(word)
    }
}

/// Words the user accepted, in the order they were added.
///
/// Matching is case-sensitive: accepting `Kevin` does not accept `kevin`.
/// Loading and saving the set is left to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomWords {
    words: IndexSet<String>,
}

impl CustomWords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a word; returns false if it was already present.
    pub fn add(&mut self, word: &str) -> bool {
        if self.words.contains(word) {
            return false;
        }
        self.words.insert(word.to_string())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    /// Whether `word` must not be reported, either literally or with its
    /// apostrophes normalized.
    pub fn is_excluded(&self, word: &str) -> bool {
        self.words.contains(word) || self.words.contains(normalize_quotes(word).as_ref())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for CustomWords {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut words = CustomWords::new();
        for word in iter {
            words.add(word.as_ref());
        }
        words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent_and_ordered() {
        let mut words = CustomWords::new();
        assert!(words.add("tmbedit"));
        assert!(words.add("Kevin"));
        assert!(!words.add("tmbedit"));

        assert_eq!(words.len(), 2);
        assert_eq!(words.iter().collect::<Vec<_>>(), vec!["tmbedit", "Kevin"]);
    }

    #[test]
    fn test_exclusion_is_case_sensitive() {
        let words: CustomWords = ["Kevin"].into_iter().collect();

        assert!(words.is_excluded("Kevin"));
        assert!(!words.is_excluded("kevin"));
        assert!(!words.is_excluded("KEVIN"));
    }

    #[test]
    fn test_typographic_apostrophe_matches_ascii_entry() {
        let words: CustomWords = ["Kevin's"].into_iter().collect();

        assert!(words.is_excluded("Kevin\u{2019}s"));
        assert!(words.is_excluded("Kevin's"));
    }

    #[test]
    fn test_ascii_apostrophe_does_not_match_typographic_entry() {
        let words: CustomWords = ["Kevin\u{2019}s"].into_iter().collect();

        assert!(words.is_excluded("Kevin\u{2019}s"));
        assert!(!words.is_excluded("Kevin's"));
    }

    #[test]
    fn test_normalize_quotes_borrows_when_unchanged() {
        assert!(matches!(normalize_quotes("plain"), std::borrow::Cow::Borrowed(_)));
        assert_eq!(normalize_quotes("it\u{2019}s"), "it's");
    }
}

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use parking_lot::RwLock;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::spellcheck::dictionary::{CustomWords, normalize_quotes};

/// Words are runs of word characters, optionally joined by one apostrophe.
static WORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\w+(?:['’]\w+)?\b").expect("word pattern is a valid regex")
});

const MAX_SUGGESTIONS: usize = 8;
const MAX_SUGGESTION_DISTANCE: usize = 2;

/// A misspelled word as reported by a checker.
///
/// `index` and `length` are counted in `char`s of the checked text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSpan {
    pub word: String,
    pub index: usize,
    pub length: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum CheckerError {
    #[error("Spell checker is not initialized")]
    NotInitialized,
    #[error("Dictionary file not found: {0}")]
    DictionaryNotFound(PathBuf),
    #[error("Failed to read dictionary file at {path}: {source}")]
    DictionaryRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Spell checker failed: {0}")]
    Backend(String),
}

/// The black-box spell checker.
///
/// Calls may arrive concurrently from worker threads; every call is
/// independent apart from the custom-word list the checker keeps.
pub trait Checker: Send + Sync {
    fn check(&self, text: &str) -> Result<Vec<ErrorSpan>, CheckerError>;

    fn suggest(&self, word: &str) -> Result<Vec<String>, CheckerError>;

    fn add_word(&self, word: &str);
}

/// Reference checker backed by a plain word list.
///
/// Reads the word column of a Hunspell `.dic` file and ignores affix flags,
/// so inflected forms are only accepted if they are listed.
pub struct WordListChecker {
    words: HashSet<String>,
    custom: RwLock<CustomWords>,
}

impl WordListChecker {
    pub fn from_words<I, S>(words: I, custom: CustomWords) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
            custom: RwLock::new(custom),
        }
    }

    /// Parse `.dic` content: an optional leading entry count, then one
    /// `word[/FLAGS]` per line.
    pub fn from_dic_text(dic: &str, custom: CustomWords) -> Self {
        let mut lines = dic.lines().peekable();
        if lines
            .peek()
            .is_some_and(|first| first.trim().parse::<usize>().is_ok())
        {
            lines.next();
        }

        let words = lines.filter_map(|line| {
            let entry = line.split_whitespace().next()?;
            let word = entry.split('/').next()?;
            (!word.is_empty()).then(|| word.to_string())
        });

        Self::from_words(words, custom)
    }

    /// Load a dictionary pair from disk.
    ///
    /// The affix file must exist next to the word list even though this
    /// checker does not interpret it.
    pub fn from_paths(aff_path: &Path, dic_path: &Path, custom: CustomWords) -> Result<Self, CheckerError> {
        for path in [aff_path, dic_path] {
            if !path.exists() {
                return Err(CheckerError::DictionaryNotFound(path.to_path_buf()));
            }
        }

        let dic = std::fs::read_to_string(dic_path).map_err(|source| CheckerError::DictionaryRead {
            path: dic_path.to_path_buf(),
            source,
        })?;

        let checker = Self::from_dic_text(&dic, custom);
        log::info!(
            "Loaded {} dictionary words from {} ({} custom words)",
            checker.words.len(),
            dic_path.display(),
            checker.custom.read().len()
        );
        Ok(checker)
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    fn is_known(&self, word: &str) -> bool {
        if self.words.contains(word) || self.words.contains(normalize_quotes(word).as_ref()) {
            return true;
        }
        // Sentence-initial and shouted forms of lowercase entries
        let mut chars = word.chars();
        let starts_upper = chars.next().is_some_and(char::is_uppercase);
        let rest_lower = chars.clone().all(|c| !c.is_uppercase());
        let all_upper = word.chars().all(|c| !c.is_lowercase());
        if starts_upper && (rest_lower || all_upper) {
            let lower = normalize_quotes(word).to_lowercase();
            return self.words.contains(&lower);
        }
        false
    }
}

impl Checker for WordListChecker {
    fn check(&self, text: &str) -> Result<Vec<ErrorSpan>, CheckerError> {
        let custom = self.custom.read();
        let mut errors = Vec::new();
        let mut last_byte = 0;
        let mut last_char = 0;

        for m in WORD_PATTERN.find_iter(text) {
            last_char += text[last_byte..m.start()].chars().count();
            last_byte = m.start();

            let word = m.as_str();
            // Numbers and ordinals are never looked up
            if custom.is_excluded(word) || word.chars().any(char::is_numeric) {
                continue;
            }
            if !self.is_known(word) {
                errors.push(ErrorSpan {
                    word: word.to_string(),
                    index: last_char,
                    length: word.chars().count(),
                });
            }
        }

        Ok(errors)
    }

    fn suggest(&self, word: &str) -> Result<Vec<String>, CheckerError> {
        let target = normalize_quotes(word).to_lowercase();
        let capitalize = word.chars().next().is_some_and(char::is_uppercase);

        let mut ranked: Vec<(usize, &str)> = self
            .words
            .iter()
            .filter_map(|candidate| {
                let distance = strsim::levenshtein(&target, &candidate.to_lowercase());
                (distance <= MAX_SUGGESTION_DISTANCE).then_some((distance, candidate.as_str()))
            })
            .collect();
        ranked.sort_unstable();

        let mut suggestions: Vec<String> = Vec::new();
        for (_, candidate) in ranked {
            let suggestion = if capitalize {
                capitalize_first(candidate)
            } else {
                candidate.to_string()
            };
            if suggestion != word && !suggestions.contains(&suggestion) {
                suggestions.push(suggestion);
            }
            if suggestions.len() == MAX_SUGGESTIONS {
                break;
            }
        }

        Ok(suggestions)
    }

    fn add_word(&self, word: &str) {
        self.custom.write().add(word);
    }
}

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::TempDir;

    fn checker() -> WordListChecker {
        WordListChecker::from_words(
            ["the", "quick", "fox", "cat", "it's", "don't", "naïve", "kevin's"],
            CustomWords::new(),
        )
    }

    fn span(word: &str, index: usize) -> ErrorSpan {
        ErrorSpan {
            word: word.to_string(),
            index,
            length: word.chars().count(),
        }
    }

    #[test]
    fn test_reports_unknown_words_with_char_offsets() {
        let errors = checker().check("Teh quick fox").unwrap();
        assert_eq!(errors, vec![span("Teh", 0)]);

        let errors = checker().check("naïve kat").unwrap();
        assert_eq!(errors, vec![span("kat", 6)]);
    }

    #[test]
    fn test_capitalized_and_uppercase_forms_of_known_words() {
        assert!(checker().check("The QUICK Fox").unwrap().is_empty());
        // mixed case is not a recognised form of a lowercase entry
        assert_eq!(checker().check("fOx").unwrap(), vec![span("fOx", 0)]);
    }

    #[test]
    fn test_apostrophes_are_part_of_words() {
        assert!(checker().check("it's it\u{2019}s don\u{2019}t").unwrap().is_empty());
        assert_eq!(checker().check("can't").unwrap(), vec![span("can't", 0)]);
    }

    #[test]
    fn test_tokens_with_digits_are_not_reported() {
        assert!(checker().check("the 2nd cat 42").unwrap().is_empty());

        let errors = checker().check("teh 3rd kat").unwrap();
        assert_eq!(errors, vec![span("teh", 0), span("kat", 8)]);
    }

    #[test]
    fn test_custom_words_are_skipped_case_sensitively() {
        let checker = checker();
        checker.add_word("Kevin");

        let errors = checker.check("Kevin and kevin").unwrap();
        assert_eq!(errors, vec![span("and", 6), span("kevin", 10)]);
    }

    #[test]
    fn test_dic_text_parsing() {
        let checker = WordListChecker::from_dic_text("3\nhello/SM\nworld\n\nfoo\tpo:noun\n", CustomWords::new());

        assert_eq!(checker.word_count(), 3);
        assert!(checker.check("hello world foo").unwrap().is_empty());
    }

    #[test]
    fn test_suggestions_ranked_by_distance() {
        let suggestions = checker().suggest("teh").unwrap();
        assert_eq!(suggestions, vec!["the".to_string()]);

        let suggestions = checker().suggest("Kat").unwrap();
        assert_eq!(suggestions, vec!["Cat".to_string()]);
    }

    #[test]
    fn test_from_paths_requires_both_files() {
        let temp_dir = TempDir::new().unwrap();
        let aff = temp_dir.path().join("en_US.aff");
        let dic = temp_dir.path().join("en_US.dic");

        let err = WordListChecker::from_paths(&aff, &dic, CustomWords::new()).err().unwrap();
        assert!(matches!(err, CheckerError::DictionaryNotFound(path) if path == aff));

        std::fs::write(&aff, "SET UTF-8\n").unwrap();
        let mut file = std::fs::File::create(&dic).unwrap();
        writeln!(file, "2\nhello/S\nworld").unwrap();

        let checker = WordListChecker::from_paths(&aff, &dic, ["tmbedit"].into_iter().collect()).unwrap();
        assert_eq!(checker.word_count(), 2);
        assert!(checker.check("hello tmbedit").unwrap().is_empty());
    }
}

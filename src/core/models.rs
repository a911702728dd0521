use std::{
    collections::HashSet,
    fmt,
};

/// WaniKani personal access token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for empty or whitespace-only input.
    pub fn new(token: impl AsRef<str>) -> Option<Self> {
        let token = token.as_ref().trim();
        if token.is_empty() {
            return None;
        }
        Some(Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Slugs of every kanji and vocabulary subject the user has learned well enough
/// to read without furigana.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownVocabulary {
    words: HashSet<String>,
    complete: bool,
}

impl KnownVocabulary {
    pub fn new(words: HashSet<String>, complete: bool) -> Self {
        Self { words, complete }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// False when some API page could not be fetched and the set may be missing entries.
    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

impl<S: Into<String>> FromIterator<S> for KnownVocabulary {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self { words: iter.into_iter().map(Into::into).collect(), complete: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_rejects_blank_input() {
        assert!(Credential::new("").is_none());
        assert!(Credential::new("   \n").is_none());

        let credential = Credential::new("  abc-123 \n").unwrap();
        assert_eq!(credential.as_str(), "abc-123");
        assert_eq!(credential.bearer(), "Bearer abc-123");
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = Credential::new("secret-token").unwrap();
        assert!(!format!("{:?}", credential).contains("secret-token"));
    }

    #[test]
    fn test_known_vocabulary_collapses_duplicates() {
        let known: KnownVocabulary = ["日本語", "明日", "日本語", "人"].into_iter().collect();
        assert_eq!(known.len(), 3);
        assert!(known.contains("人"));
        assert!(!known.contains("日本"));
        assert!(known.is_complete());
    }
}

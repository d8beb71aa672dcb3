use rol_core::Country;
use std::collections::HashSet;

/// Generic high-frequency terms and nationality demonyms that are always dropped.
pub const EXCLUDED_TERMS: &[&str] = &[
    "man", "time", "want", "case", "take", "continue", "end", "woman", "call", "come", "example",
    "long", "austrian", "belgian", "bulgarian", "croatian", "cypriot", "czech", "danish",
    "estonian", "finnish", "french", "german", "greek", "hungarian", "irish", "italian", "latvian",
    "lithuanian", "luxembourgish", "maltese", "dutch", "polish", "portuguese", "romanian",
    "slovak", "slovene", "spanish", "swedish",
];

/// Suggested user stopwords for a country.
pub fn default_user_stopwords(country: Country) -> String {
    format!("{} say day old year new come", country.slug())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    /// Whitespace-separated user words plus [`EXCLUDED_TERMS`].
    pub fn new(user: &str) -> Self {
        let words = user
            .split_whitespace()
            .map(str::to_lowercase)
            .chain(EXCLUDED_TERMS.iter().map(|w| w.to_string()))
            .collect();
        Self { words }
    }

    pub fn for_country(country: Country) -> Self {
        Self::new(&default_user_stopwords(country))
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for StopWords {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_defaults() {
        assert_eq!(
            default_user_stopwords(Country::Austria),
            "austria say day old year new come"
        );
        let stopwords = StopWords::for_country(Country::Austria);
        assert!(stopwords.contains("austria"));
        assert!(stopwords.contains("austrian"));
        assert!(!stopwords.contains("court"));
    }

    #[test]
    fn test_user_words_are_lowercased() {
        let stopwords = StopWords::new("Vienna  EU\nparliament");
        assert!(stopwords.contains("vienna"));
        assert!(stopwords.contains("eu"));
        assert!(stopwords.contains("parliament"));
        assert_eq!(stopwords.len(), EXCLUDED_TERMS.len() + 3);
    }
}

//! Sparse term-frequency encoding.
//!
//! Turns text into a term → weight map:
//!
//! 1. Lowercase and split on word boundaries
//! 2. Drop stop words and tokens of two characters or fewer
//! 3. Count raw term frequency
//! 4. Divide every count by the largest count, rounded to 3 decimals
//!
//! The encoder is stateless and deterministic: the same text and stop-word
//! list always yield the same map.

use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, LazyLock};

use crate::types::SparseVector;

/// Tokens of this many characters or fewer are dropped.
pub const MIN_TOKEN_CHARS: usize = 2;

#[allow(clippy::unwrap_used)]
static WORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").unwrap());

/// Deterministic text → sparse vector encoder.
#[derive(Debug, Clone)]
pub struct SparseEncoder {
    stop_words: Arc<HashSet<String>>,
}

impl Default for SparseEncoder {
    fn default() -> Self {
        // Contractions never survive word-boundary tokenization, so only
        // apostrophe-free entries can match.
        let words = stop_words::get(stop_words::LANGUAGE::English);
        Self::with_stop_words(words.iter().filter(|w| !w.contains('\'')))
    }
}

impl SparseEncoder {
    /// Create an encoder using the English stop-word list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an encoder with a custom stop-word list.
    pub fn with_stop_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let stop_words = words
            .into_iter()
            .map(|w| w.as_ref().to_lowercase())
            .collect();
        Self {
            stop_words: Arc::new(stop_words),
        }
    }

    /// Whether `token` is on the stop-word list.
    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }

    /// Lowercased tokens that survive stop-word and length filtering.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        WORD_PATTERN
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|t| t.chars().count() > MIN_TOKEN_CHARS)
            .filter(|t| !self.is_stop_word(t))
            .map(String::from)
            .collect()
    }

    /// Encode `text` into max-normalized term weights.
    ///
    /// Returns an empty map for empty or all-stop-word input.
    pub fn encode(&self, text: &str) -> SparseVector {
        let mut counts: BTreeMap<String, u32> = BTreeMap::new();
        for token in self.tokenize(text) {
            *counts.entry(token).or_insert(0) += 1;
        }

        let Some(max) = counts.values().copied().max() else {
            return SparseVector::new();
        };

        counts
            .into_iter()
            .map(|(term, count)| (term, round3(count as f32 / max as f32)))
            .collect()
    }
}

fn round3(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_empty() {
        let encoder = SparseEncoder::new();
        assert!(encoder.encode("").is_empty());
        assert!(encoder.encode("   \n\t").is_empty());
    }

    #[test]
    fn test_encode_all_stop_words() {
        let encoder = SparseEncoder::new();
        assert!(encoder.encode("the a an").is_empty());
        assert!(encoder.encode("The AND of it, is THIS").is_empty());
    }

    #[test]
    fn test_encode_contractions_are_stop_words() {
        let encoder = SparseEncoder::new();
        assert!(encoder.encode("aren't").is_empty());
        assert_eq!(encoder.encode("cats aren't dogs").len(), 2);
    }

    #[test]
    fn test_default_list_has_no_apostrophes() {
        let encoder = SparseEncoder::new();
        assert!(encoder.is_stop_word("the"));
        assert!(encoder.is_stop_word("aren"));
        assert!(!encoder.is_stop_word("aren't"));
    }

    #[test]
    fn test_encode_drops_short_tokens() {
        let encoder = SparseEncoder::new();
        let sparse = encoder.encode("ox go cat 42 ai");
        assert_eq!(sparse.len(), 1);
        assert_eq!(sparse.get("cat"), Some(&1.0));
    }

    #[test]
    fn test_encode_lowercases() {
        let encoder = SparseEncoder::new();
        let sparse = encoder.encode("Rust RUST rust");
        assert_eq!(sparse.len(), 1);
        assert_eq!(sparse.get("rust"), Some(&1.0));
    }

    #[test]
    fn test_encode_max_normalization() {
        let encoder = SparseEncoder::new();
        let sparse = encoder.encode("cat cat cat dog dog bird");

        assert_eq!(sparse.get("cat"), Some(&1.0));
        assert_eq!(sparse.get("dog"), Some(&0.667));
        assert_eq!(sparse.get("bird"), Some(&0.333));
    }

    #[test]
    fn test_encode_splits_on_punctuation() {
        let encoder = SparseEncoder::new();
        let sparse = encoder.encode("vector-search, vector.search; (vector)");

        assert_eq!(sparse.get("vector"), Some(&1.0));
        assert_eq!(sparse.get("search"), Some(&0.667));
    }

    #[test]
    fn test_encode_unicode_words() {
        let encoder = SparseEncoder::new();
        let sparse = encoder.encode("Größe größe café");
        assert_eq!(sparse.get("größe"), Some(&1.0));
        assert_eq!(sparse.get("café"), Some(&0.5));
    }

    #[test]
    fn test_custom_stop_words() {
        let encoder = SparseEncoder::with_stop_words(["Cat"]);
        let sparse = encoder.encode("cat dog the");

        assert!(!sparse.contains_key("cat"));
        assert_eq!(sparse.get("dog"), Some(&1.0));
        // "the" is only a stop word in the English list
        assert_eq!(sparse.get("the"), Some(&1.0));
    }

    #[test]
    fn test_tokenize_order() {
        let encoder = SparseEncoder::new();
        assert_eq!(
            encoder.tokenize("Hybrid search with reciprocal rank fusion"),
            vec!["hybrid", "search", "reciprocal", "rank", "fusion"]
        );
    }

    proptest! {
        #[test]
        fn prop_encode_is_deterministic(text in ".{0,200}") {
            let encoder = SparseEncoder::new();
            prop_assert_eq!(encoder.encode(&text), encoder.encode(&text));
        }

        #[test]
        fn prop_weights_are_normalized(text in "[a-z ]{0,200}") {
            let sparse = SparseEncoder::new().encode(&text);
            for weight in sparse.values() {
                prop_assert!(*weight > 0.0 && *weight <= 1.0);
            }
            if !sparse.is_empty() {
                prop_assert!(sparse.values().any(|w| *w == 1.0));
            }
        }
    }
}

//! Text analysis shared by vectorizer fit and transform.
//!
//! Lowercases, extracts word tokens of two or more characters, removes stop
//! words and expands the remaining tokens into space-joined n-grams. Fit and
//! transform both go through the same `Analyzer` so a term means the same
//! thing on both sides.

use std::collections::HashSet;

use regex::Regex;

use crate::config::VectorizerConfig;
use crate::error::{ClassifierError, Result};
use crate::text::stopwords;

/// Two or more word characters between word boundaries.
pub const TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

#[derive(Clone, Debug)]
pub struct Analyzer {
    token_pattern: Regex,
    stop_words: HashSet<String>,
    ngram_range: (usize, usize),
}

impl Analyzer {
    pub fn from_config(config: &VectorizerConfig) -> Result<Self> {
        config.validate()?;
        let token_pattern = Regex::new(TOKEN_PATTERN)
            .map_err(|e| ClassifierError::InvalidConfig(format!("token pattern: {}", e)))?;
        Ok(Self {
            token_pattern,
            stop_words: stopwords::resolve(&config.stop_words),
            ngram_range: config.ngram_range,
        })
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }

    /// Lowercased word tokens with stop words removed.
    pub fn tokens(&self, doc: &str) -> Vec<String> {
        let lowered = doc.to_lowercase();
        self.token_pattern
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|t| !self.is_stop_word(t))
            .map(str::to_string)
            .collect()
    }

    /// All n-gram terms of `doc`, shortest n first, in document order.
    pub fn analyze(&self, doc: &str) -> Vec<String> {
        let tokens = self.tokens(doc);
        let (min_n, max_n) = self.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n {
            if n == 1 {
                terms.extend(tokens.iter().cloned());
            } else {
                terms.extend(tokens.windows(n).map(|w| w.join(" ")));
            }
        }
        terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StopWordSet;

    fn analyzer(ngram_range: (usize, usize), stop_words: StopWordSet) -> Analyzer {
        let config = VectorizerConfig {
            ngram_range,
            stop_words,
            ..VectorizerConfig::default()
        };
        Analyzer::from_config(&config).unwrap()
    }

    #[test]
    fn tokens_are_lowercased_and_single_chars_dropped() {
        let a = analyzer((1, 1), StopWordSet::None);
        assert_eq!(
            a.tokens("Built a REST API in C and Go_lang"),
            vec!["built", "rest", "api", "in", "and", "go_lang"]
        );
    }

    #[test]
    fn stop_words_removed_before_bigrams() {
        let a = analyzer((1, 2), StopWordSet::English);
        assert_eq!(
            a.analyze("the data and the science"),
            vec!["data", "science", "data science"]
        );
    }

    #[test]
    fn empty_and_stop_only_documents_yield_nothing() {
        let a = analyzer((1, 2), StopWordSet::English);
        assert!(a.analyze("").is_empty());
        assert!(a.analyze("the and of which").is_empty());
    }
}

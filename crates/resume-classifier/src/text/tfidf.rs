//! TF-IDF vectorizer.
//!
//! Weighting follows the smoothed, L2-normalized scheme:
//!
//! ```text
//! tfidf(t, d) = count(t, d) * idf(t)
//! idf(t)      = ln((1 + n) / (1 + df(t))) + 1
//! ```
//!
//! followed by scaling every row to unit length. Rows with no known term are
//! left as all-zero vectors.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::VectorizerConfig;
use crate::error::{ClassifierError, Result};
use crate::math::SparseVector;
use crate::text::Analyzer;

/// Fitted TF-IDF vectorizer: vocabulary, IDF weights and the analyzer that produced them.
///
/// Immutable once fit; `transform` never fails and ignores terms outside the
/// learned vocabulary.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "VectorizerState", into = "VectorizerState")]
pub struct TfidfVectorizer {
    config: VectorizerConfig,
    analyzer: Analyzer,
    /// Term → column index.
    vocabulary: HashMap<String, u32>,
    /// Column index → term, ascending lexical order.
    feature_names: Vec<String>,
    idf: Vec<f32>,
    n_train_docs: usize,
}

/// On-disk form of a fitted vectorizer.
#[derive(Serialize, Deserialize)]
struct VectorizerState {
    config: VectorizerConfig,
    feature_names: Vec<String>,
    idf: Vec<f32>,
    n_train_docs: usize,
}

impl From<TfidfVectorizer> for VectorizerState {
    fn from(v: TfidfVectorizer) -> Self {
        Self {
            config: v.config,
            feature_names: v.feature_names,
            idf: v.idf,
            n_train_docs: v.n_train_docs,
        }
    }
}

impl TryFrom<VectorizerState> for TfidfVectorizer {
    type Error = String;

    fn try_from(state: VectorizerState) -> std::result::Result<Self, Self::Error> {
        if state.feature_names.len() != state.idf.len() {
            return Err(format!(
                "vectorizer state has {} terms but {} idf weights",
                state.feature_names.len(),
                state.idf.len()
            ));
        }
        let analyzer = Analyzer::from_config(&state.config).map_err(|e| e.to_string())?;
        let vocabulary = state
            .feature_names
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i as u32))
            .collect();
        Ok(Self {
            config: state.config,
            analyzer,
            vocabulary,
            feature_names: state.feature_names,
            idf: state.idf,
            n_train_docs: state.n_train_docs,
        })
    }
}

#[derive(Default)]
struct TermStats {
    /// Total occurrences across the corpus.
    tf: usize,
    /// Number of documents containing the term.
    df: usize,
}

impl TfidfVectorizer {
    /// Learn vocabulary and IDF weights from training documents.
    ///
    /// # Errors
    ///
    /// * `EmptyDataset` if `documents` is empty.
    /// * `InvalidConfig` if the configuration is inconsistent, including when
    ///   `max_doc_freq * n_docs` falls below `min_doc_freq`.
    /// * `EmptyVocabulary` if no term survives document-frequency pruning.
    pub fn fit<S: AsRef<str>>(config: &VectorizerConfig, documents: &[S]) -> Result<Self> {
        let analyzer = Analyzer::from_config(config)?;
        if documents.is_empty() {
            return Err(ClassifierError::EmptyDataset {
                context: "vectorizer training documents".to_string(),
            });
        }

        let n_docs = documents.len();
        let mut stats: HashMap<String, TermStats> = HashMap::new();
        for doc in documents {
            let mut counts: HashMap<String, usize> = HashMap::new();
            for term in analyzer.analyze(doc.as_ref()) {
                *counts.entry(term).or_insert(0) += 1;
            }
            for (term, count) in counts {
                let entry = stats.entry(term).or_default();
                entry.tf += count;
                entry.df += 1;
            }
        }

        let max_doc_count = config.max_doc_freq as f64 * n_docs as f64;
        if max_doc_count < config.min_doc_freq as f64 {
            return Err(ClassifierError::InvalidConfig(format!(
                "max_doc_freq {} of {} documents corresponds to fewer documents than min_doc_freq {}",
                config.max_doc_freq, n_docs, config.min_doc_freq
            )));
        }

        let mut kept: Vec<(String, TermStats)> = stats
            .into_iter()
            .filter(|(_, s)| s.df >= config.min_doc_freq && s.df as f64 <= max_doc_count)
            .collect();

        if kept.is_empty() {
            return Err(ClassifierError::EmptyVocabulary);
        }

        if kept.len() > config.vocabulary_size {
            kept.sort_by(|a, b| b.1.tf.cmp(&a.1.tf).then_with(|| a.0.cmp(&b.0)));
            kept.truncate(config.vocabulary_size);
        }

        // Column order is lexical, independent of how the cap ranked terms.
        kept.sort_by(|a, b| a.0.cmp(&b.0));

        let n = n_docs as f64;
        let idf = kept
            .iter()
            .map(|(_, s)| (((1.0 + n) / (1.0 + s.df as f64)).ln() + 1.0) as f32)
            .collect();
        let feature_names: Vec<String> = kept.into_iter().map(|(t, _)| t).collect();
        let vocabulary: HashMap<String, u32> = feature_names
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i as u32))
            .collect();

        log::debug!(
            "Fitted TF-IDF vocabulary of {} terms from {} documents",
            feature_names.len(),
            n_docs
        );

        Ok(Self {
            config: config.clone(),
            analyzer,
            vocabulary,
            feature_names,
            idf,
            n_train_docs: n_docs,
        })
    }

    /// Fit on `documents` and return their vectors.
    pub fn fit_transform<S: AsRef<str>>(
        config: &VectorizerConfig,
        documents: &[S],
    ) -> Result<(Self, Vec<SparseVector>)> {
        let vectorizer = Self::fit(config, documents)?;
        let vectors = vectorizer.transform(documents);
        Ok((vectorizer, vectors))
    }

    /// Map one document into the learned space.
    pub fn transform_one(&self, doc: &str) -> SparseVector {
        let mut counts: HashMap<u32, usize> = HashMap::new();
        for term in self.analyzer.analyze(doc) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                *counts.entry(idx).or_insert(0) += 1;
            }
        }
        let pairs = counts
            .into_iter()
            .map(|(idx, count)| (idx, count as f32 * self.idf[idx as usize]))
            .collect();
        let mut v = SparseVector::from_pairs(self.vocabulary_size(), pairs);
        v.l2_normalize();
        v
    }

    pub fn transform<S: AsRef<str>>(&self, documents: &[S]) -> Vec<SparseVector> {
        documents
            .iter()
            .map(|d| self.transform_one(d.as_ref()))
            .collect()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.feature_names.len()
    }

    /// Terms in column order.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).map(|&i| i as usize)
    }

    pub fn idf(&self) -> &[f32] {
        &self.idf
    }

    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }

    pub fn n_train_docs(&self) -> usize {
        self.n_train_docs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StopWordSet;

    fn config(min_df: usize, max_df: f32) -> VectorizerConfig {
        VectorizerConfig {
            min_doc_freq: min_df,
            max_doc_freq: max_df,
            ..VectorizerConfig::default()
        }
    }

    const DOCS: [&str; 4] = [
        "python machine learning engineer",
        "python data analysis",
        "java spring developer",
        "java spring boot developer python",
    ];

    #[test]
    fn document_frequency_bounds_prune_terms() {
        let v = TfidfVectorizer::fit(&config(2, 0.8), &DOCS).unwrap();
        // "python" is in 3 of 4 docs (<= 3.2); "java", "spring", "developer"
        // and "java spring" are in 2; everything else in 1.
        let names: Vec<&str> = v.feature_names().iter().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["developer", "java", "java spring", "python", "spring"]);
        assert!(v.term_index("machine").is_none());
    }

    #[test]
    fn max_df_drops_ubiquitous_terms() {
        let v = TfidfVectorizer::fit(&config(1, 0.5), &DOCS).unwrap();
        assert!(v.term_index("python").is_none());
        assert!(v.term_index("java").is_some());
    }

    #[test]
    fn vocabulary_cap_keeps_most_frequent() {
        let cfg = VectorizerConfig {
            vocabulary_size: 2,
            min_doc_freq: 1,
            max_doc_freq: 1.0,
            ngram_range: (1, 1),
            stop_words: StopWordSet::None,
        };
        let v = TfidfVectorizer::fit(&cfg, &["aa aa aa bb bb cc", "bb dd"]).unwrap();
        assert_eq!(v.feature_names(), &["aa".to_string(), "bb".to_string()]);
    }

    #[test]
    fn rows_are_unit_length_and_idf_smoothed() {
        let v = TfidfVectorizer::fit(&config(1, 1.0), &DOCS).unwrap();
        let rows = v.transform(&DOCS);
        for row in &rows {
            assert!((row.norm() - 1.0).abs() < 1e-5);
        }
        let python = v.term_index("python").unwrap();
        let expected = ((5.0f64 / 4.0).ln() + 1.0) as f32;
        assert!((v.idf()[python] - expected).abs() < 1e-6);
    }

    #[test]
    fn unknown_and_stop_words_give_zero_vector() {
        let v = TfidfVectorizer::fit(&config(2, 0.8), &DOCS).unwrap();
        assert!(v.transform_one("").is_zero());
        assert!(v.transform_one("the and of").is_zero());
        assert!(v.transform_one("kubernetes terraform").is_zero());
        assert_eq!(v.transform_one("").dim(), v.vocabulary_size());
    }

    #[test]
    fn inconsistent_bounds_are_rejected() {
        let err = TfidfVectorizer::fit(&config(5, 0.8), &DOCS).unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidConfig(_)));
    }

    #[test]
    fn nothing_surviving_is_empty_vocabulary() {
        let err = TfidfVectorizer::fit(&config(2, 1.0), &["alpha beta", "gamma delta"]).unwrap_err();
        assert!(matches!(err, ClassifierError::EmptyVocabulary));
    }

    #[test]
    fn json_round_trip_preserves_vectors() {
        let v = TfidfVectorizer::fit(&config(1, 1.0), &DOCS).unwrap();
        let json = serde_json::to_string(&v).unwrap();
        let back: TfidfVectorizer = serde_json::from_str(&json).unwrap();
        assert_eq!(back.feature_names(), v.feature_names());
        assert_eq!(back.transform_one(DOCS[3]), v.transform_one(DOCS[3]));
    }
}

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{ClassifierError, Result};

/// Central configuration record handed to the training pipeline.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub data: DataConfig,
    pub split: SplitConfig,
    pub vectorizer: VectorizerConfig,
    pub model: KnnConfig,
    /// Directory receiving the artifact set.
    pub output_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            split: SplitConfig::default(),
            vectorizer: VectorizerConfig::default(),
            model: KnnConfig::default(),
            output_dir: PathBuf::from("models"),
        }
    }
}

/// Where the labeled résumés live and which columns hold text and label.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    pub path: PathBuf,
    /// Case-sensitive header name of the free-text column.
    pub text_column: String,
    /// Case-sensitive header name of the category column.
    pub label_column: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/UpdatedResumeDataSet.csv"),
            text_column: "Resume".to_string(),
            label_column: "Category".to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SplitConfig {
    pub test_fraction: f32,
    pub random_seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            random_seed: 42,
        }
    }
}

/// TF-IDF hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct VectorizerConfig {
    /// Upper bound on the number of learned terms.
    pub vocabulary_size: usize,
    /// Terms seen in fewer documents than this are dropped.
    pub min_doc_freq: usize,
    /// Terms seen in more than this fraction of documents are dropped.
    pub max_doc_freq: f32,
    /// Inclusive (min_n, max_n) n-gram range.
    pub ngram_range: (usize, usize),
    pub stop_words: StopWordSet,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            vocabulary_size: 5000,
            min_doc_freq: 2,
            max_doc_freq: 0.8,
            ngram_range: (1, 2),
            stop_words: StopWordSet::English,
        }
    }
}

impl VectorizerConfig {
    pub fn validate(&self) -> Result<()> {
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ClassifierError::InvalidConfig(format!(
                "ngram_range must satisfy 1 <= min <= max, got ({}, {})",
                min_n, max_n
            )));
        }
        if !(self.max_doc_freq > 0.0 && self.max_doc_freq <= 1.0) {
            return Err(ClassifierError::InvalidConfig(format!(
                "max_doc_freq must be in (0, 1], got {}",
                self.max_doc_freq
            )));
        }
        if self.vocabulary_size == 0 {
            return Err(ClassifierError::InvalidConfig(
                "vocabulary_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Stop-word list removed before n-gram generation.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StopWordSet {
    #[default]
    English,
    None,
    Custom(Vec<String>),
}

impl FromStr for StopWordSet {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "english" => Ok(StopWordSet::English),
            "none" => Ok(StopWordSet::None),
            other => Err(format!(
                "Unknown stop word set: {}. Use 'english', 'none', or a custom list in the config file",
                other
            )),
        }
    }
}

/// k-nearest-neighbor hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct KnnConfig {
    pub k_neighbors: usize,
    pub distance_metric: DistanceMetric,
    /// Worker threads for the neighbor search. `None` uses every core.
    pub n_jobs: Option<usize>,
}

impl Default for KnnConfig {
    fn default() -> Self {
        Self {
            k_neighbors: 5,
            distance_metric: DistanceMetric::Cosine,
            n_jobs: None,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// `1 - cos(a, b)`; zero vectors sit at distance 1 from everything.
    #[default]
    Cosine,
    Euclidean,
}

impl FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(DistanceMetric::Cosine),
            "euclidean" => Ok(DistanceMetric::Euclidean),
            _ => Err(format!(
                "Unknown distance metric: {}. Supported metrics are 'cosine' and 'euclidean'",
                s
            )),
        }
    }
}

impl std::fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistanceMetric::Cosine => f.write_str("cosine"),
            DistanceMetric::Euclidean => f.write_str("euclidean"),
        }
    }
}

impl PipelineConfig {
    pub fn new(data_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            data: DataConfig {
                path: data_path.into(),
                ..DataConfig::default()
            },
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    /// Check every stage's parameters up front so a bad value fails before any file is read.
    pub fn validate(&self) -> Result<()> {
        let f = self.split.test_fraction;
        if !(f > 0.0 && f < 1.0) {
            return Err(ClassifierError::InvalidConfig(format!(
                "test_fraction must be strictly between 0 and 1, got {}",
                f
            )));
        }
        if self.model.k_neighbors == 0 {
            return Err(ClassifierError::InvalidConfig(
                "k_neighbors must be at least 1".to_string(),
            ));
        }
        if self.model.n_jobs == Some(0) {
            return Err(ClassifierError::InvalidConfig(
                "n_jobs must be at least 1 when set".to_string(),
            ));
        }
        self.vectorizer.validate()
    }
}

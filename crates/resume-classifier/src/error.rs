use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the loader, splitter, vectorizer, classifier, evaluator and persister.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("input data not found: {}", path.display())]
    DataNotFound { path: PathBuf },

    #[error("no usable samples in {context}")]
    EmptyDataset { context: String },

    #[error("label '{label}' has {count} sample(s); at least {required} are needed to appear in both train and test")]
    InsufficientSamples {
        label: String,
        count: usize,
        required: usize,
    },

    #[error("vector has dimension {actual}, model was fit with {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("required column '{column}' not found in header {available:?}")]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    #[error("vocabulary is empty after pruning; try a lower min_doc_freq or a higher max_doc_freq")]
    EmptyVocabulary,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0} has not been fit")]
    NotFitted(&'static str),

    #[error("length mismatch: {left} {what} vs {right}")]
    LengthMismatch {
        what: &'static str,
        left: usize,
        right: usize,
    },

    #[error("artifact set in {} is incomplete (missing {missing})", dir.display())]
    IncompleteArtifacts { dir: PathBuf, missing: String },

    #[error("failed to read row {row}: {source}")]
    Csv {
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("(de)serialization of {} failed: {source}", path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ClassifierError>;

/// Pipeline stage in which a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Split,
    Vectorize,
    Fit,
    Predict,
    Evaluate,
    Persist,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Split => "split",
            Stage::Vectorize => "vectorize",
            Stage::Fit => "fit",
            Stage::Predict => "predict",
            Stage::Evaluate => "evaluate",
            Stage::Persist => "persist",
        };
        f.write_str(name)
    }
}

/// A [`ClassifierError`] tagged with the stage that produced it.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: ClassifierError,
}

impl PipelineError {
    pub fn new(stage: Stage, source: ClassifierError) -> Self {
        Self { stage, source }
    }
}

/// Attach a [`Stage`] to a stage result.
pub trait StageContext<T> {
    fn stage(self, stage: Stage) -> std::result::Result<T, PipelineError>;
}

impl<T> StageContext<T> for Result<T> {
    fn stage(self, stage: Stage) -> std::result::Result<T, PipelineError> {
        self.map_err(|e| PipelineError::new(stage, e))
    }
}

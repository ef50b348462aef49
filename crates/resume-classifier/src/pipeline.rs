//! End-to-end training run: load, split, vectorize, fit, predict, evaluate, persist.
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::data_handling::Dataset;
use crate::error::{PipelineError, Stage, StageContext};
use crate::io::{read_resume_csv_with_config, ResumeReaderConfig};
use crate::metrics::{classification_report, ClassificationReport, MetricsReport};
use crate::models::{ClassifierModel, KNearestNeighbors};
use crate::persistence::{save_artifacts, ArtifactPaths};
use crate::text::TfidfVectorizer;

/// Number of (actual, predicted) pairs kept for the run summary.
pub const SAMPLE_PREDICTIONS: usize = 10;

/// Everything a caller needs to report on a finished run.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub metrics: MetricsReport,
    pub report: ClassificationReport,
    pub artifacts: ArtifactPaths,
    /// First test samples as (actual, predicted).
    pub sample_predictions: Vec<(String, String)>,
}

pub struct TrainingPipeline {
    config: PipelineConfig,
}

impl TrainingPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load the configured file and train on it.
    pub fn run(&self) -> Result<TrainingOutcome, PipelineError> {
        self.config.validate().stage(Stage::Load)?;

        let path = &self.config.data.path;
        log::info!("Loading resumes from {:?}", path);
        let dataset =
            read_resume_csv_with_config(path, &ResumeReaderConfig::from(&self.config.data))
                .stage(Stage::Load)?;

        self.run_on(&dataset)
    }

    /// Train on an already loaded dataset.
    pub fn run_on(&self, dataset: &Dataset) -> Result<TrainingOutcome, PipelineError> {
        let config = &self.config;
        config.validate().stage(Stage::Load)?;
        dataset.log_input_data_summary();

        let split = dataset
            .stratified_split(config.split.test_fraction, config.split.random_seed)
            .stage(Stage::Split)?;
        log::info!(
            "Split into {} training and {} test resumes",
            split.train.len(),
            split.test.len()
        );

        let start = Instant::now();
        let (vectorizer, x_train) =
            TfidfVectorizer::fit_transform(&config.vectorizer, &split.train.texts())
                .stage(Stage::Vectorize)?;
        let x_test = vectorizer.transform(&split.test.texts());
        log::info!(
            "Vectorized text into {} TF-IDF features in {:.2?}",
            vectorizer.vocabulary_size(),
            start.elapsed()
        );

        let y_train = split.train.labels();
        let y_test = split.test.labels();

        let mut model = KNearestNeighbors::new(config.model.clone());
        model.fit(&x_train, &y_train).stage(Stage::Fit)?;
        log::info!(
            "Fitted {} (k={}, metric={}) on {} vectors",
            model.name(),
            model.k(),
            model.metric(),
            model.n_samples()
        );

        let start = Instant::now();
        let y_pred = model.predict(&x_test).stage(Stage::Predict)?;
        log::info!("Predicted {} test resumes in {:.2?}", y_pred.len(), start.elapsed());

        let report = classification_report(&y_test, &y_pred).stage(Stage::Evaluate)?;
        let metrics = report.to_metrics(
            split.train.len(),
            vectorizer.vocabulary_size(),
            dataset.n_categories(),
        );
        log::info!(
            "Accuracy {:.4}, weighted F1 {:.4}",
            metrics.accuracy,
            metrics.f1_score
        );

        let artifacts = save_artifacts(&config.output_dir, &vectorizer, &model, &metrics)
            .stage(Stage::Persist)?;

        let sample_predictions = y_test
            .into_iter()
            .zip(y_pred)
            .take(SAMPLE_PREDICTIONS)
            .collect();

        Ok(TrainingOutcome {
            metrics,
            report,
            artifacts,
            sample_predictions,
        })
    }
}

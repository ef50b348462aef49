use anyhow::Result;
use resume_classifier::config::PipelineConfig;
use resume_classifier::pipeline::{TrainingOutcome, TrainingPipeline};
use std::fmt::Write;

use crate::util::validate_tsv_or_csv_file;

pub fn run_training(config: &PipelineConfig) -> Result<TrainingOutcome> {
    validate_tsv_or_csv_file(&config.data.path)?;
    log::info!(
        "Training k={} {} classifier on {:?}, artifacts go to {:?}",
        config.model.k_neighbors,
        config.model.distance_metric,
        config.data.path,
        config.output_dir
    );

    let outcome = TrainingPipeline::new(config.clone()).run()?;
    log::info!("Training complete");
    Ok(outcome)
}

/// Human readable summary of a finished run, printed to stdout.
pub fn render_summary(outcome: &TrainingOutcome) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "===== Model Performance =====");
    let _ = writeln!(out, "{}", outcome.metrics);
    let _ = writeln!(out);
    let _ = writeln!(out, "===== Classification Report =====");
    let _ = write!(out, "{}", outcome.report);
    let _ = writeln!(out);
    let _ = writeln!(out, "===== Sample Predictions =====");
    for (actual, predicted) in &outcome.sample_predictions {
        let _ = writeln!(out, "Actual: {:<28} Predicted: {}", actual, predicted);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "===== Saved Artifacts =====");
    for path in outcome.artifacts.files() {
        let _ = writeln!(out, "{}", path.display());
    }
    out
}

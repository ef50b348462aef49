use anyhow::{Context, Result};
use resume_classifier::persistence::ResumeModel;

use super::input::PredictConfig;

/// Load the saved model and label every input text.
pub fn run_inference(config: &PredictConfig) -> Result<Vec<String>> {
    log::info!("Loading model artifacts from {:?}", config.model_dir);
    let model = ResumeModel::load(&config.model_dir)
        .with_context(|| format!("Failed to load model from {:?}", config.model_dir))?;
    log::debug!(
        "Model has {} features and {} categories",
        model.vectorizer().vocabulary_size(),
        model.classifier().classes().len()
    );

    let labels = model.predict_texts(&config.texts)?;
    log::info!("Classified {} resume(s)", labels.len());
    Ok(labels)
}

use anyhow::{Context, Result};
use clap::ArgMatches;
use resume_classifier::config::{DistanceMetric, PipelineConfig};
use std::fs;
use std::path::{Path, PathBuf};

/// Read a JSON pipeline configuration. Keys left out take their defaults.
pub fn load_pipeline_config(config_path: &Path) -> Result<PipelineConfig> {
    let config_json = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
    serde_json::from_str(&config_json)
        .with_context(|| format!("Failed to parse config file: {:?}", config_path))
}

/// Build the training configuration from an optional config file plus CLI overrides.
pub fn pipeline_config_from_arguments(
    config_path: Option<&PathBuf>,
    matches: &ArgMatches,
) -> Result<PipelineConfig> {
    let mut config = match config_path {
        Some(path) => load_pipeline_config(path)?,
        None => PipelineConfig::default(),
    };

    // Apply CLI overrides
    if let Some(data) = matches.get_one::<PathBuf>("data") {
        config.data.path = data.clone();
    }
    if let Some(output_dir) = matches.get_one::<PathBuf>("output_dir") {
        config.output_dir = output_dir.clone();
    }
    if let Some(k) = matches.get_one::<usize>("k") {
        config.model.k_neighbors = *k;
    }
    if let Some(seed) = matches.get_one::<u64>("seed") {
        config.split.random_seed = *seed;
    }
    if let Some(test_fraction) = matches.get_one::<f32>("test_fraction") {
        config.split.test_fraction = *test_fraction;
    }
    if let Some(max_features) = matches.get_one::<usize>("max_features") {
        config.vectorizer.vocabulary_size = *max_features;
    }
    if let Some(metric) = matches.get_one::<String>("metric") {
        config.model.distance_metric = metric
            .parse::<DistanceMetric>()
            .map_err(anyhow::Error::msg)?;
    }
    if let Some(jobs) = matches.get_one::<usize>("jobs") {
        config.model.n_jobs = Some(*jobs);
    }

    config
        .validate()
        .context("Invalid training configuration")?;
    Ok(config)
}

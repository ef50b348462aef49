use anyhow::{Context, Result};
use clap::ArgMatches;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct PredictConfig {
    pub model_dir: PathBuf,
    /// One résumé per entry, in output order.
    pub texts: Vec<String>,
}

impl PredictConfig {
    pub fn from_arguments(matches: &ArgMatches) -> Result<Self> {
        let model_dir = matches
            .get_one::<PathBuf>("model_dir")
            .cloned()
            .context("--model-dir is required")?;

        let mut texts: Vec<String> = matches
            .get_many::<String>("text")
            .map(|values| values.cloned().collect())
            .unwrap_or_default();

        if let Some(files) = matches.get_many::<PathBuf>("file") {
            for path in files {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read resume file: {:?}", path))?;
                texts.push(text);
            }
        }

        if texts.is_empty() {
            anyhow::bail!("Nothing to classify: pass resume text or --file");
        }

        Ok(Self { model_dir, texts })
    }
}

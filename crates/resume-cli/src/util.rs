use anyhow::Result;
use resume_classifier::error::ClassifierError;
use std::path::Path;

/// Exit status for a failed run, keyed on the underlying classifier error.
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_DATA_NOT_FOUND: i32 = 2;
pub const EXIT_EMPTY_DATASET: i32 = 3;
pub const EXIT_INSUFFICIENT_SAMPLES: i32 = 4;
pub const EXIT_DIMENSION_MISMATCH: i32 = 5;

/// Accept only `.tsv`/`.csv` inputs that exist.
///
/// A missing file is reported as [`ClassifierError::DataNotFound`] so it maps
/// to the same exit status as a missing file found by the loader.
pub fn validate_tsv_or_csv_file(path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());
    match ext.as_deref() {
        Some("tsv") | Some("csv") => {}
        _ => anyhow::bail!("File must have a .tsv or .csv extension: {}", path.display()),
    }

    if !path.exists() {
        return Err(ClassifierError::DataNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }

    Ok(())
}

/// Map an error chain onto the process exit status.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    let classifier_error = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<ClassifierError>());
    match classifier_error {
        Some(ClassifierError::DataNotFound { .. }) => EXIT_DATA_NOT_FOUND,
        Some(ClassifierError::EmptyDataset { .. }) => EXIT_EMPTY_DATASET,
        Some(ClassifierError::InsufficientSamples { .. }) => EXIT_INSUFFICIENT_SAMPLES,
        Some(ClassifierError::DimensionMismatch { .. })
        | Some(ClassifierError::IncompleteArtifacts { .. }) => EXIT_DIMENSION_MISMATCH,
        _ => EXIT_FAILURE,
    }
}

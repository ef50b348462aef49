//! Delimited résumé table reader.
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use csv::StringRecord;

use crate::config::DataConfig;
use crate::data_handling::{Dataset, Sample};
use crate::error::{ClassifierError, Result};

/// Configuration for reading a résumé table.
#[derive(Debug, Clone)]
pub struct ResumeReaderConfig {
    /// Header of the free-text column (case-sensitive).
    pub text_column: String,
    /// Header of the category column (case-sensitive).
    pub label_column: String,
    /// Field delimiter. When `None` it is picked from the file extension
    /// (`.tsv` → tab, anything else → comma).
    pub delimiter: Option<u8>,
}

impl Default for ResumeReaderConfig {
    fn default() -> Self {
        let data = DataConfig::default();
        Self {
            text_column: data.text_column,
            label_column: data.label_column,
            delimiter: None,
        }
    }
}

impl From<&DataConfig> for ResumeReaderConfig {
    fn from(data: &DataConfig) -> Self {
        Self {
            text_column: data.text_column.clone(),
            label_column: data.label_column.clone(),
            delimiter: None,
        }
    }
}

/// Read a résumé table with the default `Resume` / `Category` columns.
pub fn read_resume_csv<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    read_resume_csv_with_config(path, &ResumeReaderConfig::default())
}

/// Read a résumé table using a custom configuration.
///
/// Rows whose text or label is missing or blank are dropped (and counted in
/// the log). Fails with `DataNotFound` when the path does not resolve,
/// `MissingColumn` when a configured header is absent and `EmptyDataset` when
/// no complete row remains.
pub fn read_resume_csv_with_config<P: AsRef<Path>>(
    path: P,
    config: &ResumeReaderConfig,
) -> Result<Dataset> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ClassifierError::DataNotFound {
            path: path.to_path_buf(),
        },
        _ => ClassifierError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    if file.metadata().map(|m| m.is_dir()).unwrap_or(false) {
        return Err(ClassifierError::DataNotFound {
            path: path.to_path_buf(),
        });
    }

    let delimiter = config.delimiter.unwrap_or_else(|| delimiter_for(path));
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let headers = reader
        .headers()
        .map_err(|source| ClassifierError::Csv { row: 0, source })?
        .clone();

    let text_idx = find_column(&headers, &config.text_column)?;
    let label_idx = find_column(&headers, &config.label_column)?;

    let mut samples = Vec::new();
    let mut dropped = 0usize;

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.map_err(|source| ClassifierError::Csv {
            row: row_idx + 1,
            source,
        })?;

        match (non_blank(&record, text_idx), non_blank(&record, label_idx)) {
            (Some(text), Some(label)) => samples.push(Sample::new(text, label.trim())),
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        log::warn!(
            "Dropped {} incomplete row(s) from {}",
            dropped,
            path.display()
        );
    }

    if samples.is_empty() {
        return Err(ClassifierError::EmptyDataset {
            context: path.display().to_string(),
        });
    }

    log::debug!(
        "Read {} samples from {} ({} dropped)",
        samples.len(),
        path.display(),
        dropped
    );

    Dataset::new(samples)
}

fn delimiter_for(path: &Path) -> u8 {
    let is_tsv = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("tsv"))
        .unwrap_or(false);
    if is_tsv {
        b'\t'
    } else {
        b','
    }
}

fn find_column(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|header| header == name)
        .ok_or_else(|| ClassifierError::MissingColumn {
            column: name.to_string(),
            available: headers.iter().map(str::to_string).collect(),
        })
}

fn non_blank(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).filter(|v| !v.trim().is_empty())
}

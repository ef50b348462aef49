//! Artifact persistence.
//!
//! A trained model is stored as three independent JSON files plus a manifest:
//!
//! | file | contents |
//! |---|---|
//! | `vectorizer.json` | vocabulary, IDF weights, analyzer settings |
//! | `knn_model.json` | k-NN settings, training vectors and labels |
//! | `metrics.json` | [`MetricsReport`] of the run |
//! | `manifest.json` | file names, crate version, completion time |
//!
//! Each file is written to a `.tmp` sibling and renamed into place. The
//! manifest goes last, so a directory holding a manifest always holds a
//! complete set.
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, Result};
use crate::math::SparseVector;
use crate::metrics::MetricsReport;
use crate::models::{ClassifierModel, KNearestNeighbors};
use crate::text::TfidfVectorizer;

pub const VECTORIZER_FILE: &str = "vectorizer.json";
pub const CLASSIFIER_FILE: &str = "knn_model.json";
pub const METRICS_FILE: &str = "metrics.json";
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub vectorizer: String,
    pub classifier: String,
    pub metrics: String,
    pub crate_version: String,
    pub created_at: DateTime<Utc>,
}

impl ArtifactManifest {
    fn now() -> Self {
        Self {
            vectorizer: VECTORIZER_FILE.to_string(),
            classifier: CLASSIFIER_FILE.to_string(),
            metrics: METRICS_FILE.to_string(),
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Locations of one artifact set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub dir: PathBuf,
    pub vectorizer: PathBuf,
    pub classifier: PathBuf,
    pub metrics: PathBuf,
    pub manifest: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        Self {
            vectorizer: dir.join(VECTORIZER_FILE),
            classifier: dir.join(CLASSIFIER_FILE),
            metrics: dir.join(METRICS_FILE),
            manifest: dir.join(MANIFEST_FILE),
            dir,
        }
    }

    /// Artifact files in write order.
    pub fn files(&self) -> [&Path; 4] {
        [
            &self.vectorizer,
            &self.classifier,
            &self.metrics,
            &self.manifest,
        ]
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ClassifierError + '_ {
    move |source| ClassifierError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_json_to<T: Serialize>(tmp: &Path, path: &Path, value: &T) -> Result<()> {
    let file = File::create(tmp).map_err(io_error(tmp))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|source| {
        ClassifierError::Serialization {
            path: path.to_path_buf(),
            source,
        }
    })?;
    writer.flush().map_err(io_error(tmp))?;
    fs::rename(tmp, path).map_err(io_error(path))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let tmp = tmp_path(path);
    let outcome = write_json_to(&tmp, path, value);
    if outcome.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    outcome
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ClassifierError::IncompleteArtifacts {
                dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
                missing: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            })
        }
        Err(e) => return Err(io_error(path)(e)),
    };
    serde_json::from_reader(BufReader::new(file)).map_err(|source| ClassifierError::Serialization {
        path: path.to_path_buf(),
        source,
    })
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(io_error(path)(e)),
        _ => Ok(()),
    }
}

fn write_set(
    paths: &ArtifactPaths,
    vectorizer: &TfidfVectorizer,
    classifier: &KNearestNeighbors,
    metrics: &MetricsReport,
    written: &mut Vec<PathBuf>,
) -> Result<()> {
    write_json(&paths.vectorizer, vectorizer)?;
    written.push(paths.vectorizer.clone());
    write_json(&paths.classifier, classifier)?;
    written.push(paths.classifier.clone());
    write_json(&paths.metrics, metrics)?;
    written.push(paths.metrics.clone());
    write_json(&paths.manifest, &ArtifactManifest::now())?;
    written.push(paths.manifest.clone());
    Ok(())
}

/// Write the full artifact set into `dir`, creating it if needed.
///
/// On failure every file written by this call is removed again, so the
/// directory never ends up with a manifest next to a partial set.
pub fn save_artifacts(
    dir: impl AsRef<Path>,
    vectorizer: &TfidfVectorizer,
    classifier: &KNearestNeighbors,
    metrics: &MetricsReport,
) -> Result<ArtifactPaths> {
    let paths = ArtifactPaths::in_dir(dir);
    fs::create_dir_all(&paths.dir).map_err(io_error(&paths.dir))?;
    remove_if_exists(&paths.manifest)?;

    let mut written = Vec::new();
    if let Err(e) = write_set(&paths, vectorizer, classifier, metrics, &mut written) {
        log::error!("Writing artifacts to {:?} failed, cleaning up: {}", paths.dir, e);
        for path in &written {
            let _ = fs::remove_file(path);
        }
        return Err(e);
    }

    for path in paths.files() {
        log::info!("Saved {:?}", path);
    }
    Ok(paths)
}

pub fn load_vectorizer(dir: impl AsRef<Path>) -> Result<TfidfVectorizer> {
    read_json(&dir.as_ref().join(VECTORIZER_FILE))
}

pub fn load_classifier(dir: impl AsRef<Path>) -> Result<KNearestNeighbors> {
    read_json(&dir.as_ref().join(CLASSIFIER_FILE))
}

pub fn load_metrics(dir: impl AsRef<Path>) -> Result<MetricsReport> {
    read_json(&dir.as_ref().join(METRICS_FILE))
}

pub fn load_manifest(dir: impl AsRef<Path>) -> Result<ArtifactManifest> {
    read_json(&dir.as_ref().join(MANIFEST_FILE))
}

/// Fitted vectorizer and classifier, enough to label new raw text.
#[derive(Debug, Clone)]
pub struct ResumeModel {
    vectorizer: TfidfVectorizer,
    classifier: KNearestNeighbors,
    manifest: ArtifactManifest,
}

impl ResumeModel {
    /// Load a complete artifact set. Fails with `IncompleteArtifacts` if the
    /// manifest or a file it names is missing.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let manifest = load_manifest(dir)?;
        let vectorizer: TfidfVectorizer = read_json(&dir.join(&manifest.vectorizer))?;
        let classifier: KNearestNeighbors = read_json(&dir.join(&manifest.classifier))?;

        if let Some(dim) = classifier.n_features() {
            if dim != vectorizer.vocabulary_size() {
                return Err(ClassifierError::DimensionMismatch {
                    expected: dim,
                    actual: vectorizer.vocabulary_size(),
                });
            }
        }
        log::debug!(
            "Loaded model from {:?} (version {}, created {})",
            dir,
            manifest.crate_version,
            manifest.created_at
        );
        Ok(Self {
            vectorizer,
            classifier,
            manifest,
        })
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn classifier(&self) -> &KNearestNeighbors {
        &self.classifier
    }

    pub fn manifest(&self) -> &ArtifactManifest {
        &self.manifest
    }

    pub fn vectorize(&self, text: &str) -> SparseVector {
        self.vectorizer.transform_one(text)
    }

    pub fn predict_text(&self, text: &str) -> Result<String> {
        self.classifier.predict_one(&self.vectorize(text))
    }

    /// Labels for each text, in input order.
    pub fn predict_texts<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<String>> {
        self.classifier.predict(&self.vectorizer.transform(texts))
    }
}

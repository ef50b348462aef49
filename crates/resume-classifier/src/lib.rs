//! resume-classifier: TF-IDF + k-nearest-neighbor categorization of résumé text.
//!
//! The crate covers the whole offline training job: reading labeled résumés
//! from a delimited file, a seeded stratified train/test split, a TF-IDF
//! vectorizer fit on the training text only, a brute-force k-NN classifier,
//! evaluation metrics, and JSON artifacts that can be reloaded to label new
//! text. [`pipeline::TrainingPipeline`] strings the stages together.
pub mod config;
pub mod data_handling;
pub mod error;
pub mod io;
pub mod math;
pub mod metrics;
pub mod models;
pub mod persistence;
pub mod pipeline;
pub mod text;

pub use error::{ClassifierError, PipelineError, Result, Stage};

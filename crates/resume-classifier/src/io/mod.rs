//! Readers for labeled résumé tables.
pub mod resume_csv;

pub use resume_csv::{read_resume_csv, read_resume_csv_with_config, ResumeReaderConfig};

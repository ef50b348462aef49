//! Text preprocessing and TF-IDF vectorization.
//!
//! `Analyzer` turns raw text into the n-gram terms the vectorizer counts;
//! `TfidfVectorizer` learns a vocabulary and IDF weights from training text
//! and maps any text onto that fixed space.
pub mod analyzer;
pub mod stopwords;
pub mod tfidf;

pub use analyzer::Analyzer;
pub use tfidf::TfidfVectorizer;

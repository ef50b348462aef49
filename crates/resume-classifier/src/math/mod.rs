//! Sparse vector type used for TF-IDF rows and neighbor search.
pub mod vector;

pub use vector::SparseVector;

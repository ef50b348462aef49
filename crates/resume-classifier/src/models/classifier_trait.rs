use crate::error::Result;
use crate::math::SparseVector;

/// Contract for models that map TF-IDF vectors to category labels.
pub trait ClassifierModel {
    /// Fit on row-aligned vectors and labels.
    fn fit(&mut self, x: &[SparseVector], y: &[String]) -> Result<()>;

    /// Predict one label per input row, in input order.
    fn predict(&self, x: &[SparseVector]) -> Result<Vec<String>>;

    /// Dimensionality the model was fit with, if fit.
    fn n_features(&self) -> Option<usize>;

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}

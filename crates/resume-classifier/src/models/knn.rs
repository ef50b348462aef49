use std::cmp::Ordering;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{DistanceMetric, KnnConfig};
use crate::error::{ClassifierError, Result};
use crate::math::SparseVector;
use crate::models::classifier_trait::ClassifierModel;

/// Brute-force k-nearest-neighbor classifier over sparse vectors.
///
/// Fitting only stores the training rows. Prediction ranks every stored row
/// by (distance, training index) and takes a majority vote over the first `k`.
/// When several labels share the top vote count, the label whose best-ranked
/// neighbor is nearest wins.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "KnnState", into = "KnnState")]
pub struct KNearestNeighbors {
    config: KnnConfig,
    training: Option<TrainingSet>,
}

#[derive(Serialize, Deserialize)]
struct KnnState {
    config: KnnConfig,
    training: Option<TrainingSet>,
}

impl From<KNearestNeighbors> for KnnState {
    fn from(m: KNearestNeighbors) -> Self {
        Self {
            config: m.config,
            training: m.training,
        }
    }
}

impl TryFrom<KnnState> for KNearestNeighbors {
    type Error = String;

    fn try_from(state: KnnState) -> std::result::Result<Self, Self::Error> {
        let k = state.config.k_neighbors;
        let n = state.training.as_ref().map_or(usize::MAX, |t| t.labels.len());
        if k == 0 || k > n {
            return Err(format!(
                "k_neighbors must be between 1 and the number of training samples, got {}",
                k
            ));
        }
        Ok(Self {
            config: state.config,
            training: state.training,
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "TrainingSetState", into = "TrainingSetState")]
struct TrainingSet {
    dim: usize,
    vectors: Vec<SparseVector>,
    labels: Vec<String>,
    norms: Vec<f32>,
}

/// On-disk form of the stored training rows. Norms are recomputed on load.
#[derive(Serialize, Deserialize)]
struct TrainingSetState {
    dim: usize,
    vectors: Vec<SparseVector>,
    labels: Vec<String>,
}

impl From<TrainingSet> for TrainingSetState {
    fn from(t: TrainingSet) -> Self {
        Self {
            dim: t.dim,
            vectors: t.vectors,
            labels: t.labels,
        }
    }
}

impl TryFrom<TrainingSetState> for TrainingSet {
    type Error = String;

    fn try_from(state: TrainingSetState) -> std::result::Result<Self, Self::Error> {
        if state.vectors.len() != state.labels.len() {
            return Err(format!(
                "training set has {} vectors but {} labels",
                state.vectors.len(),
                state.labels.len()
            ));
        }
        if state.vectors.is_empty() {
            return Err("training set is empty".to_string());
        }
        if let Some((row, v)) = state
            .vectors
            .iter()
            .enumerate()
            .find(|(_, v)| v.dim() != state.dim)
        {
            return Err(format!(
                "training vector {} has dimension {}, expected {}",
                row,
                v.dim(),
                state.dim
            ));
        }
        Ok(Self {
            dim: state.dim,
            norms: state.vectors.iter().map(SparseVector::norm).collect(),
            vectors: state.vectors,
            labels: state.labels,
        })
    }
}

/// One retrieved neighbor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    /// Row index in the training set.
    pub index: usize,
    pub distance: f32,
}

impl KNearestNeighbors {
    pub fn new(config: KnnConfig) -> Self {
        KNearestNeighbors {
            config,
            training: None,
        }
    }

    pub fn k(&self) -> usize {
        self.config.k_neighbors
    }

    pub fn metric(&self) -> DistanceMetric {
        self.config.distance_metric
    }

    /// Override the worker count used by batch prediction.
    pub fn set_n_jobs(&mut self, n_jobs: Option<usize>) {
        self.config.n_jobs = n_jobs;
    }

    pub fn n_samples(&self) -> usize {
        self.training.as_ref().map_or(0, |t| t.labels.len())
    }

    /// Distinct training labels in ascending order.
    pub fn classes(&self) -> Vec<String> {
        let mut classes: Vec<String> = self
            .training
            .as_ref()
            .map(|t| t.labels.clone())
            .unwrap_or_default();
        classes.sort();
        classes.dedup();
        classes
    }

    fn training(&self) -> Result<&TrainingSet> {
        self.training
            .as_ref()
            .ok_or(ClassifierError::NotFitted("k-nearest-neighbor classifier"))
    }

    fn check_dim(training: &TrainingSet, x: &SparseVector) -> Result<()> {
        if x.dim() != training.dim {
            return Err(ClassifierError::DimensionMismatch {
                expected: training.dim,
                actual: x.dim(),
            });
        }
        Ok(())
    }

    /// The `k` nearest training rows of `x`, nearest first.
    pub fn kneighbors(&self, x: &SparseVector) -> Result<Vec<Neighbor>> {
        let training = self.training()?;
        Self::check_dim(training, x)?;
        Ok(self.search(training, x))
    }

    /// Label of a single vector.
    pub fn predict_one(&self, x: &SparseVector) -> Result<String> {
        let training = self.training()?;
        Self::check_dim(training, x)?;
        let neighbors = self.search(training, x);
        Ok(vote(&neighbors, &training.labels))
    }

    fn search(&self, training: &TrainingSet, x: &SparseVector) -> Vec<Neighbor> {
        let query = x.to_dense();
        let query_norm = x.norm();

        let mut scored: Vec<Neighbor> = training
            .vectors
            .iter()
            .zip(training.norms.iter())
            .enumerate()
            .map(|(index, (row, &row_norm))| Neighbor {
                index,
                distance: self.distance(row.dot_dense(&query), query_norm, row_norm),
            })
            .collect();

        let k = self.k().min(scored.len());
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, neighbor_order);
            scored.truncate(k);
        }
        scored.sort_by(neighbor_order);
        scored
    }

    fn distance(&self, dot: f32, query_norm: f32, row_norm: f32) -> f32 {
        match self.metric() {
            DistanceMetric::Cosine => {
                if query_norm == 0.0 || row_norm == 0.0 {
                    1.0
                } else {
                    1.0 - dot / (query_norm * row_norm)
                }
            }
            DistanceMetric::Euclidean => {
                (query_norm * query_norm + row_norm * row_norm - 2.0 * dot)
                    .max(0.0)
                    .sqrt()
            }
        }
    }

    fn predict_batch(&self, training: &TrainingSet, x: &[SparseVector]) -> Vec<String> {
        x.par_iter()
            .map(|row| vote(&self.search(training, row), &training.labels))
            .collect()
    }
}

fn neighbor_order(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.index.cmp(&b.index))
}

/// Majority vote over neighbors given nearest first.
///
/// Ties on vote count go to the label that appears earliest in the neighbor list.
fn vote(neighbors: &[Neighbor], labels: &[String]) -> String {
    // (label, votes, rank of first appearance)
    let mut tally: Vec<(&str, usize, usize)> = Vec::with_capacity(neighbors.len());
    for (rank, n) in neighbors.iter().enumerate() {
        let label = labels[n.index].as_str();
        match tally.iter_mut().find(|(l, _, _)| *l == label) {
            Some(entry) => entry.1 += 1,
            None => tally.push((label, 1, rank)),
        }
    }
    tally
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.2.cmp(&a.2)))
        .map(|(label, _, _)| label.to_string())
        .unwrap_or_default()
}

impl ClassifierModel for KNearestNeighbors {
    fn fit(&mut self, x: &[SparseVector], y: &[String]) -> Result<()> {
        if x.len() != y.len() {
            return Err(ClassifierError::LengthMismatch {
                what: "training vectors vs labels",
                left: x.len(),
                right: y.len(),
            });
        }
        let Some(first) = x.first() else {
            return Err(ClassifierError::EmptyDataset {
                context: "classifier training set".to_string(),
            });
        };
        if self.k() == 0 || self.k() > x.len() {
            return Err(ClassifierError::InvalidConfig(format!(
                "k_neighbors must be between 1 and the number of training samples ({}), got {}",
                x.len(),
                self.k()
            )));
        }
        let dim = first.dim();
        if let Some(bad) = x.iter().find(|v| v.dim() != dim) {
            return Err(ClassifierError::DimensionMismatch {
                expected: dim,
                actual: bad.dim(),
            });
        }

        self.training = Some(TrainingSet {
            dim,
            norms: x.iter().map(SparseVector::norm).collect(),
            vectors: x.to_vec(),
            labels: y.to_vec(),
        });
        log::debug!(
            "Indexed {} training vectors of dimension {} (k={}, metric={})",
            x.len(),
            dim,
            self.k(),
            self.metric()
        );
        Ok(())
    }

    fn predict(&self, x: &[SparseVector]) -> Result<Vec<String>> {
        let training = self.training()?;
        for row in x {
            Self::check_dim(training, row)?;
        }

        match self.config.n_jobs {
            Some(n_jobs) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n_jobs)
                    .build()
                    .map_err(|e| ClassifierError::InvalidConfig(format!("thread pool: {}", e)))?;
                Ok(pool.install(|| self.predict_batch(training, x)))
            }
            None => Ok(self.predict_batch(training, x)),
        }
    }

    fn n_features(&self) -> Option<usize> {
        self.training.as_ref().map(|t| t.dim)
    }

    fn name(&self) -> &str {
        "k-nearest-neighbors"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knn(k: usize, metric: DistanceMetric) -> KNearestNeighbors {
        KNearestNeighbors::new(KnnConfig {
            k_neighbors: k,
            distance_metric: metric,
            n_jobs: None,
        })
    }

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn train_set() -> (Vec<SparseVector>, Vec<String>) {
        let x = vec![
            SparseVector::from_dense(&[1.0, 0.0, 0.0]),
            SparseVector::from_dense(&[0.9, 0.1, 0.0]),
            SparseVector::from_dense(&[0.8, 0.0, 0.2]),
            SparseVector::from_dense(&[0.0, 1.0, 0.0]),
            SparseVector::from_dense(&[0.0, 0.9, 0.1]),
            SparseVector::from_dense(&[0.1, 0.8, 0.0]),
        ];
        (x, labels(&["A", "A", "A", "B", "B", "B"]))
    }

    #[test]
    fn majority_vote_cosine() {
        let (x, y) = train_set();
        let mut model = knn(3, DistanceMetric::Cosine);
        model.fit(&x, &y).unwrap();
        let preds = model
            .predict(&[
                SparseVector::from_dense(&[5.0, 0.2, 0.0]),
                SparseVector::from_dense(&[0.0, 3.0, 0.1]),
            ])
            .unwrap();
        assert_eq!(preds, labels(&["A", "B"]));
    }

    #[test]
    fn tie_goes_to_nearest_ranked_label() {
        let x = vec![
            SparseVector::from_dense(&[1.0, 0.0]),
            SparseVector::from_dense(&[0.0, 1.0]),
        ];
        let y = labels(&["Z", "A"]);
        let mut model = knn(2, DistanceMetric::Cosine);
        model.fit(&x, &y).unwrap();
        // One vote each; "Z" is the nearer neighbor.
        let pred = model.predict_one(&SparseVector::from_dense(&[0.9, 0.1])).unwrap();
        assert_eq!(pred, "Z");
    }

    #[test]
    fn zero_query_still_gets_a_label() {
        let (x, y) = train_set();
        let mut model = knn(5, DistanceMetric::Cosine);
        model.fit(&x, &y).unwrap();
        let zero = SparseVector::zeros(3);
        let neighbors = model.kneighbors(&zero).unwrap();
        // Every row is at distance 1; order falls back to training index.
        assert_eq!(
            neighbors.iter().map(|n| n.index).collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4]
        );
        assert_eq!(model.predict_one(&zero).unwrap(), "A");
    }

    #[test]
    fn dimension_mismatch_is_reported() {
        let (x, y) = train_set();
        let mut model = knn(3, DistanceMetric::Cosine);
        model.fit(&x, &y).unwrap();
        let err = model.predict(&[SparseVector::zeros(4)]).unwrap_err();
        match err {
            ClassifierError::DimensionMismatch { expected, actual } => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 4);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn predict_before_fit_fails() {
        let model = knn(3, DistanceMetric::Cosine);
        assert!(matches!(
            model.predict(&[SparseVector::zeros(3)]),
            Err(ClassifierError::NotFitted(_))
        ));
    }

    #[test]
    fn k_larger_than_training_set_rejected() {
        let (x, y) = train_set();
        let mut model = knn(7, DistanceMetric::Cosine);
        assert!(matches!(
            model.fit(&x, &y),
            Err(ClassifierError::InvalidConfig(_))
        ));
    }

    #[test]
    fn euclidean_distance_orders_by_magnitude() {
        let x = vec![
            SparseVector::from_dense(&[1.0, 0.0]),
            SparseVector::from_dense(&[10.0, 0.0]),
        ];
        let mut model = knn(1, DistanceMetric::Euclidean);
        model.fit(&x, &labels(&["near", "far"])).unwrap();
        assert_eq!(
            model.predict_one(&SparseVector::from_dense(&[9.0, 0.0])).unwrap(),
            "far"
        );
        // Same direction, so cosine could not tell these apart.
        let n = model.kneighbors(&SparseVector::from_dense(&[9.0, 0.0])).unwrap();
        assert!((n[0].distance - 1.0).abs() < 1e-5);
    }

    #[test]
    fn worker_count_does_not_change_predictions() {
        let (x, y) = train_set();
        let queries: Vec<SparseVector> = (0..40)
            .map(|i| {
                let t = i as f32 / 40.0;
                SparseVector::from_dense(&[1.0 - t, t, 0.05])
            })
            .collect();

        let mut serial = knn(3, DistanceMetric::Cosine);
        serial.set_n_jobs(Some(1));
        serial.fit(&x, &y).unwrap();

        let mut parallel = serial.clone();
        parallel.set_n_jobs(Some(4));

        assert_eq!(serial.predict(&queries).unwrap(), parallel.predict(&queries).unwrap());
    }

    #[test]
    fn serialized_model_round_trips() {
        let (x, y) = train_set();
        let mut model = knn(3, DistanceMetric::Cosine);
        model.fit(&x, &y).unwrap();
        let json = serde_json::to_value(&model).unwrap();
        // Norms are derived, not stored.
        assert!(json["training"].get("norms").is_none());

        let back: KNearestNeighbors = serde_json::from_value(json).unwrap();
        let query = SparseVector::from_dense(&[0.1, 0.9, 0.0]);
        assert_eq!(back.predict_one(&query).unwrap(), "B");
        assert_eq!(back.kneighbors(&query).unwrap(), model.kneighbors(&query).unwrap());
    }

    #[test]
    fn inconsistent_training_state_is_rejected() {
        let (x, y) = train_set();
        let mut model = knn(3, DistanceMetric::Cosine);
        model.fit(&x, &y).unwrap();
        let json = serde_json::to_value(&model).unwrap();

        let mut short_labels = json.clone();
        short_labels["training"]["labels"] = serde_json::json!(["A"]);
        assert!(serde_json::from_value::<KNearestNeighbors>(short_labels).is_err());

        let mut wrong_dim = json.clone();
        wrong_dim["training"]["dim"] = serde_json::json!(4);
        assert!(serde_json::from_value::<KNearestNeighbors>(wrong_dim).is_err());

        let mut zero_k = json.clone();
        zero_k["config"]["k_neighbors"] = serde_json::json!(0);
        assert!(serde_json::from_value::<KNearestNeighbors>(zero_k).is_err());

        let mut k_too_large = json;
        k_too_large["config"]["k_neighbors"] = serde_json::json!(7);
        assert!(serde_json::from_value::<KNearestNeighbors>(k_too_large).is_err());
    }
}

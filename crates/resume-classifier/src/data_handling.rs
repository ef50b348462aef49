//! Data structures for labeled résumés and the stratified train/test split.
//!
//! `Dataset` owns an ordered list of `Sample`s. `Dataset::stratified_split`
//! partitions it per label so that both partitions keep the class proportions
//! of the full set.
use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{ClassifierError, Result};

/// One labeled résumé.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub text: String,
    pub label: String,
}

impl Sample {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    samples: Vec<Sample>,
}

/// Train and test partitions of a [`Dataset`].
#[derive(Debug, Clone)]
pub struct Split {
    pub train: Dataset,
    pub test: Dataset,
}

impl Dataset {
    /// Build a dataset, rejecting samples with an empty text or label.
    pub fn new(samples: Vec<Sample>) -> Result<Self> {
        if let Some(pos) = samples
            .iter()
            .position(|s| s.text.trim().is_empty() || s.label.trim().is_empty())
        {
            return Err(ClassifierError::EmptyDataset {
                context: format!("sample {} has an empty text or label", pos),
            });
        }
        Ok(Self { samples })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn texts(&self) -> Vec<&str> {
        self.samples.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn labels(&self) -> Vec<String> {
        self.samples.iter().map(|s| s.label.clone()).collect()
    }

    /// Per-label sample counts, keyed in label order.
    pub fn label_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for s in &self.samples {
            *counts.entry(s.label.as_str()).or_insert(0) += 1;
        }
        counts
    }

    pub fn n_categories(&self) -> usize {
        self.label_counts().len()
    }

    /// Categories sorted by descending count, ties by name.
    pub fn top_categories(&self, n: usize) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = self
            .label_counts()
            .into_iter()
            .map(|(l, c)| (l.to_string(), c))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts.truncate(n);
        counts
    }

    pub fn log_input_data_summary(&self) {
        log::info!("----- Input Data Summary -----");
        log::info!(
            "{} resumes across {} categories",
            self.len(),
            self.n_categories()
        );
        for (label, count) in self.top_categories(10) {
            log::info!("  {:<30} {}", label, count);
        }
        log::info!("-------------------------------");
    }

    fn select(&self, indices: &[usize]) -> Dataset {
        Dataset {
            samples: indices.iter().map(|&i| self.samples[i].clone()).collect(),
        }
    }

    /// Partition into train/test with per-label stratification.
    ///
    /// The test partition holds `round(N * test_fraction)` samples overall.
    /// Each label first gets `floor(n * test_fraction)` of them (clamped to
    /// `1..=n-1`) and the rest go to the labels with the largest fractional
    /// remainder, ties in label order. Each
    /// label's test samples are drawn with a `StdRng` seeded from `seed`, and
    /// labels are visited in sorted order so the draw only depends on the
    /// seed and the input order. Both partitions keep the original dataset
    /// order.
    ///
    /// # Errors
    ///
    /// * `InvalidConfig` if `test_fraction` is not strictly between 0 and 1.
    /// * `EmptyDataset` if there is nothing to split.
    /// * `InsufficientSamples` if some label has fewer than two samples.
    pub fn stratified_split(&self, test_fraction: f32, seed: u64) -> Result<Split> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(ClassifierError::InvalidConfig(format!(
                "test_fraction must be strictly between 0 and 1, got {}",
                test_fraction
            )));
        }
        if self.is_empty() {
            return Err(ClassifierError::EmptyDataset {
                context: "dataset passed to the splitter".to_string(),
            });
        }

        let mut by_label: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, s) in self.samples.iter().enumerate() {
            by_label.entry(s.label.as_str()).or_default().push(i);
        }

        if let Some((label, indices)) = by_label.iter().find(|(_, idx)| idx.len() < 2) {
            return Err(ClassifierError::InsufficientSamples {
                label: label.to_string(),
                count: indices.len(),
                required: 2,
            });
        }

        let sizes: Vec<usize> = by_label.values().map(Vec::len).collect();
        let n_test = test_allocation(&sizes, test_fraction as f64);

        let mut rng = StdRng::seed_from_u64(seed);
        let mut is_test = vec![false; self.len()];

        for (indices, n_test) in by_label.values_mut().zip(n_test) {
            indices.shuffle(&mut rng);
            for &idx in indices.iter().take(n_test) {
                is_test[idx] = true;
            }
        }

        let (test_idx, train_idx): (Vec<usize>, Vec<usize>) =
            (0..self.len()).partition(|&i| is_test[i]);

        log::debug!(
            "Stratified split (seed={}): {} train / {} test",
            seed,
            train_idx.len(),
            test_idx.len()
        );

        Ok(Split {
            train: self.select(&train_idx),
            test: self.select(&test_idx),
        })
    }
}

/// Test-partition size for each group of a stratified split.
///
/// The total is `round(sum(sizes) * fraction)`. Every group first gets
/// `floor(n * fraction)` clamped to `1..=n-1`, then the remaining slots go one
/// each to the groups with the largest fractional remainder, earlier groups
/// first on ties. The per-group minimum of one wins over the total, so tiny
/// groups can push the test partition past the rounded target.
///
/// Every size must be at least 2.
fn test_allocation(sizes: &[usize], fraction: f64) -> Vec<usize> {
    let total: usize = sizes.iter().sum();
    let target = (total as f64 * fraction).round() as usize;

    let mut counts: Vec<usize> = sizes
        .iter()
        .map(|&n| ((n as f64 * fraction).floor() as usize).clamp(1, n - 1))
        .collect();

    let mut leftover = target.saturating_sub(counts.iter().sum());
    if leftover == 0 {
        return counts;
    }

    // (group, share still owed)
    let mut owed: Vec<(usize, f64)> = sizes
        .iter()
        .zip(&counts)
        .enumerate()
        .filter(|&(_, (&n, &c))| c < n - 1)
        .map(|(g, (&n, &c))| (g, n as f64 * fraction - c as f64))
        .filter(|&(_, r)| r > 0.0)
        .collect();
    owed.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    for (g, _) in owed {
        if leftover == 0 {
            break;
        }
        counts[g] += 1;
        leftover -= 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(counts: &[(&str, usize)]) -> Dataset {
        let mut samples = Vec::new();
        for (label, n) in counts {
            for i in 0..*n {
                samples.push(Sample::new(format!("{} resume {}", label, i), *label));
            }
        }
        Dataset::new(samples).unwrap()
    }

    #[test]
    fn split_is_stratified_per_label() {
        let ds = dataset(&[("A", 50), ("B", 30), ("C", 7)]);
        let split = ds.stratified_split(0.2, 42).unwrap();
        let test_counts = split.test.label_counts();
        assert_eq!(test_counts["A"], 10);
        assert_eq!(test_counts["B"], 6);
        assert_eq!(test_counts["C"], 1);
        assert_eq!(split.train.len() + split.test.len(), ds.len());
    }

    #[test]
    fn split_is_deterministic_for_seed() {
        let ds = dataset(&[("A", 20), ("B", 20)]);
        let a = ds.stratified_split(0.25, 7).unwrap();
        let b = ds.stratified_split(0.25, 7).unwrap();
        assert_eq!(a.test, b.test);
        assert_eq!(a.train, b.train);
    }

    #[test]
    fn singleton_label_is_rejected() {
        let ds = dataset(&[("A", 10), ("B", 1)]);
        match ds.stratified_split(0.2, 42) {
            Err(ClassifierError::InsufficientSamples { label, count, .. }) => {
                assert_eq!(label, "B");
                assert_eq!(count, 1);
            }
            other => panic!("expected InsufficientSamples, got {:?}", other),
        }
    }

    #[test]
    fn two_samples_land_one_on_each_side() {
        let ds = dataset(&[("A", 2), ("B", 2)]);
        let split = ds.stratified_split(0.2, 1).unwrap();
        assert_eq!(split.test.label_counts()["A"], 1);
        assert_eq!(split.train.label_counts()["A"], 1);
    }

    #[test]
    fn many_small_labels_keep_overall_fraction() {
        let counts: Vec<(String, usize)> = (0..10).map(|i| (format!("L{}", i), 8)).collect();
        let refs: Vec<(&str, usize)> = counts.iter().map(|(l, n)| (l.as_str(), *n)).collect();
        let ds = dataset(&refs);

        let split = ds.stratified_split(0.2, 42).unwrap();
        assert_eq!(split.test.len(), 16);
        for (label, got) in split.test.label_counts() {
            assert!(got == 1 || got == 2, "{}: {} in test", label, got);
        }
        // Ties on the remainder go to the first labels in sorted order.
        assert_eq!(split.test.label_counts()["L0"], 2);
        assert_eq!(split.test.label_counts()["L9"], 1);
    }

    #[test]
    fn allocation_follows_largest_remainder() {
        // Targets 16.8, 8.8, 14.0, 7.2 against a total of 47.
        assert_eq!(test_allocation(&[84, 44, 70, 36], 0.2), vec![17, 9, 14, 7]);
        // The minimum of one per group wins over the rounded total.
        assert_eq!(test_allocation(&[2, 2], 0.2), vec![1, 1]);
        // No group ever gives up its last training sample.
        assert_eq!(test_allocation(&[2, 3], 0.9), vec![1, 2]);
    }

    #[test]
    fn empty_text_rejected_by_constructor() {
        match Dataset::new(vec![Sample::new("fine", "A"), Sample::new("  ", "A")]) {
            Err(ClassifierError::EmptyDataset { context }) => assert!(context.contains("sample 1")),
            other => panic!("expected EmptyDataset, got {:?}", other),
        }
    }
}

//! Evaluation of predicted categories against held-out truth.
//!
//! Per-category precision, recall and F1 are computed one-vs-rest over the
//! sorted union of true and predicted labels. A ratio with a zero denominator
//! is reported as 0 rather than failing, so a category that is never
//! predicted simply scores 0 precision.
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, Result};

/// Headline numbers of a training run, persisted as `metrics.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub accuracy: f64,
    /// Support-weighted precision.
    pub precision: f64,
    /// Support-weighted recall.
    pub recall: f64,
    /// Support-weighted F1.
    pub f1_score: f64,
    pub train_samples: usize,
    pub test_samples: usize,
    pub vocabulary_size: usize,
    pub categories: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Averages {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

/// Full per-category breakdown of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: Averages,
    pub weighted_avg: Averages,
    /// `confusion[i][j]`: samples of `classes[i]` predicted as `classes[j]`.
    pub confusion: Vec<Vec<usize>>,
    pub total: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

fn check_aligned(y_true: &[String], y_pred: &[String]) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(ClassifierError::LengthMismatch {
            what: "true labels vs predictions",
            left: y_true.len(),
            right: y_pred.len(),
        });
    }
    if y_true.is_empty() {
        return Err(ClassifierError::EmptyDataset {
            context: "evaluation labels".to_string(),
        });
    }
    Ok(())
}

/// Fraction of positions where prediction equals truth.
pub fn accuracy(y_true: &[String], y_pred: &[String]) -> Result<f64> {
    check_aligned(y_true, y_pred)?;
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    Ok(ratio(correct, y_true.len()))
}

/// Build the per-category report for aligned truth and predictions.
pub fn classification_report(y_true: &[String], y_pred: &[String]) -> Result<ClassificationReport> {
    check_aligned(y_true, y_pred)?;

    let labels: Vec<&str> = y_true
        .iter()
        .chain(y_pred.iter())
        .map(String::as_str)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let position: HashMap<&str, usize> = labels.iter().enumerate().map(|(i, &l)| (l, i)).collect();

    let n = labels.len();
    let mut confusion = vec![vec![0usize; n]; n];
    for (t, p) in y_true.iter().zip(y_pred) {
        confusion[position[t.as_str()]][position[p.as_str()]] += 1;
    }

    let classes: Vec<ClassMetrics> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let tp = confusion[i][i];
            let support: usize = confusion[i].iter().sum();
            let predicted: usize = confusion.iter().map(|row| row[i]).sum();
            let precision = ratio(tp, predicted);
            let recall = ratio(tp, support);
            ClassMetrics {
                label: label.to_string(),
                precision,
                recall,
                f1_score: f1(precision, recall),
                support,
            }
        })
        .collect();

    let total = y_true.len();
    let correct: usize = (0..n).map(|i| confusion[i][i]).sum();

    let macro_avg = Averages {
        precision: classes.iter().map(|c| c.precision).sum::<f64>() / n as f64,
        recall: classes.iter().map(|c| c.recall).sum::<f64>() / n as f64,
        f1_score: classes.iter().map(|c| c.f1_score).sum::<f64>() / n as f64,
    };
    let weighted = |m: fn(&ClassMetrics) -> f64| {
        classes.iter().map(|c| m(c) * c.support as f64).sum::<f64>() / total as f64
    };
    let weighted_avg = Averages {
        precision: weighted(|c| c.precision),
        recall: weighted(|c| c.recall),
        f1_score: weighted(|c| c.f1_score),
    };

    Ok(ClassificationReport {
        classes,
        accuracy: ratio(correct, total),
        macro_avg,
        weighted_avg,
        confusion,
        total,
    })
}

impl ClassificationReport {
    pub fn labels(&self) -> Vec<&str> {
        self.classes.iter().map(|c| c.label.as_str()).collect()
    }

    /// Collapse into the persisted headline metrics.
    pub fn to_metrics(
        &self,
        train_samples: usize,
        vocabulary_size: usize,
        categories: usize,
    ) -> MetricsReport {
        MetricsReport {
            accuracy: self.accuracy,
            precision: self.weighted_avg.precision,
            recall: self.weighted_avg.recall,
            f1_score: self.weighted_avg.f1_score,
            train_samples,
            test_samples: self.total,
            vocabulary_size,
            categories,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.label.chars().count())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(0);

        writeln!(
            f,
            "{:>width$} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>width$} {:>10.4} {:>10.4} {:>10.4} {:>10}",
                c.label, c.precision, c.recall, c.f1_score, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>10} {:>10} {:>10.4} {:>10}",
            "accuracy", "", "", self.accuracy, self.total
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>width$} {:>10.4} {:>10.4} {:>10.4} {:>10}",
                name, avg.precision, avg.recall, avg.f1_score, self.total
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Accuracy:  {:.4}", self.accuracy)?;
        writeln!(f, "Precision: {:.4}", self.precision)?;
        writeln!(f, "Recall:    {:.4}", self.recall)?;
        writeln!(f, "F1 score:  {:.4}", self.f1_score)?;
        write!(
            f,
            "{} train / {} test samples, {} categories, {} features",
            self.train_samples, self.test_samples, self.categories, self.vocabulary_size
        )
    }
}

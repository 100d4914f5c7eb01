//! Holdout evaluation metrics
//!
//! ROC AUC uses the Mann-Whitney rank statistic with averaged ranks for tied
//! scores. Precision, recall and F1 are taken for the positive class and
//! fall back to 0 when their denominator is zero.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Evaluation record persisted after training, every value rounded to 3 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub roc_auc: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub logloss: f64,
}

impl MetricsRecord {
    /// Metric names and values in display order.
    pub fn entries(&self) -> [(&'static str, f64); 5] {
        [
            ("roc_auc", self.roc_auc),
            ("precision", self.precision),
            ("recall", self.recall),
            ("f1", self.f1),
            ("logloss", self.logloss),
        ]
    }
}

/// Confusion counts for the positive class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionCounts {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl ConfusionCounts {
    pub fn from_labels(y_true: &[u8], y_pred: &[u8]) -> Self {
        let mut counts = Self::default();
        for (&t, &p) in y_true.iter().zip(y_pred) {
            match (t, p) {
                (1, 1) => counts.true_positive += 1,
                (0, 1) => counts.false_positive += 1,
                (1, _) => counts.false_negative += 1,
                _ => counts.true_negative += 1,
            }
        }
        counts
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Round half away from zero to 3 decimals.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Compute the holdout metrics from labels, hard predictions and class-1 probabilities.
pub fn compute_metrics(y_true: &[u8], y_pred: &[u8], y_proba: &[f64]) -> Result<MetricsRecord> {
    if y_true.len() != y_pred.len() || y_true.len() != y_proba.len() {
        return Err(PipelineError::invalid(format!(
            "Metric inputs differ in length: {} labels, {} predictions, {} probabilities",
            y_true.len(),
            y_pred.len(),
            y_proba.len()
        )));
    }

    let counts = ConfusionCounts::from_labels(y_true, y_pred);
    let record = MetricsRecord {
        roc_auc: round3(roc_auc(y_true, y_proba)?),
        precision: round3(counts.precision()),
        recall: round3(counts.recall()),
        f1: round3(counts.f1()),
        logloss: round3(log_loss(y_true, y_proba)),
    };

    log::debug!("Holdout metrics: {:?} ({:?})", record, counts);
    Ok(record)
}

/// Area under the ROC curve via the Mann-Whitney U statistic.
///
/// Fails when `y_true` holds a single class, where the curve is undefined.
pub fn roc_auc(y_true: &[u8], scores: &[f64]) -> Result<f64> {
    let n_pos = y_true.iter().filter(|&&t| t == 1).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(PipelineError::invalid(
            "ROC AUC is undefined when the holdout contains a single class",
        ));
    }

    let mut pairs: Vec<(f64, u8)> = scores.iter().copied().zip(y_true.iter().copied()).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let n = pairs.len();
    let mut rank_sum_pos = 0.0;
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j < n && pairs[j].0 == pairs[i].0 {
            j += 1;
        }

        // Ranks i+1..=j share their average
        let avg_rank = (i + 1 + j) as f64 / 2.0;
        let positives_in_group = pairs[i..j].iter().filter(|(_, t)| *t == 1).count();
        rank_sum_pos += avg_rank * positives_in_group as f64;
        i = j;
    }

    let u = rank_sum_pos - (n_pos * (n_pos + 1)) as f64 / 2.0;
    Ok(u / (n_pos * n_neg) as f64)
}

/// Mean binary cross-entropy with probabilities clipped to `[eps, 1 - eps]`.
pub fn log_loss(y_true: &[u8], y_proba: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let eps = f64::EPSILON;
    let total: f64 = y_true
        .iter()
        .zip(y_proba)
        .map(|(&t, &p)| {
            let p = p.clamp(eps, 1.0 - eps);
            if t == 1 {
                -p.ln()
            } else {
                -(1.0 - p).ln()
            }
        })
        .sum();
    total / y_true.len() as f64
}

/// Fraction of matching labels.
pub fn accuracy(y_true: &[u8], y_pred: &[u8]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let hits = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    hits as f64 / y_true.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_ranking() {
        let auc = roc_auc(&[0, 0, 1, 1], &[0.1, 0.2, 0.8, 0.9]).unwrap();
        assert_eq!(auc, 1.0);
    }

    #[test]
    fn test_inverted_ranking() {
        let auc = roc_auc(&[1, 1, 0, 0], &[0.1, 0.2, 0.8, 0.9]).unwrap();
        assert_eq!(auc, 0.0);
    }

    #[test]
    fn test_ties_count_half() {
        // one positive tied with one negative, the other pair ordered correctly
        let auc = roc_auc(&[0, 1, 0, 1], &[0.5, 0.5, 0.1, 0.9]).unwrap();
        assert!((auc - 0.875).abs() < 1e-12);
    }

    #[test]
    fn test_single_class_auc_is_an_error() {
        assert!(roc_auc(&[1, 1, 1], &[0.2, 0.4, 0.6]).is_err());
    }

    #[test]
    fn test_undefined_precision_is_zero() {
        let counts = ConfusionCounts::from_labels(&[1, 0, 1], &[0, 0, 0]);
        assert_eq!(counts.precision(), 0.0);
        assert_eq!(counts.recall(), 0.0);
        assert_eq!(counts.f1(), 0.0);
    }

    #[test]
    fn test_precision_recall_f1() {
        let counts = ConfusionCounts::from_labels(&[1, 1, 1, 0, 0], &[1, 1, 0, 1, 0]);
        assert!((counts.precision() - 2.0 / 3.0).abs() < 1e-12);
        assert!((counts.recall() - 2.0 / 3.0).abs() < 1e-12);
        assert!((counts.f1() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_log_loss_clips_certain_mistakes() {
        let loss = log_loss(&[1, 0], &[0.0, 1.0]);
        assert!(loss.is_finite());
        assert!(loss > 30.0);
    }

    #[test]
    fn test_compute_metrics_rounds_to_three_decimals() {
        let y_true = [1, 1, 1, 0, 0];
        let y_pred = [1, 1, 0, 1, 0];
        let y_proba = [0.9, 0.8, 0.3, 0.6, 0.2];
        let record = compute_metrics(&y_true, &y_pred, &y_proba).unwrap();

        assert_eq!(record.precision, 0.667);
        assert_eq!(record.recall, 0.667);
        assert_eq!(record.f1, 0.667);
        assert_eq!(record.roc_auc, 0.833);
        for (_, value) in record.entries() {
            assert_eq!(round3(value), value);
        }
    }

    #[test]
    fn test_metrics_json_keys() {
        let record = MetricsRecord { roc_auc: 0.9, precision: 0.8, recall: 0.7, f1: 0.75, logloss: 0.4 };
        let json = serde_json::to_value(record).unwrap();
        for key in ["roc_auc", "precision", "recall", "f1", "logloss"] {
            assert!(json.get(key).is_some(), "missing key {}", key);
        }
    }

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[1, 0, 1, 0], &[1, 0, 0, 0]), 0.75);
    }
}

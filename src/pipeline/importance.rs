//! Permutation feature importance
//!
//! The importance of a feature is the mean drop in accuracy when that
//! feature's column is shuffled, averaged over `n_repeats` shuffles.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;

use super::metrics::accuracy;
use super::svm::SvmClassifier;
use crate::error::{PipelineError, Result};

/// Mean accuracy drop of one feature.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureImportance {
    pub feature: String,
    pub value: f64,
}

/// Importances ordered from most to least important.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportanceTable {
    entries: Vec<FeatureImportance>,
}

impl ImportanceTable {
    /// Build a table, sorting entries by descending importance.
    pub fn new(mut entries: Vec<FeatureImportance>) -> Self {
        entries.sort_by(|a, b| b.value.total_cmp(&a.value));
        Self { entries }
    }

    pub fn entries(&self) -> &[FeatureImportance] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top(&self, n: usize) -> &[FeatureImportance] {
        &self.entries[..n.min(self.entries.len())]
    }
}

/// Permutation importance of every column of `x` for a fitted classifier.
///
/// Each feature uses its own RNG seeded from `seed` and the feature index, so
/// results do not depend on the order the features are processed in.
pub fn permutation_importance(
    model: &SvmClassifier,
    x: &Array2<f64>,
    y: &[u8],
    feature_names: &[String],
    n_repeats: usize,
    seed: u64,
) -> Result<ImportanceTable> {
    if feature_names.len() != x.ncols() {
        return Err(PipelineError::FeatureMismatch {
            expected: feature_names.to_vec(),
            actual: (0..x.ncols()).map(|j| format!("column {}", j)).collect(),
        });
    }
    if n_repeats == 0 {
        return Err(PipelineError::invalid("n_repeats must be at least 1"));
    }

    let baseline = accuracy(y, &model.predict(x)?);
    log::debug!("Permutation importance baseline accuracy: {:.4}", baseline);

    let entries = feature_names
        .par_iter()
        .enumerate()
        .map(|(idx, name)| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(idx as u64));
            let mut permuted = x.clone();
            let mut order: Vec<usize> = (0..x.nrows()).collect();

            let mut total_drop = 0.0;
            for _ in 0..n_repeats {
                order.shuffle(&mut rng);
                for (row, &source) in order.iter().enumerate() {
                    permuted[[row, idx]] = x[[source, idx]];
                }
                let score = accuracy(y, &model.predict(&permuted)?);
                total_drop += baseline - score;
            }

            Ok(FeatureImportance {
                feature: name.clone(),
                value: total_drop / n_repeats as f64,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ImportanceTable::new(entries))
}

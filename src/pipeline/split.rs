//! Stratified train/test splitting with a fixed seed

use polars::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::target::class_counts;
use crate::error::{PipelineError, Result};

/// Row indices of the two partitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split rows so both partitions keep the class proportions of `labels`.
///
/// The test partition holds `ceil(test_size * n)` rows. Each class contributes
/// to the test partition in proportion to its size, with at least one row of
/// each class on both sides.
pub fn stratified_split(labels: &[u8], test_size: f64, seed: u64) -> Result<SplitIndices> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PipelineError::invalid(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }

    let n = labels.len();
    let (n_neg, n_pos) = class_counts(labels);
    if n_neg < 2 || n_pos < 2 {
        return Err(PipelineError::invalid(format!(
            "Stratified split needs at least 2 rows of each class, found {} negative and {} positive",
            n_neg, n_pos
        )));
    }

    let n_test = ((test_size * n as f64).ceil() as usize).clamp(2, n - 2);
    let test_pos = ((n_test as f64 * n_pos as f64 / n as f64).round() as usize).clamp(1, n_pos - 1);
    let test_neg = (n_test - test_pos.min(n_test)).clamp(1, n_neg - 1);

    let mut rng = StdRng::seed_from_u64(seed);

    let mut negatives: Vec<usize> = (0..n).filter(|&i| labels[i] == 0).collect();
    let mut positives: Vec<usize> = (0..n).filter(|&i| labels[i] == 1).collect();
    negatives.shuffle(&mut rng);
    positives.shuffle(&mut rng);

    let mut test: Vec<usize> = negatives[..test_neg]
        .iter()
        .chain(&positives[..test_pos])
        .copied()
        .collect();
    let mut train: Vec<usize> = negatives[test_neg..]
        .iter()
        .chain(&positives[test_pos..])
        .copied()
        .collect();
    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    log::debug!(
        "Stratified split (seed {}): {} train / {} test rows",
        seed,
        train.len(),
        test.len()
    );

    Ok(SplitIndices { train, test })
}

/// Gather rows of a frame by position.
pub fn take_rows(df: &DataFrame, rows: &[usize]) -> Result<DataFrame> {
    let idx: Vec<IdxSize> = rows.iter().map(|&i| i as IdxSize).collect();
    let idx = IdxCa::from_vec("idx".into(), idx);
    Ok(df.take(&idx)?)
}

/// Gather labels by position.
pub fn take_labels(labels: &[u8], rows: &[usize]) -> Vec<u8> {
    rows.iter().map(|&i| labels[i]).collect()
}

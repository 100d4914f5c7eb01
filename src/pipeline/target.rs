//! Target column validation and extraction
//!
//! The diagnosis target must be binary 0/1 once the value map has been
//! applied (a `"Yes"`/`"No"` target remapped to `1`/`0` is accepted).

use polars::prelude::*;

use crate::error::{PipelineError, Result};

/// Tolerance for floating point comparison when checking binary 0/1 values
const TOLERANCE: f64 = 1e-9;

/// Extract the target column as 0/1 labels.
///
/// Fails when the column is missing, empty, contains nulls, or holds any
/// value other than 0 and 1.
pub fn extract_binary_target(df: &DataFrame, target: &str) -> Result<Vec<u8>> {
    let target_col = df.column(target).map_err(|_| {
        PipelineError::invalid(format!("Target column '{}' not found in dataset", target))
    })?;

    if target_col.len() == 0 {
        return Err(PipelineError::invalid(format!("Target column '{}' is empty", target)));
    }

    if target_col.null_count() > 0 {
        return Err(PipelineError::invalid(format!(
            "Target column '{}' contains {} null value(s)",
            target,
            target_col.null_count()
        )));
    }

    if !target_col.dtype().is_primitive_numeric() && target_col.dtype() != &DataType::Boolean {
        return Err(PipelineError::invalid(format!(
            "Target column '{}' must be binary 0/1 after value mapping, found dtype {}",
            target,
            target_col.dtype()
        )));
    }

    let float_col = target_col.cast(&DataType::Float64)?;
    let labels = float_col
        .f64()?
        .into_no_null_iter()
        .map(|v| {
            if v.abs() < TOLERANCE {
                Ok(0u8)
            } else if (v - 1.0).abs() < TOLERANCE {
                Ok(1u8)
            } else {
                Err(PipelineError::invalid(format!(
                    "Target column '{}' must be binary (0/1), found value {}",
                    target, v
                )))
            }
        })
        .collect::<Result<Vec<u8>>>()?;

    Ok(labels)
}

/// Count (negatives, positives) in a label vector.
pub fn class_counts(labels: &[u8]) -> (usize, usize) {
    let positives = labels.iter().filter(|&&l| l == 1).count();
    (labels.len() - positives, positives)
}

//! Composite column transformer: one-hot encoding, z-score scaling, passthrough
//!
//! Once fitted the transformer fixes the output vocabulary and its order:
//! one-hot indicators (declared column order, sorted categories with the
//! first one dropped), then scaled columns, then passthrough columns.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::values::{column_to_keys, numeric_values};
use crate::error::{PipelineError, Result};

/// Scales below this are treated as zero variance and replaced by 1.0.
const MIN_SCALE: f64 = 10.0 * f64::EPSILON;

/// Fitted one-hot vocabulary of a single column.
///
/// `categories` holds every category seen at fit time, sorted; the first is
/// the dropped reference category and gets no indicator column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoding {
    pub column: String,
    pub categories: Vec<String>,
}

impl OneHotEncoding {
    fn fit(col: &Column) -> Result<Self> {
        let mut categories: Vec<String> = column_to_keys(col)?.into_iter().flatten().collect();
        categories.sort_by(|a, b| compare_categories(a, b));
        categories.dedup();

        if categories.is_empty() {
            return Err(PipelineError::invalid(format!(
                "One-hot column '{}' has no non-null values",
                col.name()
            )));
        }

        Ok(Self {
            column: col.name().to_string(),
            categories,
        })
    }

    /// Categories that receive an indicator column.
    pub fn encoded_categories(&self) -> &[String] {
        &self.categories[1..]
    }

    pub fn output_names(&self) -> Vec<String> {
        self.encoded_categories()
            .iter()
            .map(|c| format!("{}_{}", self.column, c))
            .collect()
    }

    fn encode(&self, col: &Column) -> Result<Vec<Column>> {
        let keys = column_to_keys(col)?;
        let columns = self
            .encoded_categories()
            .iter()
            .zip(self.output_names())
            .map(|(category, name)| {
                // Unseen categories and nulls fall through to the all-zero row
                let indicator: Vec<f64> = keys
                    .iter()
                    .map(|k| if k.as_deref() == Some(category.as_str()) { 1.0 } else { 0.0 })
                    .collect();
                Column::new(name.into(), indicator)
            })
            .collect();
        Ok(columns)
    }
}

/// Numeric categories sort by value, everything else lexicographically.
fn compare_categories(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Fitted z-score parameters of a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleParams {
    pub column: String,
    pub mean: f64,
    pub scale: f64,
}

impl ScaleParams {
    fn fit(col: &Column) -> Result<Self> {
        let values = numeric_values(col)?;
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        let mut scale = var.sqrt();

        if scale < MIN_SCALE {
            log::warn!("Column '{}' has zero variance; scaling by 1.0", col.name());
            scale = 1.0;
        }

        Ok(Self {
            column: col.name().to_string(),
            mean,
            scale,
        })
    }

    fn apply(&self, col: &Column) -> Result<Column> {
        let scaled: Vec<f64> = numeric_values(col)?
            .into_iter()
            .map(|v| (v - self.mean) / self.scale)
            .collect();
        Ok(Column::new(self.column.as_str().into(), scaled))
    }
}

/// Fitted column transformer state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTransformer {
    pub one_hot: Vec<OneHotEncoding>,
    pub scaled: Vec<ScaleParams>,
    pub passthrough: Vec<String>,
}

impl ColumnTransformer {
    /// Fit the transformer on `data` and transform it in one call.
    pub fn fit_transform(
        data: &DataFrame,
        one_hot_columns: &[String],
        scale_columns: &[String],
        passthrough_columns: &[String],
    ) -> Result<(DataFrame, ColumnTransformer)> {
        let transformer = Self::fit(data, one_hot_columns, scale_columns, passthrough_columns)?;
        let transformed = transformer.transform(data)?;
        Ok((transformed, transformer))
    }

    /// Fit encoding vocabularies and scaling statistics from `data` only.
    pub fn fit(
        data: &DataFrame,
        one_hot_columns: &[String],
        scale_columns: &[String],
        passthrough_columns: &[String],
    ) -> Result<Self> {
        if data.height() == 0 {
            return Err(PipelineError::invalid("Cannot fit a transformer on an empty frame"));
        }

        let declared: Vec<String> = one_hot_columns
            .iter()
            .chain(scale_columns)
            .chain(passthrough_columns)
            .cloned()
            .collect();
        require_columns(data, &declared)?;

        let one_hot = one_hot_columns
            .iter()
            .map(|name| OneHotEncoding::fit(data.column(name)?))
            .collect::<Result<Vec<_>>>()?;
        let scaled = scale_columns
            .iter()
            .map(|name| ScaleParams::fit(data.column(name)?))
            .collect::<Result<Vec<_>>>()?;

        let transformer = Self {
            one_hot,
            scaled,
            passthrough: passthrough_columns.to_vec(),
        };

        if transformer.feature_names_out().is_empty() {
            return Err(PipelineError::invalid(
                "Column transformer would produce no output columns",
            ));
        }

        log::debug!(
            "Fitted column transformer: {} one-hot, {} scaled, {} passthrough -> {} features",
            transformer.one_hot.len(),
            transformer.scaled.len(),
            transformer.passthrough.len(),
            transformer.feature_names_out().len()
        );

        Ok(transformer)
    }

    /// Apply the fitted encoding and scaling. Extra input columns are ignored.
    pub fn transform(&self, data: &DataFrame) -> Result<DataFrame> {
        require_columns(data, &self.input_columns())?;

        let mut columns: Vec<Column> = Vec::with_capacity(self.feature_names_out().len());
        for encoding in &self.one_hot {
            columns.extend(encoding.encode(data.column(&encoding.column)?)?);
        }
        for params in &self.scaled {
            columns.push(params.apply(data.column(&params.column)?)?);
        }
        for name in &self.passthrough {
            let values = numeric_values(data.column(name)?)?;
            columns.push(Column::new(name.as_str().into(), values));
        }

        Ok(DataFrame::new(columns)?)
    }

    /// Input columns in declaration order (one-hot, scaled, passthrough).
    pub fn input_columns(&self) -> Vec<String> {
        self.one_hot
            .iter()
            .map(|e| e.column.clone())
            .chain(self.scaled.iter().map(|s| s.column.clone()))
            .chain(self.passthrough.iter().cloned())
            .collect()
    }

    /// Output feature vocabulary, in output order.
    pub fn feature_names_out(&self) -> Vec<String> {
        self.one_hot
            .iter()
            .flat_map(|e| e.output_names())
            .chain(self.scaled.iter().map(|s| s.column.clone()))
            .chain(self.passthrough.iter().cloned())
            .collect()
    }
}

fn require_columns(data: &DataFrame, required: &[String]) -> Result<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|name| data.column(name).is_err())
        .cloned()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::SchemaMismatch {
            missing,
            unexpected: Vec::new(),
        })
    }
}

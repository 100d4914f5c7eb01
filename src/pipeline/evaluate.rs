//! Evaluation pipeline: persisted model + inference preprocessing -> predictions

use polars::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::artifacts::ArtifactStore;
use super::config::PipelineConfig;
use super::loader::{load_dataset, save_dataset};
use super::preprocess::test_preprocess;
use super::remap::{CanonicalValue, InputSource, ValueMap};
use super::schema::FeatureSchema;
use super::train::TrainedModel;
use crate::error::{PipelineError, Result};

/// Name of the prediction column appended on export.
pub const PREDICTION_COLUMN: &str = "predict";

/// Records to score: a file on disk or a frame already in memory.
#[derive(Debug, Clone)]
pub enum DatasetInput {
    Path(PathBuf),
    Frame(DataFrame),
}

impl DatasetInput {
    fn into_frame(self) -> Result<DataFrame> {
        match self {
            DatasetInput::Path(path) => load_dataset(&path),
            DatasetInput::Frame(df) => Ok(df),
        }
    }
}

impl From<DataFrame> for DatasetInput {
    fn from(df: DataFrame) -> Self {
        DatasetInput::Frame(df)
    }
}

impl From<&Path> for DatasetInput {
    fn from(path: &Path) -> Self {
        DatasetInput::Path(path.to_path_buf())
    }
}

/// Load the model first so a missing model is reported before anything else.
fn prepare(
    input: DatasetInput,
    source: InputSource,
    config: &PipelineConfig,
    store: &ArtifactStore,
) -> Result<(TrainedModel, DataFrame)> {
    let model: TrainedModel = store.load()?;
    let dataset = input.into_frame()?;
    let transformed = test_preprocess(&dataset, config, store, source)?;
    model.check_features(&transformed)?;
    Ok((model, transformed))
}

/// 0/1 predictions, one per input row, in input order.
pub fn predict(
    input: DatasetInput,
    source: InputSource,
    config: &PipelineConfig,
    store: &ArtifactStore,
) -> Result<Vec<u8>> {
    let (model, transformed) = prepare(input, source, config, store)?;
    let predictions = model.predict(&transformed)?;
    log::info!(
        "Predicted {} rows ({} positive)",
        predictions.len(),
        predictions.iter().filter(|&&p| p == 1).count()
    );
    Ok(predictions)
}

/// Positive-class probabilities, one per input row, in input order.
pub fn predict_proba(
    input: DatasetInput,
    source: InputSource,
    config: &PipelineConfig,
    store: &ArtifactStore,
) -> Result<Vec<f64>> {
    let (model, transformed) = prepare(input, source, config, store)?;
    model.predict_proba(&transformed)
}

/// Predictions and probabilities together, preprocessing the input once.
pub fn predict_with_proba(
    input: DatasetInput,
    source: InputSource,
    config: &PipelineConfig,
    store: &ArtifactStore,
) -> Result<(Vec<u8>, Vec<f64>)> {
    let (model, transformed) = prepare(input, source, config, store)?;
    model.predict_with_proba(&transformed)
}

/// Build a single canonical record from `name=value` pairs.
///
/// Every schema column must be given exactly once. Tokens found in the value
/// map are replaced by their canonical value; other tokens are parsed as
/// numbers when the column held only numbers at training time.
pub fn canonical_record(
    pairs: &[(String, String)],
    schema: &FeatureSchema,
    value_map: &ValueMap,
) -> Result<DataFrame> {
    let mut seen = HashSet::new();
    for (name, _) in pairs {
        if !seen.insert(name.as_str()) {
            return Err(PipelineError::invalid(format!(
                "Column '{}' was given more than once",
                name
            )));
        }
    }

    let missing: Vec<String> = schema
        .column_names()
        .into_iter()
        .filter(|name| !seen.contains(name.as_str()))
        .collect();
    let unexpected: Vec<String> = pairs
        .iter()
        .map(|(name, _)| name.clone())
        .filter(|name| schema.get(name).is_none())
        .collect();
    if !missing.is_empty() || !unexpected.is_empty() {
        return Err(PipelineError::SchemaMismatch { missing, unexpected });
    }

    let columns = schema
        .columns()
        .iter()
        .map(|column| {
            let raw = pairs
                .iter()
                .find(|(name, _)| name == &column.name)
                .map(|(_, value)| value.trim())
                .unwrap_or_default();
            let numeric = !column.values.is_empty()
                && column.values.iter().all(|v| v.is_number() || v.is_null());
            let value = canonicalize(raw, numeric, value_map).ok_or_else(|| {
                PipelineError::invalid(format!(
                    "Column '{}' expects a number, got '{}'",
                    column.name, raw
                ))
            })?;
            Ok(value_to_column(&column.name, value))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DataFrame::new(columns)?)
}

/// `None` when a numeric column receives text.
fn canonicalize(raw: &str, numeric: bool, value_map: &ValueMap) -> Option<CanonicalValue> {
    if let Some(mapped) = value_map.get(raw) {
        return Some(mapped.clone());
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Some(CanonicalValue::Int(n));
    }
    if let Ok(x) = raw.parse::<f64>() {
        return Some(CanonicalValue::Float(x));
    }
    (!numeric).then(|| CanonicalValue::Text(raw.to_string()))
}

fn value_to_column(name: &str, value: CanonicalValue) -> Column {
    match value {
        CanonicalValue::Int(n) => Column::new(name.into(), [n]),
        CanonicalValue::Float(x) => Column::new(name.into(), [x]),
        CanonicalValue::Text(s) => Column::new(name.into(), [s]),
    }
}

/// Append predictions to the input rows and write them as CSV or Parquet.
pub fn export_predictions(dataset: &DataFrame, predictions: &[u8], path: &Path) -> Result<()> {
    if dataset.height() != predictions.len() {
        return Err(PipelineError::invalid(format!(
            "{} predictions for {} rows",
            predictions.len(),
            dataset.height()
        )));
    }

    let mut out = dataset.clone();
    let values: Vec<i32> = predictions.iter().map(|&p| i32::from(p)).collect();
    out.with_column(Column::new(PREDICTION_COLUMN.into(), values))?;
    save_dataset(&mut out, path)
}

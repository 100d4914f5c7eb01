//! Schema registry: the training-time feature columns and their observed values
//!
//! The schema is recorded once per training run and read by the inference
//! path to reject drifted inputs and to put columns back in training order.

use polars::prelude::*;
use serde_json::{Map, Value};
use std::collections::HashSet;

use super::remap::{apply_value_map, ValueMap};
use super::values::distinct_values;
use crate::error::{PipelineError, Result};

/// A single retained feature and the distinct values seen during training.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaColumn {
    pub name: String,
    pub values: Vec<Value>,
}

/// Ordered feature schema. Column order is the contract the transformer relies on.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureSchema {
    columns: Vec<SchemaColumn>,
}

/// Summary of a schema column, used to guide manual record entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSummary {
    /// Every observed value is numeric
    Numeric { min: f64, max: f64 },
    /// Observed values, in first-appearance order
    Categorical { choices: Vec<String> },
}

impl FeatureSchema {
    pub fn new(columns: Vec<SchemaColumn>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[SchemaColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&SchemaColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Serialize as a JSON object keyed by column name, preserving column order.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .columns
            .iter()
            .map(|c| (c.name.clone(), Value::Array(c.values.clone())))
            .collect();
        Value::Object(map)
    }

    /// Parse the JSON object written by [`FeatureSchema::to_json`].
    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(PipelineError::invalid(
                "feature schema must be a JSON object keyed by column name",
            ));
        };

        let columns = map
            .into_iter()
            .map(|(name, values)| match values {
                Value::Array(values) => Ok(SchemaColumn { name, values }),
                _ => Err(PipelineError::invalid(format!(
                    "feature schema entry '{}' must be a list of values",
                    name
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { columns })
    }

    /// Numeric range or categorical choices for every column.
    pub fn summaries(&self) -> Vec<(String, ColumnSummary)> {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), summarize(&c.values)))
            .collect()
    }
}

fn summarize(values: &[Value]) -> ColumnSummary {
    let present: Vec<&Value> = values.iter().filter(|v| !v.is_null()).collect();
    let numbers: Vec<f64> = present.iter().filter_map(|v| v.as_f64()).collect();

    if !numbers.is_empty() && numbers.len() == present.len() {
        let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
        let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        return ColumnSummary::Numeric { min, max };
    }

    let choices = present
        .iter()
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();
    ColumnSummary::Categorical { choices }
}

/// Record the retained feature set and the distinct values of each feature.
///
/// Retained columns are every column except `drop_columns` and the target;
/// the value map is applied before values are collected.
pub fn record_schema(
    dataset: &DataFrame,
    drop_columns: &[String],
    value_map: &ValueMap,
    target_column: &str,
) -> Result<FeatureSchema> {
    let retained: Vec<String> = dataset
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .filter(|name| name != target_column && !drop_columns.contains(name))
        .collect();

    let frame = dataset.select(retained.iter().map(|s| s.as_str()))?;
    let frame = apply_value_map(&frame, value_map)?;

    let columns = frame
        .get_columns()
        .iter()
        .map(|col| {
            Ok(SchemaColumn {
                name: col.name().to_string(),
                values: distinct_values(col)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    log::info!("Recorded feature schema with {} column(s)", columns.len());
    Ok(FeatureSchema { columns })
}

/// Check the dataset carries exactly the schema's columns and reorder it to match.
pub fn validate_and_reorder(dataset: &DataFrame, schema: &FeatureSchema) -> Result<DataFrame> {
    let present: Vec<String> = dataset
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    let present_set: HashSet<&str> = present.iter().map(|s| s.as_str()).collect();
    let expected = schema.column_names();
    let expected_set: HashSet<&str> = expected.iter().map(|s| s.as_str()).collect();

    let missing: Vec<String> = expected
        .iter()
        .filter(|name| !present_set.contains(name.as_str()))
        .cloned()
        .collect();
    let unexpected: Vec<String> = present
        .iter()
        .filter(|name| !expected_set.contains(name.as_str()))
        .cloned()
        .collect();

    if !missing.is_empty() || !unexpected.is_empty() {
        return Err(PipelineError::SchemaMismatch { missing, unexpected });
    }

    Ok(dataset.select(expected.iter().map(|s| s.as_str()))?)
}

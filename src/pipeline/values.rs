//! Column value extraction shared by the schema registry and the transformer

use ndarray::Array2;
use polars::prelude::*;
use serde_json::Value;
use std::collections::HashSet;

use crate::error::{PipelineError, Result};

/// Render every value of a column as a canonical category key.
///
/// Integers and integral floats share a representation (`1` and `1.0` both
/// render as `"1"`), so a column that arrives as Int64 at training time and
/// Float64 at inference time still hits the same categories.
pub fn column_to_keys(col: &Column) -> Result<Vec<Option<String>>> {
    let values: Vec<Option<String>> = match col.dtype() {
        DataType::String => col
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect(),
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => {
            let cast = col.cast(&DataType::Int64)?;
            cast.i64()?
                .into_iter()
                .map(|v| v.map(|n| n.to_string()))
                .collect()
        }
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
            let cast = col.cast(&DataType::UInt64)?;
            cast.u64()?
                .into_iter()
                .map(|v| v.map(|n| n.to_string()))
                .collect()
        }
        // f32 keeps its own shortest representation: 0.2f32 is "0.2", not its f64 widening
        DataType::Float32 => col
            .f32()?
            .into_iter()
            .map(|v| v.map(|n| format!("{}", n)))
            .collect(),
        DataType::Float64 => col
            .f64()?
            .into_iter()
            .map(|v| v.map(|n| format!("{}", n)))
            .collect(),
        DataType::Boolean => col
            .bool()?
            .into_iter()
            .map(|v| v.map(|b| b.to_string()))
            .collect(),
        _ => {
            let cast = col.cast(&DataType::String)?;
            cast.str()?
                .into_iter()
                .map(|v| v.map(|s| s.to_string()))
                .collect()
        }
    };

    Ok(values)
}

/// Convert a column to JSON values, keeping numbers numeric.
fn column_to_json(col: &Column) -> Result<Vec<Value>> {
    let values: Vec<Value> = match col.dtype() {
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => {
            let cast = col.cast(&DataType::Int64)?;
            cast.i64()?
                .into_iter()
                .map(|v| v.map(Value::from).unwrap_or(Value::Null))
                .collect()
        }
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
            let cast = col.cast(&DataType::UInt64)?;
            cast.u64()?
                .into_iter()
                .map(|v| v.map(Value::from).unwrap_or(Value::Null))
                .collect()
        }
        DataType::Float32 => col
            .f32()?
            .into_iter()
            .map(|v| v.map(widen_f32).map(Value::from).unwrap_or(Value::Null))
            .collect(),
        DataType::Float64 => col
            .f64()?
            .into_iter()
            .map(|v| v.map(Value::from).unwrap_or(Value::Null))
            .collect(),
        DataType::Boolean => col
            .bool()?
            .into_iter()
            .map(|v| v.map(Value::from).unwrap_or(Value::Null))
            .collect(),
        _ => column_to_keys(col)?
            .into_iter()
            .map(|v| v.map(Value::from).unwrap_or(Value::Null))
            .collect(),
    };

    Ok(values)
}

/// The f64 nearest the f32's decimal form, so `0.2f32` becomes `0.2`.
fn widen_f32(n: f32) -> f64 {
    n.to_string().parse().unwrap_or(f64::from(n))
}

/// Distinct values of a column in first-appearance order.
pub fn distinct_values(col: &Column) -> Result<Vec<Value>> {
    let keys = column_to_keys(col)?;
    let json = column_to_json(col)?;

    let mut seen: HashSet<Option<String>> = HashSet::new();
    let mut distinct = Vec::new();
    for (key, value) in keys.into_iter().zip(json) {
        if seen.insert(key) {
            distinct.push(value);
        }
    }

    Ok(distinct)
}

/// Extract a numeric column as `f64` values, rejecting nulls and non-numeric dtypes.
pub fn numeric_values(col: &Column) -> Result<Vec<f64>> {
    let dtype = col.dtype();
    if !dtype.is_primitive_numeric() && dtype != &DataType::Boolean {
        return Err(PipelineError::invalid(format!(
            "Column '{}' must be numeric, found {}",
            col.name(),
            dtype
        )));
    }

    if col.null_count() > 0 {
        return Err(PipelineError::invalid(format!(
            "Column '{}' contains {} null value(s)",
            col.name(),
            col.null_count()
        )));
    }

    let cast = col.cast(&DataType::Float64)?;
    Ok(cast.f64()?.into_no_null_iter().collect())
}

/// Stack the columns of an all-numeric frame into a design matrix (rows are samples).
pub fn frame_to_matrix(df: &DataFrame) -> Result<Array2<f64>> {
    let columns = df
        .get_columns()
        .iter()
        .map(numeric_values)
        .collect::<Result<Vec<_>>>()?;
    Ok(Array2::from_shape_fn((df.height(), columns.len()), |(i, j)| {
        columns[j][i]
    }))
}

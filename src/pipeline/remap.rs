//! Value remapping from raw categorical tokens to canonical values
//!
//! Bulk files carry raw tokens such as `"Yes"`/`"No"`; the configured value
//! map rewrites them to canonical values (e.g. `1`/`0`) before the schema is
//! recorded and before the transformer sees the data.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;

/// Canonical replacement for a raw token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CanonicalValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl CanonicalValue {
    fn as_f64(&self) -> Option<f64> {
        match self {
            CanonicalValue::Int(v) => Some(*v as f64),
            CanonicalValue::Float(v) => Some(*v),
            CanonicalValue::Text(_) => None,
        }
    }
}

impl std::fmt::Display for CanonicalValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CanonicalValue::Int(v) => write!(f, "{}", v),
            CanonicalValue::Float(v) => write!(f, "{}", v),
            CanonicalValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Mapping raw token -> canonical value (`map_change_columns` in the config).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueMap(BTreeMap<String, CanonicalValue>);

impl ValueMap {
    pub fn new(entries: BTreeMap<String, CanonicalValue>) -> Self {
        Self(entries)
    }

    pub fn get(&self, token: &str) -> Option<&CanonicalValue> {
        self.0.get(token)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<(String, CanonicalValue)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (String, CanonicalValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Where an inference dataset comes from.
///
/// Manual single-record entry is canonicalized at the entry point, bulk files
/// arrive with raw tokens. The inference path only remaps `Raw` input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputSource {
    /// Raw tokens, e.g. an uploaded CSV
    #[default]
    Raw,
    /// Already canonical values, e.g. a manually entered record
    Canonical,
}

/// Apply the value map to every string column of the frame.
///
/// Columns where no token matched are left untouched. A remapped column
/// becomes Int64 when every value is an integer, Float64 when every value is
/// numeric, and stays String otherwise.
pub fn apply_value_map(df: &DataFrame, map: &ValueMap) -> Result<DataFrame> {
    let mut out = df.clone();
    if map.is_empty() {
        return Ok(out);
    }

    for column in df.get_columns() {
        if column.dtype() != &DataType::String {
            continue;
        }
        if let Some(remapped) = remap_column(column, map)? {
            log::debug!("Remapped tokens in column '{}'", column.name());
            out.with_column(remapped)?;
        }
    }

    Ok(out)
}

fn remap_column(column: &Column, map: &ValueMap) -> Result<Option<Column>> {
    let mut matched = false;
    let values: Vec<Option<CanonicalValue>> = column
        .str()?
        .into_iter()
        .map(|v| {
            v.map(|token| match map.get(token) {
                Some(canonical) => {
                    matched = true;
                    canonical.clone()
                }
                None => CanonicalValue::Text(token.to_string()),
            })
        })
        .collect();

    if !matched {
        return Ok(None);
    }

    let name = column.name().clone();
    let present = || values.iter().flatten();

    if present().all(|v| matches!(v, CanonicalValue::Int(_))) {
        let ints: Vec<Option<i64>> = values
            .iter()
            .map(|v| match v {
                Some(CanonicalValue::Int(n)) => Some(*n),
                _ => None,
            })
            .collect();
        return Ok(Some(Column::new(name, ints)));
    }

    if present().all(|v| v.as_f64().is_some()) {
        let floats: Vec<Option<f64>> = values
            .iter()
            .map(|v| v.as_ref().and_then(CanonicalValue::as_f64))
            .collect();
        return Ok(Some(Column::new(name, floats)));
    }

    let text: Vec<Option<String>> = values
        .iter()
        .map(|v| v.as_ref().map(|c| c.to_string()))
        .collect();
    Ok(Some(Column::new(name, text)))
}

//! Command-line argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Clinpred - train and serve a binary diagnosis classifier with consistent preprocessing
#[derive(Parser, Debug)]
#[command(name = "clinpred")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Pipeline configuration file (YAML)
    #[arg(short, long, global = true, default_value = "config/params.yaml")]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Preprocess the training dataset, fit the classifier and persist all artifacts
    Train {
        /// Training dataset (CSV or Parquet).
        /// Defaults to `preprocessing.raw_train_path` from the config.
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Skip the confirmation prompt before overwriting existing artifacts
        #[arg(long, default_value = "false")]
        no_confirm: bool,
    },

    /// Predict every record of a raw dataset file
    Predict {
        /// Records to score (CSV or Parquet), raw tokens such as "Yes"/"No" allowed
        #[arg(short, long)]
        input: PathBuf,

        /// Write the input rows plus a `predict` column (CSV or Parquet, by extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of predictions to print
        #[arg(long, default_value = "10", value_parser = validate_limit)]
        limit: usize,
    },

    /// Predict a single record entered as NAME=VALUE pairs
    PredictRecord {
        /// One feature value, e.g. `--value Age=74 --value Smoking=Yes`
        #[arg(short, long = "value", value_name = "NAME=VALUE", required = true, value_parser = parse_key_value)]
        values: Vec<(String, String)>,
    },

    /// Show the persisted holdout metrics and permutation importances
    Metrics {
        /// Number of importances to show
        #[arg(long, default_value = "10", value_parser = validate_limit)]
        top: usize,
    },

    /// Show the recorded feature schema (value ranges and categories)
    Schema,
}

/// Parse `NAME=VALUE`; the value may itself contain `=`.
fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing column name in '{}'", s));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Validate that a display limit is at least 1.
fn validate_limit(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if value == 0 {
        return Err("value must be at least 1".to_string());
    }
    Ok(value)
}

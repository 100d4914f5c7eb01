//! Shared test utilities and fixture generators

#![allow(dead_code)]

use clinpred::pipeline::PipelineConfig;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const TARGET: &str = "Diagnosis";

/// Create a 100-row patient dataset with a 70/30 class balance
///
/// This DataFrame includes:
/// - `PatientID`: identifier, dropped by the config
/// - `Age`: integer feature, scaled
/// - `Ethnicity`: three categories, one-hot encoded
/// - `Smoking`: raw "Yes"/"No" tokens, remapped to 1/0 and passed through
/// - `MMSE`: float feature carrying the signal (positives score low), scaled
/// - `DoctorInCharge`: constant text column, dropped by the config
/// - `Diagnosis`: binary target, 30 positives
pub fn create_patient_dataframe() -> DataFrame {
    let n = 100usize;
    let diagnosis: Vec<i64> = (0..n).map(|i| i64::from(i % 10 < 3)).collect();
    let patient_id: Vec<i64> = (0..n).map(|i| 4751 + i as i64).collect();
    let age: Vec<i64> = (0..n).map(|i| 60 + ((i * 7) % 30) as i64).collect();
    let ethnicity: Vec<&str> = (0..n)
        .map(|i| match i % 3 {
            0 => "Caucasian",
            1 => "Asian",
            _ => "Other",
        })
        .collect();
    let smoking: Vec<&str> = (0..n).map(|i| if i % 4 == 0 { "Yes" } else { "No" }).collect();
    let mmse: Vec<f64> = diagnosis
        .iter()
        .enumerate()
        .map(|(i, &d)| {
            if d == 1 {
                8.0 + (i % 7) as f64 * 0.9
            } else {
                19.0 + (i % 9) as f64 * 1.1
            }
        })
        .collect();
    let doctor: Vec<&str> = vec!["XXXConfid"; n];

    df! {
        "PatientID" => patient_id,
        "Age" => age,
        "Ethnicity" => ethnicity,
        "Smoking" => smoking,
        "MMSE" => mmse,
        "DoctorInCharge" => doctor,
        TARGET => diagnosis,
    }
    .unwrap()
}

/// The pipeline config YAML with every artifact under `dir/artifacts`
pub fn config_yaml(dir: &Path) -> String {
    let artifacts = dir.join("artifacts");
    format!(
        r#"preprocessing:
  drop_columns: [PatientID, DoctorInCharge]
  map_change_columns: {{"Yes": 1, "No": 0}}
  target_column: {target}
  test_size: 0.2
  random_state: 10
  one_hot_columns: [Ethnicity]
  scale_columns: [Age, MMSE]
  passthrough_columns: [Smoking]
  unique_values_path: {artifacts}/unique_values.json
train:
  col_transform_path: {artifacts}/col_transformer.bin
  model_path: {artifacts}/model.bin
  metrics_path: {artifacts}/metrics.json
  params_path: {params}
permutation_importances:
  permutation_importances_path: {artifacts}/permutation_importances.csv
  n_repeats: 3
"#,
        target = TARGET,
        artifacts = artifacts.display(),
        params = dir.join("best_params.json").display(),
    )
}

pub const BEST_PARAMS: &str =
    r#"{"C": 1.0, "kernel": "rbf", "gamma": "scale", "class_weight": "balanced", "random_state": 0}"#;

/// Write `params.yaml` and `best_params.json` into `dir`, returning the YAML path
pub fn write_config(dir: &Path) -> PathBuf {
    let config_path = dir.join("params.yaml");
    std::fs::write(&config_path, config_yaml(dir)).unwrap();
    std::fs::write(dir.join("best_params.json"), BEST_PARAMS).unwrap();
    config_path
}

/// Temp dir with config files written, plus the parsed config
pub fn setup_config() -> (TempDir, PipelineConfig) {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(temp_dir.path());
    let config = PipelineConfig::load(&path).unwrap();
    (temp_dir, config)
}

/// Write a DataFrame as CSV into `dir`
pub fn write_csv(df: &mut DataFrame, dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();
    path
}

/// Assert that a DataFrame has exactly the given columns, in order
pub fn assert_column_order(df: &DataFrame, expected: &[&str]) {
    let actual: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(actual, expected, "Unexpected column order");
}

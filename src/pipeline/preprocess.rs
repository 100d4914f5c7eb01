//! Train-time and inference-time preprocessing
//!
//! Training fits the transformer once on the training partition and applies
//! it to both partitions. Inference never fits: it reads the persisted schema
//! and transformer and reproduces the training feature space.

use polars::prelude::*;

use super::artifacts::ArtifactStore;
use super::config::PipelineConfig;
use super::remap::{apply_value_map, InputSource};
use super::schema::{record_schema, validate_and_reorder, FeatureSchema};
use super::split::{stratified_split, take_labels, take_rows};
use super::target::{class_counts, extract_binary_target};
use super::transformer::ColumnTransformer;
use crate::error::Result;

/// Transformed partitions produced by the training path.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: DataFrame,
    pub x_test: DataFrame,
    pub y_train: Vec<u8>,
    pub y_test: Vec<u8>,
}

impl TrainTestSplit {
    pub fn feature_names(&self) -> Vec<String> {
        self.x_train
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

/// Drop the configured columns that are present; absent ones are ignored.
fn drop_configured(dataset: &DataFrame, drop_columns: &[String]) -> Result<DataFrame> {
    let present: Vec<&str> = drop_columns
        .iter()
        .map(|s| s.as_str())
        .filter(|name| dataset.column(name).is_ok())
        .collect();
    Ok(dataset.drop_many(present))
}

/// Training path: schema, remap, split, fit the transformer, apply it to both partitions.
///
/// Persists the feature schema and the fitted transformer.
pub fn train_preprocess(
    dataset: &DataFrame,
    config: &PipelineConfig,
    store: &ArtifactStore,
) -> Result<TrainTestSplit> {
    let columns: Vec<String> = dataset
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    config.validate_against_columns(&columns)?;

    let schema = record_schema(
        dataset,
        &config.drop_columns,
        &config.map_change_columns,
        &config.target_column,
    )?;
    store.save(&schema)?;

    let data = drop_configured(dataset, &config.drop_columns)?;
    let data = apply_value_map(&data, &config.map_change_columns)?;

    let labels = extract_binary_target(&data, &config.target_column)?;
    let features = data.drop(&config.target_column)?;

    let split = stratified_split(&labels, config.test_size, config.random_state)?;
    let train_raw = take_rows(&features, &split.train)?;
    let test_raw = take_rows(&features, &split.test)?;
    let y_train = take_labels(&labels, &split.train);
    let y_test = take_labels(&labels, &split.test);

    let (x_train, transformer) = ColumnTransformer::fit_transform(
        &train_raw,
        &config.one_hot_columns,
        &config.scale_columns,
        &config.passthrough_columns,
    )?;
    store.save(&transformer)?;
    let x_test = transformer.transform(&test_raw)?;

    let (neg, pos) = class_counts(&labels);
    log::info!(
        "Preprocessed {} rows ({} negative / {} positive) into {} train and {} test rows with {} features",
        labels.len(),
        neg,
        pos,
        x_train.height(),
        x_test.height(),
        x_train.width()
    );

    Ok(TrainTestSplit {
        x_train,
        x_test,
        y_train,
        y_test,
    })
}

/// Inference path: drop, optionally remap, validate against the schema, transform.
///
/// `source` says whether the value map still has to be applied: bulk files
/// carry raw tokens, manually entered records are canonical already.
pub fn test_preprocess(
    dataset: &DataFrame,
    config: &PipelineConfig,
    store: &ArtifactStore,
    source: InputSource,
) -> Result<DataFrame> {
    let schema: FeatureSchema = store.load()?;
    let transformer: ColumnTransformer = store.load()?;

    let data = drop_configured(dataset, &config.drop_columns)?;
    let data = match source {
        InputSource::Raw => apply_value_map(&data, &config.map_change_columns)?,
        InputSource::Canonical => data,
    };

    let data = validate_and_reorder(&data, &schema)?;
    if data.height() == 0 {
        // Empty text columns would fail the numeric checks; the output shape is known
        let columns: Vec<Column> = transformer
            .feature_names_out()
            .into_iter()
            .map(|name| Column::new(name.into(), Vec::<f64>::new()))
            .collect();
        return Ok(DataFrame::new(columns)?);
    }
    let transformed = transformer.transform(&data)?;

    log::debug!(
        "Inference preprocessing: {} rows -> {} features",
        transformed.height(),
        transformed.width()
    );
    Ok(transformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use tempfile::TempDir;

    fn config_for(dir: &std::path::Path) -> PipelineConfig {
        let text = format!(
            r#"
preprocessing:
  drop_columns: [PatientID]
  map_change_columns: {{"Yes": 1, "No": 0}}
  target_column: Diagnosis
  test_size: 0.25
  random_state: 3
  one_hot_columns: [Ethnicity]
  scale_columns: [Age]
  passthrough_columns: [Smoking]
  unique_values_path: {d}/unique_values.json
train:
  col_transform_path: {d}/col_transformer.bin
  model_path: {d}/model.bin
  metrics_path: {d}/metrics.json
  params_path: {d}/params.json
permutation_importances:
  permutation_importances_path: {d}/importances.csv
  n_repeats: 2
"#,
            d = dir.display()
        );
        PipelineConfig::from_yaml_str(&text).unwrap()
    }

    fn dataset() -> DataFrame {
        let n = 16;
        df! {
            "PatientID" => (0..n).collect::<Vec<i64>>(),
            "Ethnicity" => (0..n).map(|i| ["A", "B", "C"][i as usize % 3]).collect::<Vec<_>>(),
            "Age" => (0..n).map(|i| 60.0 + i as f64).collect::<Vec<f64>>(),
            "Smoking" => (0..n).map(|i| if i % 2 == 0 { "Yes" } else { "No" }).collect::<Vec<_>>(),
            "Diagnosis" => (0..n).map(|i| if i % 4 == 0 { "Yes" } else { "No" }).collect::<Vec<_>>(),
        }
        .unwrap()
    }

    #[test]
    fn test_train_preprocess_shapes_and_artifacts() {
        let dir = TempDir::new().unwrap();
        let config = config_for(dir.path());
        let store = ArtifactStore::from_config(&config);

        let split = train_preprocess(&dataset(), &config, &store).unwrap();

        assert_eq!(split.x_test.height(), 4);
        assert_eq!(split.x_train.height(), 12);
        assert_eq!(split.y_test.iter().filter(|&&y| y == 1).count(), 1);
        assert_eq!(
            split.feature_names(),
            vec!["Ethnicity_B", "Ethnicity_C", "Age", "Smoking"]
        );
        assert!(config.unique_values_path.is_file());
        assert!(config.col_transform_path.is_file());
    }

    #[test]
    fn test_inference_columns_match_training() {
        let dir = TempDir::new().unwrap();
        let config = config_for(dir.path());
        let store = ArtifactStore::from_config(&config);
        let split = train_preprocess(&dataset(), &config, &store).unwrap();

        let raw = dataset().drop("Diagnosis").unwrap();
        let x = test_preprocess(&raw, &config, &store, InputSource::Raw).unwrap();
        assert_eq!(x.get_column_names(), split.x_train.get_column_names());
        assert_eq!(x.height(), 16);
    }

    #[test]
    fn test_empty_batch_keeps_feature_columns() {
        let dir = TempDir::new().unwrap();
        let config = config_for(dir.path());
        let store = ArtifactStore::from_config(&config);
        let split = train_preprocess(&dataset(), &config, &store).unwrap();

        let empty = dataset().drop("Diagnosis").unwrap().slice(0, 0);
        let x = test_preprocess(&empty, &config, &store, InputSource::Raw).unwrap();
        assert_eq!(x.height(), 0);
        assert_eq!(x.get_column_names(), split.x_train.get_column_names());
    }

    #[test]
    fn test_canonical_source_skips_remapping() {
        let dir = TempDir::new().unwrap();
        let config = config_for(dir.path());
        let store = ArtifactStore::from_config(&config);
        train_preprocess(&dataset(), &config, &store).unwrap();

        let canonical = df! {
            "Ethnicity" => ["B"],
            "Age" => [70.0f64],
            "Smoking" => [1i64],
        }
        .unwrap();
        let x = test_preprocess(&canonical, &config, &store, InputSource::Canonical).unwrap();
        assert_eq!(x.column("Smoking").unwrap().f64().unwrap().get(0), Some(1.0));

        // Raw tokens without remapping cannot pass the numeric passthrough column
        let raw = df! { "Ethnicity" => ["B"], "Age" => [70.0f64], "Smoking" => ["Yes"] }.unwrap();
        let result = test_preprocess(&raw, &config, &store, InputSource::Canonical);
        assert!(matches!(result, Err(PipelineError::InvalidData(_))));
    }

    #[test]
    fn test_inference_before_training_is_not_fitted() {
        let dir = TempDir::new().unwrap();
        let config = config_for(dir.path());
        let store = ArtifactStore::from_config(&config);
        let result = test_preprocess(&dataset(), &config, &store, InputSource::Raw);
        assert!(matches!(result, Err(PipelineError::NotFitted { .. })));
    }

    #[test]
    fn test_uncovered_column_fails_validation() {
        let dir = TempDir::new().unwrap();
        let config = config_for(dir.path());
        let store = ArtifactStore::from_config(&config);
        let mut data = dataset();
        data.with_column(Column::new("BMI".into(), vec![22.0f64; 16])).unwrap();

        let result = train_preprocess(&data, &config, &store);
        assert!(matches!(result, Err(PipelineError::ConfigValidation(_))));
        assert!(!config.unique_values_path.exists());
    }
}

//! Integration tests for training-time and inference-time preprocessing

use clinpred::pipeline::*;
use clinpred::PipelineError;
use polars::prelude::*;

#[path = "common/mod.rs"]
mod common;

use common::*;

#[test]
fn test_train_preprocess_split_sizes_and_stratification() {
    let (_temp_dir, config) = setup_config();
    let store = ArtifactStore::from_config(&config);
    let df = create_patient_dataframe();

    let split = train_preprocess(&df, &config, &store).unwrap();

    assert_eq!(split.x_train.height(), 80);
    assert_eq!(split.x_test.height(), 20);
    assert_eq!(split.y_train.len(), 80);
    assert_eq!(split.y_test.len(), 20);
    assert_eq!(split.y_test.iter().filter(|&&y| y == 1).count(), 6);
    assert_eq!(split.y_train.iter().filter(|&&y| y == 1).count(), 24);
}

#[test]
fn test_train_preprocess_feature_vocabulary() {
    let (_temp_dir, config) = setup_config();
    let store = ArtifactStore::from_config(&config);
    let df = create_patient_dataframe();

    let split = train_preprocess(&df, &config, &store).unwrap();

    let expected = [
        "Ethnicity_Caucasian",
        "Ethnicity_Other",
        "Age",
        "MMSE",
        "Smoking",
    ];
    assert_column_order(&split.x_train, &expected);
    assert_column_order(&split.x_test, &expected);
    assert_eq!(split.feature_names(), expected);
}

#[test]
fn test_train_preprocess_persists_schema_and_transformer() {
    let (_temp_dir, config) = setup_config();
    let store = ArtifactStore::from_config(&config);
    let df = create_patient_dataframe();

    train_preprocess(&df, &config, &store).unwrap();

    assert!(config.unique_values_path.exists());
    assert!(config.col_transform_path.exists());

    let schema: FeatureSchema = store.load().unwrap();
    assert_eq!(schema.column_names(), ["Age", "Ethnicity", "Smoking", "MMSE"]);

    // Smoking is recorded after the value map is applied
    let smoking = schema.get("Smoking").unwrap();
    assert!(smoking.values.iter().all(|v| v.is_i64()));
}

#[test]
fn test_train_preprocess_is_deterministic() {
    let (_temp_dir, config) = setup_config();
    let store = ArtifactStore::from_config(&config);
    let df = create_patient_dataframe();

    let first = train_preprocess(&df, &config, &store).unwrap();
    let second = train_preprocess(&df, &config, &store).unwrap();

    assert!(first.x_train.equals(&second.x_train));
    assert!(first.x_test.equals(&second.x_test));
    assert_eq!(first.y_test, second.y_test);
}

#[test]
fn test_inference_matches_training_transformation() {
    let (_temp_dir, config) = setup_config();
    let store = ArtifactStore::from_config(&config);
    let df = create_patient_dataframe();

    train_preprocess(&df, &config, &store).unwrap();

    let records = df.drop(TARGET).unwrap();
    let first = test_preprocess(&records, &config, &store, InputSource::Raw).unwrap();
    let second = test_preprocess(&records, &config, &store, InputSource::Raw).unwrap();

    assert_eq!(first.height(), 100);
    assert!(first.equals(&second));
    assert_column_order(
        &first,
        &["Ethnicity_Caucasian", "Ethnicity_Other", "Age", "MMSE", "Smoking"],
    );
}

#[test]
fn test_inference_accepts_shuffled_columns() {
    let (_temp_dir, config) = setup_config();
    let store = ArtifactStore::from_config(&config);
    let df = create_patient_dataframe();
    train_preprocess(&df, &config, &store).unwrap();

    let ordered = df.drop(TARGET).unwrap();
    let shuffled = ordered
        .select(["MMSE", "DoctorInCharge", "Smoking", "PatientID", "Ethnicity", "Age"])
        .unwrap();

    let a = test_preprocess(&ordered, &config, &store, InputSource::Raw).unwrap();
    let b = test_preprocess(&shuffled, &config, &store, InputSource::Raw).unwrap();
    assert!(a.equals(&b));
}

#[test]
fn test_inference_without_fitted_artifacts_fails() {
    let (_temp_dir, config) = setup_config();
    let store = ArtifactStore::from_config(&config);
    let records = create_patient_dataframe().drop(TARGET).unwrap();

    let result = test_preprocess(&records, &config, &store, InputSource::Raw);
    assert!(matches!(result, Err(PipelineError::NotFitted { .. })));
}

#[test]
fn test_inference_reports_schema_mismatch() {
    let (_temp_dir, config) = setup_config();
    let store = ArtifactStore::from_config(&config);
    let df = create_patient_dataframe();
    train_preprocess(&df, &config, &store).unwrap();

    let records = df.drop(TARGET).unwrap().drop("MMSE").unwrap();
    let mut records = records;
    records
        .with_column(Column::new("BMI".into(), vec![22.5f64; 100]))
        .unwrap();

    match test_preprocess(&records, &config, &store, InputSource::Raw) {
        Err(PipelineError::SchemaMismatch { missing, unexpected }) => {
            assert_eq!(missing, vec!["MMSE"]);
            assert_eq!(unexpected, vec!["BMI"]);
        }
        other => panic!("Expected SchemaMismatch, got {:?}", other),
    }
}

#[test]
fn test_canonical_source_skips_value_map() {
    let (_temp_dir, config) = setup_config();
    let store = ArtifactStore::from_config(&config);
    let df = create_patient_dataframe();
    train_preprocess(&df, &config, &store).unwrap();

    let raw = df.drop(TARGET).unwrap();
    let mapped = apply_value_map(&raw, &config.map_change_columns).unwrap();

    let from_raw = test_preprocess(&raw, &config, &store, InputSource::Raw).unwrap();
    let from_canonical =
        test_preprocess(&mapped, &config, &store, InputSource::Canonical).unwrap();
    assert!(from_raw.equals(&from_canonical));
}

#[test]
fn test_yes_no_target_is_remapped() {
    let (_temp_dir, config) = setup_config();
    let store = ArtifactStore::from_config(&config);
    let mut df = create_patient_dataframe();
    let tokens: Vec<&str> = df
        .column(TARGET)
        .unwrap()
        .i64()
        .unwrap()
        .into_no_null_iter()
        .map(|d| if d == 1 { "Yes" } else { "No" })
        .collect();
    df.with_column(Column::new(TARGET.into(), tokens)).unwrap();

    let split = train_preprocess(&df, &config, &store).unwrap();
    assert_eq!(
        split.y_train.iter().chain(&split.y_test).filter(|&&y| y == 1).count(),
        30
    );
}

#[test]
fn test_unassigned_column_is_a_config_error() {
    let (_temp_dir, config) = setup_config();
    let store = ArtifactStore::from_config(&config);
    let mut df = create_patient_dataframe();
    df.with_column(Column::new("BMI".into(), vec![22.5f64; 100]))
        .unwrap();

    let result = train_preprocess(&df, &config, &store);
    assert!(matches!(result, Err(PipelineError::ConfigValidation(_))));
}

//! Pipeline configuration
//!
//! The YAML document has three sections:
//!
//! ```yaml
//! preprocessing:
//!   drop_columns: [PatientID, DoctorInCharge]
//!   map_change_columns: {"Yes": 1, "No": 0}
//!   target_column: Diagnosis
//!   test_size: 0.2
//!   random_state: 10
//!   one_hot_columns: [Ethnicity]
//!   scale_columns: [Age, MMSE]
//!   passthrough_columns: [Smoking]
//!   unique_values_path: artifacts/unique_values.json
//!   raw_train_path: data/train.csv        # optional
//! train:
//!   col_transform_path: artifacts/col_transformer.bin
//!   model_path: artifacts/model.bin
//!   metrics_path: artifacts/metrics.json
//!   params_path: config/best_params.json
//! permutation_importances:
//!   permutation_importances_path: artifacts/permutation_importances.csv
//!   n_repeats: 10
//!   random_state: 10                      # optional, defaults to the split seed
//! ```
//!
//! Every section is parsed leniently and then validated in one pass so that a
//! single [`PipelineError::ConfigValidation`] reports all problems at once.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::remap::ValueMap;
use crate::error::{PipelineError, Result};

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    preprocessing: Option<RawPreprocessing>,
    train: Option<RawTrain>,
    permutation_importances: Option<RawImportances>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPreprocessing {
    drop_columns: Option<Vec<String>>,
    map_change_columns: Option<ValueMap>,
    target_column: Option<String>,
    test_size: Option<f64>,
    random_state: Option<u64>,
    one_hot_columns: Option<Vec<String>>,
    scale_columns: Option<Vec<String>>,
    passthrough_columns: Option<Vec<String>>,
    unique_values_path: Option<PathBuf>,
    raw_train_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTrain {
    col_transform_path: Option<PathBuf>,
    model_path: Option<PathBuf>,
    metrics_path: Option<PathBuf>,
    params_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct RawImportances {
    permutation_importances_path: Option<PathBuf>,
    n_repeats: Option<usize>,
    random_state: Option<u64>,
}

/// Validated pipeline configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub drop_columns: Vec<String>,
    pub map_change_columns: ValueMap,
    pub target_column: String,
    pub test_size: f64,
    pub random_state: u64,
    pub one_hot_columns: Vec<String>,
    pub scale_columns: Vec<String>,
    pub passthrough_columns: Vec<String>,
    pub unique_values_path: PathBuf,
    pub raw_train_path: Option<PathBuf>,
    pub col_transform_path: PathBuf,
    pub model_path: PathBuf,
    pub metrics_path: PathBuf,
    pub params_path: PathBuf,
    pub permutation_importances_path: PathBuf,
    pub n_repeats: usize,
    pub importance_random_state: u64,
}

/// Collects missing keys while a section is unpacked.
struct Required<'a> {
    section: &'static str,
    problems: &'a mut Vec<String>,
}

impl Required<'_> {
    fn take<T>(&mut self, key: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.problems
                .push(format!("missing key `{}.{}`", self.section, key));
        }
        value
    }
}

impl PipelineConfig {
    /// Load and validate the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::ConfigValidation(vec![format!(
                "cannot read config {}: {}",
                path.display(),
                e
            )])
        })?;
        let config = Self::from_yaml_str(&text)?;
        log::info!("Loaded pipeline config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let raw: RawConfig = serde_yaml::from_str(text).map_err(|e| {
            PipelineError::ConfigValidation(vec![format!("malformed YAML: {}", e)])
        })?;

        let mut problems = Vec::new();

        if raw.preprocessing.is_none() {
            problems.push("missing section `preprocessing`".to_string());
        }
        if raw.train.is_none() {
            problems.push("missing section `train`".to_string());
        }
        if raw.permutation_importances.is_none() {
            problems.push("missing section `permutation_importances`".to_string());
        }

        let pre = raw.preprocessing.unwrap_or_default();
        let train = raw.train.unwrap_or_default();
        let imp = raw.permutation_importances.unwrap_or_default();

        let mut req = Required {
            section: "preprocessing",
            problems: &mut problems,
        };
        let drop_columns = req.take("drop_columns", pre.drop_columns);
        let map_change_columns = req.take("map_change_columns", pre.map_change_columns);
        let target_column = req.take("target_column", pre.target_column);
        let test_size = req.take("test_size", pre.test_size);
        let random_state = req.take("random_state", pre.random_state);
        let one_hot_columns = req.take("one_hot_columns", pre.one_hot_columns);
        let scale_columns = req.take("scale_columns", pre.scale_columns);
        let passthrough_columns = req.take("passthrough_columns", pre.passthrough_columns);
        let unique_values_path = req.take("unique_values_path", pre.unique_values_path);

        let mut req = Required {
            section: "train",
            problems: &mut problems,
        };
        let col_transform_path = req.take("col_transform_path", train.col_transform_path);
        let model_path = req.take("model_path", train.model_path);
        let metrics_path = req.take("metrics_path", train.metrics_path);
        let params_path = req.take("params_path", train.params_path);

        let mut req = Required {
            section: "permutation_importances",
            problems: &mut problems,
        };
        let permutation_importances_path =
            req.take("permutation_importances_path", imp.permutation_importances_path);
        let n_repeats = req.take("n_repeats", imp.n_repeats);

        if let Some(t) = test_size {
            if !(t > 0.0 && t < 1.0) {
                problems.push(format!("`preprocessing.test_size` must be in (0, 1), got {}", t));
            }
        }
        if n_repeats == Some(0) {
            problems.push("`permutation_importances.n_repeats` must be at least 1".to_string());
        }
        if let (Some(one_hot), Some(scale), Some(pass)) =
            (&one_hot_columns, &scale_columns, &passthrough_columns)
        {
            check_groups(one_hot, scale, pass, target_column.as_deref(), drop_columns.as_deref(), &mut problems);
        }

        match (
            drop_columns,
            map_change_columns,
            target_column,
            test_size,
            random_state,
            one_hot_columns,
            scale_columns,
            passthrough_columns,
            unique_values_path,
            col_transform_path,
            model_path,
            metrics_path,
            params_path,
            permutation_importances_path,
            n_repeats,
        ) {
            (
                Some(drop_columns),
                Some(map_change_columns),
                Some(target_column),
                Some(test_size),
                Some(random_state),
                Some(one_hot_columns),
                Some(scale_columns),
                Some(passthrough_columns),
                Some(unique_values_path),
                Some(col_transform_path),
                Some(model_path),
                Some(metrics_path),
                Some(params_path),
                Some(permutation_importances_path),
                Some(n_repeats),
            ) if problems.is_empty() => Ok(Self {
                drop_columns,
                map_change_columns,
                target_column,
                test_size,
                random_state,
                one_hot_columns,
                scale_columns,
                passthrough_columns,
                unique_values_path,
                raw_train_path: pre.raw_train_path,
                col_transform_path,
                model_path,
                metrics_path,
                params_path,
                permutation_importances_path,
                n_repeats,
                importance_random_state: imp.random_state.unwrap_or(random_state),
            }),
            _ => Err(PipelineError::ConfigValidation(problems)),
        }
    }

    /// Every feature column the transformer consumes, in group order.
    pub fn feature_columns(&self) -> Vec<String> {
        self.one_hot_columns
            .iter()
            .chain(&self.scale_columns)
            .chain(&self.passthrough_columns)
            .cloned()
            .collect()
    }

    /// Check that the retained columns of a dataset are exactly the configured groups.
    pub fn validate_against_columns(&self, columns: &[String]) -> Result<()> {
        let retained: HashSet<&str> = columns
            .iter()
            .map(|s| s.as_str())
            .filter(|name| *name != self.target_column && !self.drop_columns.iter().any(|d| d == name))
            .collect();
        let declared = self.feature_columns();
        let declared_set: HashSet<&str> = declared.iter().map(|s| s.as_str()).collect();

        let mut problems = Vec::new();
        if !columns.iter().any(|c| c == &self.target_column) {
            problems.push(format!(
                "target column `{}` is not in the dataset",
                self.target_column
            ));
        }

        let mut uncovered: Vec<&str> = retained.difference(&declared_set).copied().collect();
        uncovered.sort_unstable();
        if !uncovered.is_empty() {
            problems.push(format!(
                "dataset columns not assigned to any column group: {}",
                uncovered.join(", ")
            ));
        }

        let mut absent: Vec<&str> = declared_set.difference(&retained).copied().collect();
        absent.sort_unstable();
        if !absent.is_empty() {
            problems.push(format!(
                "configured feature columns missing from the dataset: {}",
                absent.join(", ")
            ));
        }

        let ignored: Vec<&String> = self
            .drop_columns
            .iter()
            .filter(|d| !columns.contains(d))
            .collect();
        if !ignored.is_empty() {
            log::warn!("Drop columns not present in the dataset are ignored: {:?}", ignored);
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::ConfigValidation(problems))
        }
    }
}

fn check_groups(
    one_hot: &[String],
    scale: &[String],
    passthrough: &[String],
    target: Option<&str>,
    drop: Option<&[String]>,
    problems: &mut Vec<String>,
) {
    if one_hot.is_empty() && scale.is_empty() && passthrough.is_empty() {
        problems.push("at least one feature column must be configured".to_string());
    }

    let mut seen = HashSet::new();
    let mut duplicated = Vec::new();
    for name in one_hot.iter().chain(scale).chain(passthrough) {
        if !seen.insert(name.as_str()) {
            duplicated.push(name.as_str());
        }
        if Some(name.as_str()) == target {
            problems.push(format!("target column `{}` cannot also be a feature", name));
        }
        if drop.is_some_and(|d| d.contains(name)) {
            problems.push(format!("column `{}` is both dropped and used as a feature", name));
        }
    }
    if !duplicated.is_empty() {
        problems.push(format!(
            "columns assigned to more than one group: {}",
            duplicated.join(", ")
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
preprocessing:
  drop_columns: [PatientID]
  map_change_columns: {"Yes": 1, "No": 0}
  target_column: Diagnosis
  test_size: 0.2
  random_state: 10
  one_hot_columns: []
  scale_columns: [Age, MMSE]
  passthrough_columns: [Smoking]
  unique_values_path: artifacts/unique_values.json
train:
  col_transform_path: artifacts/col_transformer.bin
  model_path: artifacts/model.bin
  metrics_path: artifacts/metrics.json
  params_path: config/best_params.json
permutation_importances:
  permutation_importances_path: artifacts/permutation_importances.csv
  n_repeats: 5
"#;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_valid_config() {
        let config = PipelineConfig::from_yaml_str(VALID).unwrap();
        assert_eq!(config.target_column, "Diagnosis");
        assert_eq!(config.test_size, 0.2);
        assert_eq!(config.n_repeats, 5);
        assert_eq!(config.importance_random_state, 10);
        assert_eq!(config.raw_train_path, None);
        assert_eq!(config.map_change_columns.len(), 2);
        assert_eq!(config.feature_columns(), names(&["Age", "MMSE", "Smoking"]));
        assert_eq!(config.model_path, PathBuf::from("artifacts/model.bin"));
    }

    #[test]
    fn test_missing_keys_are_all_reported() {
        let text = VALID
            .replace("  target_column: Diagnosis\n", "")
            .replace("  n_repeats: 5\n", "");
        match PipelineConfig::from_yaml_str(&text) {
            Err(PipelineError::ConfigValidation(problems)) => {
                assert!(problems.iter().any(|p| p.contains("preprocessing.target_column")));
                assert!(problems.iter().any(|p| p.contains("permutation_importances.n_repeats")));
            }
            other => panic!("Expected ConfigValidation, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_section() {
        let text = VALID.split("train:").next().unwrap().to_string();
        let err = PipelineConfig::from_yaml_str(&text).unwrap_err();
        assert!(err.to_string().contains("missing section `train`"));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = PipelineConfig::from_yaml_str("preprocessing: [unclosed").unwrap_err();
        assert!(matches!(err, PipelineError::ConfigValidation(_)));
    }

    #[test]
    fn test_out_of_range_values() {
        let text = VALID.replace("test_size: 0.2", "test_size: 1.5").replace("n_repeats: 5", "n_repeats: 0");
        match PipelineConfig::from_yaml_str(&text) {
            Err(PipelineError::ConfigValidation(problems)) => assert_eq!(problems.len(), 2),
            other => panic!("Expected ConfigValidation, got {:?}", other),
        }
    }

    #[test]
    fn test_overlapping_groups_are_rejected() {
        let text = VALID.replace("passthrough_columns: [Smoking]", "passthrough_columns: [Smoking, Age]");
        let err = PipelineConfig::from_yaml_str(&text).unwrap_err();
        assert!(err.to_string().contains("more than one group"));
    }

    #[test]
    fn test_importance_seed_override() {
        let text = VALID.replace("  n_repeats: 5\n", "  n_repeats: 5\n  random_state: 99\n");
        let config = PipelineConfig::from_yaml_str(&text).unwrap();
        assert_eq!(config.random_state, 10);
        assert_eq!(config.importance_random_state, 99);
    }

    #[test]
    fn test_validate_against_columns() {
        let config = PipelineConfig::from_yaml_str(VALID).unwrap();

        let ok = names(&["PatientID", "Age", "Smoking", "MMSE", "Diagnosis"]);
        assert!(config.validate_against_columns(&ok).is_ok());

        // drop columns absent from the dataset are ignored
        let no_id = names(&["Age", "Smoking", "MMSE", "Diagnosis"]);
        assert!(config.validate_against_columns(&no_id).is_ok());

        let extra = names(&["Age", "Smoking", "MMSE", "BMI", "Diagnosis"]);
        let err = config.validate_against_columns(&extra).unwrap_err();
        assert!(err.to_string().contains("BMI"));

        let missing = names(&["Age", "Smoking", "Diagnosis"]);
        let err = config.validate_against_columns(&missing).unwrap_err();
        assert!(err.to_string().contains("MMSE"));
    }
}

//! Training pipeline: fit the classifier, score the holdout, persist artifacts

use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::artifacts::ArtifactStore;
use super::config::PipelineConfig;
use super::importance::{permutation_importance, ImportanceTable};
use super::metrics::{compute_metrics, MetricsRecord};
use super::preprocess::{train_preprocess, TrainTestSplit};
use super::svm::{label_probabilities, SvmClassifier, SvmParams};
use super::values::frame_to_matrix;
use crate::error::{PipelineError, Result};

/// Persisted classifier together with the feature vocabulary it was trained on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    feature_names: Vec<String>,
    classifier: SvmClassifier,
}

impl TrainedModel {
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn classifier(&self) -> &SvmClassifier {
        &self.classifier
    }

    /// Check a transformed frame carries exactly this model's features, in order.
    pub fn check_features(&self, frame: &DataFrame) -> Result<()> {
        let actual: Vec<String> = frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        if actual != self.feature_names {
            return Err(PipelineError::FeatureMismatch {
                expected: self.feature_names.clone(),
                actual,
            });
        }
        Ok(())
    }

    fn matrix(&self, frame: &DataFrame) -> Result<Array2<f64>> {
        self.check_features(frame)?;
        frame_to_matrix(frame)
    }

    /// Hard 0/1 predictions for a transformed frame.
    pub fn predict(&self, frame: &DataFrame) -> Result<Vec<u8>> {
        self.classifier.predict(&self.matrix(frame)?)
    }

    /// Positive-class probabilities for a transformed frame.
    pub fn predict_proba(&self, frame: &DataFrame) -> Result<Vec<f64>> {
        self.classifier.predict_proba(&self.matrix(frame)?)
    }

    /// Labels and probabilities from a single pass over the frame.
    pub fn predict_with_proba(&self, frame: &DataFrame) -> Result<(Vec<u8>, Vec<f64>)> {
        let proba = self.predict_proba(frame)?;
        Ok((label_probabilities(&proba), proba))
    }
}

/// Everything a full training run produced, for reporting.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: TrainedModel,
    pub metrics: MetricsRecord,
    pub importances: ImportanceTable,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Read the tuned hyperparameter document named by the config.
pub fn load_hyperparameters(config: &PipelineConfig) -> Result<SvmParams> {
    let params = SvmParams::from_json_file(&config.params_path)?;
    log::debug!("Hyperparameters from {}: {:?}", config.params_path.display(), params);
    Ok(params)
}

/// Fit on the training partition, then persist metrics, importances and the model.
pub fn train_model(
    split: &TrainTestSplit,
    hyperparameters: &SvmParams,
    config: &PipelineConfig,
    store: &ArtifactStore,
) -> Result<TrainedModel> {
    Ok(fit_and_evaluate(split, hyperparameters, config, store)?.0)
}

fn fit_and_evaluate(
    split: &TrainTestSplit,
    hyperparameters: &SvmParams,
    config: &PipelineConfig,
    store: &ArtifactStore,
) -> Result<(TrainedModel, MetricsRecord, ImportanceTable)> {
    let feature_names = split.feature_names();
    let x_train = frame_to_matrix(&split.x_train)?;
    let classifier = SvmClassifier::fit(&x_train, &split.y_train, hyperparameters)?;
    let model = TrainedModel {
        feature_names,
        classifier,
    };

    let x_test = model.matrix(&split.x_test)?;
    let y_proba = model.classifier.predict_proba(&x_test)?;
    let y_pred = label_probabilities(&y_proba);
    let metrics = compute_metrics(&split.y_test, &y_pred, &y_proba)?;
    store.save(&metrics)?;
    log::info!(
        "Holdout metrics: roc_auc={} precision={} recall={} f1={} logloss={}",
        metrics.roc_auc,
        metrics.precision,
        metrics.recall,
        metrics.f1,
        metrics.logloss
    );

    let importances = permutation_importance(
        &model.classifier,
        &x_test,
        &split.y_test,
        &model.feature_names,
        config.n_repeats,
        config.importance_random_state,
    )?;
    store.save(&importances)?;

    store.save(&model)?;
    log::info!("Saved model with {} features", model.feature_names.len());

    Ok((model, metrics, importances))
}

/// Full cycle: preprocess the raw dataset, read hyperparameters, train.
pub fn run_training(
    dataset: &DataFrame,
    config: &PipelineConfig,
    store: &ArtifactStore,
) -> Result<TrainingOutcome> {
    let params = load_hyperparameters(config)?;
    let split = train_preprocess(dataset, config, store)?;
    let (model, metrics, importances) = fit_and_evaluate(&split, &params, config, store)?;

    Ok(TrainingOutcome {
        model,
        metrics,
        importances,
        train_rows: split.x_train.height(),
        test_rows: split.x_test.height(),
    })
}

//! Error taxonomy for the preprocessing, training and evaluation pipeline.
//!
//! Every failure is surfaced synchronously to the caller; nothing in the
//! library retries or rolls back.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors raised by the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Inference data's column set differs from the training-time schema.
    #[error(
        "Schema mismatch: missing columns {missing:?}, unexpected columns {unexpected:?}"
    )]
    SchemaMismatch {
        /// Columns known at training time but absent from the input
        missing: Vec<String>,
        /// Columns present in the input but unknown at training time
        unexpected: Vec<String>,
    },

    /// A transform or prediction was requested before any fit happened.
    #[error("{what} has not been fitted yet (expected artifact at {path}). Run training first.")]
    NotFitted { what: &'static str, path: PathBuf },

    /// Evaluation requested with no persisted model.
    #[error("No trained model found at {0}. Train a model before requesting predictions.")]
    ModelNotFound(PathBuf),

    /// Missing or malformed configuration keys.
    #[error("Invalid configuration: {}", .0.join("; "))]
    ConfigValidation(Vec<String>),

    /// A model was paired with a transformer producing a different feature vocabulary.
    #[error(
        "Model expects features {expected:?} but the transformer produced {actual:?}. Retrain to resynchronise artifacts."
    )]
    FeatureMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    /// Input data cannot be processed (non-binary target, non-numeric scaled column, ...).
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A report artifact (metrics, importances) was requested but never written.
    #[error("{kind} artifact not found at {path}")]
    ArtifactNotFound { kind: &'static str, path: PathBuf },

    #[error("SVM training failed: {0}")]
    Svm(#[from] linfa_svm::SvmError),

    #[error(transparent)]
    Polars(#[from] polars::prelude::PolarsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to encode artifact: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Failed to decode artifact: {0}")]
    Decode(#[from] bincode::error::DecodeError),
}

impl PipelineError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        PipelineError::InvalidData(message.into())
    }
}

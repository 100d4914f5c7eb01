//! clinpred: clinical diagnosis preprocessing, training and inference
//!
//! Keeps train-time and inference-time feature transformations consistent:
//! the feature schema, the fitted column transformer and the SVM classifier
//! are persisted by a training run and reused unchanged at prediction time.

pub mod cli;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod utils;

pub use error::{PipelineError, Result};

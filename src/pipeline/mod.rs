//! Pipeline module - preprocessing, training and evaluation stages

pub mod artifacts;
pub mod config;
pub mod evaluate;
pub mod importance;
pub mod loader;
pub mod metrics;
pub mod preprocess;
pub mod remap;
pub mod schema;
pub mod split;
pub mod svm;
pub mod target;
pub mod train;
pub mod transformer;
pub mod values;

pub use artifacts::{Artifact, ArtifactKind, ArtifactStore};
pub use config::PipelineConfig;
pub use evaluate::{
    canonical_record, export_predictions, predict, predict_proba, predict_with_proba, DatasetInput,
    PREDICTION_COLUMN,
};
pub use importance::{permutation_importance, FeatureImportance, ImportanceTable};
pub use loader::{load_dataset, save_dataset, DatasetStats, FileFormat};
pub use metrics::{compute_metrics, MetricsRecord};
pub use preprocess::{test_preprocess, train_preprocess, TrainTestSplit};
pub use remap::{apply_value_map, CanonicalValue, InputSource, ValueMap};
pub use schema::{record_schema, validate_and_reorder, ColumnSummary, FeatureSchema, SchemaColumn};
pub use split::stratified_split;
pub use svm::{SvmClassifier, SvmParams};
pub use target::extract_binary_target;
pub use train::{load_hyperparameters, run_training, train_model, TrainedModel, TrainingOutcome};
pub use transformer::ColumnTransformer;

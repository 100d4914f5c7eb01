//! Artifact store: typed persistence of everything a training run produces
//!
//! Each artifact lives at a path taken from the pipeline config. Writes go to
//! a sibling temp file that is renamed into place, so a reader never sees a
//! partially written artifact. The five artifacts are not committed together.

use polars::prelude::*;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::config::PipelineConfig;
use super::importance::{FeatureImportance, ImportanceTable};
use super::metrics::MetricsRecord;
use super::schema::FeatureSchema;
use super::train::TrainedModel;
use super::transformer::ColumnTransformer;
use crate::error::{PipelineError, Result};

/// The artifacts a training run writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Schema,
    Transformer,
    Model,
    Metrics,
    Importances,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 5] = [
        ArtifactKind::Schema,
        ArtifactKind::Transformer,
        ArtifactKind::Model,
        ArtifactKind::Metrics,
        ArtifactKind::Importances,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ArtifactKind::Schema => "feature schema",
            ArtifactKind::Transformer => "column transformer",
            ArtifactKind::Model => "model",
            ArtifactKind::Metrics => "metrics",
            ArtifactKind::Importances => "permutation importances",
        }
    }

    fn missing(&self, path: &Path) -> PipelineError {
        let path = path.to_path_buf();
        match self {
            ArtifactKind::Schema | ArtifactKind::Transformer => PipelineError::NotFitted {
                what: self.label(),
                path,
            },
            ArtifactKind::Model => PipelineError::ModelNotFound(path),
            ArtifactKind::Metrics | ArtifactKind::Importances => PipelineError::ArtifactNotFound {
                kind: self.label(),
                path,
            },
        }
    }
}

/// A value that can be written to and read from the artifact store.
pub trait Artifact: Sized {
    const KIND: ArtifactKind;

    fn encode(&self) -> Result<Vec<u8>>;
    fn decode(bytes: &[u8]) -> Result<Self>;
}

/// Paths of the five artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStore {
    schema: PathBuf,
    transformer: PathBuf,
    model: PathBuf,
    metrics: PathBuf,
    importances: PathBuf,
}

impl ArtifactStore {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            schema: config.unique_values_path.clone(),
            transformer: config.col_transform_path.clone(),
            model: config.model_path.clone(),
            metrics: config.metrics_path.clone(),
            importances: config.permutation_importances_path.clone(),
        }
    }

    /// Store with the default file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            schema: dir.join("unique_values.json"),
            transformer: dir.join("col_transformer.bin"),
            model: dir.join("model.bin"),
            metrics: dir.join("metrics.json"),
            importances: dir.join("permutation_importances.csv"),
        }
    }

    pub fn path(&self, kind: ArtifactKind) -> &Path {
        match kind {
            ArtifactKind::Schema => &self.schema,
            ArtifactKind::Transformer => &self.transformer,
            ArtifactKind::Model => &self.model,
            ArtifactKind::Metrics => &self.metrics,
            ArtifactKind::Importances => &self.importances,
        }
    }

    pub fn exists(&self, kind: ArtifactKind) -> bool {
        self.path(kind).is_file()
    }

    /// Artifacts already on disk, which a training run would overwrite.
    pub fn existing(&self) -> Vec<ArtifactKind> {
        ArtifactKind::ALL
            .into_iter()
            .filter(|&kind| self.exists(kind))
            .collect()
    }

    /// Last modification time of an artifact, if it exists.
    pub fn modified(&self, kind: ArtifactKind) -> Option<SystemTime> {
        fs::metadata(self.path(kind)).and_then(|m| m.modified()).ok()
    }

    /// Write an artifact atomically, replacing any previous version.
    pub fn save<A: Artifact>(&self, artifact: &A) -> Result<()> {
        let path = self.path(A::KIND);
        let bytes = artifact.encode()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, path)?;

        log::debug!(
            "Saved {} ({} bytes) to {}",
            A::KIND.label(),
            bytes.len(),
            path.display()
        );
        Ok(())
    }

    /// Read an artifact, mapping absence to the kind-specific error.
    pub fn load<A: Artifact>(&self) -> Result<A> {
        let path = self.path(A::KIND);
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(A::KIND.missing(path))
            }
            Err(e) => return Err(e.into()),
        };
        A::decode(&bytes)
    }
}

fn bincode_encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(bincode::serde::encode_to_vec(value, bincode::config::standard())?)
}

fn bincode_decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let (value, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
    Ok(value)
}

impl Artifact for FeatureSchema {
    const KIND: ArtifactKind = ArtifactKind::Schema;

    fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(&self.to_json())?)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        FeatureSchema::from_json(serde_json::from_slice(bytes)?)
    }
}

impl Artifact for ColumnTransformer {
    const KIND: ArtifactKind = ArtifactKind::Transformer;

    fn encode(&self) -> Result<Vec<u8>> {
        bincode_encode(self)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        bincode_decode(bytes)
    }
}

impl Artifact for TrainedModel {
    const KIND: ArtifactKind = ArtifactKind::Model;

    fn encode(&self) -> Result<Vec<u8>> {
        bincode_encode(self)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        bincode_decode(bytes)
    }
}

impl Artifact for MetricsRecord {
    const KIND: ArtifactKind = ArtifactKind::Metrics;

    fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl Artifact for ImportanceTable {
    const KIND: ArtifactKind = ArtifactKind::Importances;

    fn encode(&self) -> Result<Vec<u8>> {
        let features: Vec<&str> = self.entries().iter().map(|e| e.feature.as_str()).collect();
        let values: Vec<f64> = self.entries().iter().map(|e| e.value).collect();
        let mut df = df! {
            "feature" => features,
            "value" => values,
        }?;

        let mut buf = Vec::new();
        CsvWriter::new(&mut buf).include_header(true).finish(&mut df)?;
        Ok(buf)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
            .finish()?;

        let features = df.column("feature")?.cast(&DataType::String)?;
        let values = df.column("value")?.cast(&DataType::Float64)?;
        let entries = features
            .str()?
            .into_iter()
            .zip(values.f64()?.into_iter())
            .map(|(feature, value)| match (feature, value) {
                (Some(feature), Some(value)) => Ok(FeatureImportance {
                    feature: feature.to_string(),
                    value,
                }),
                _ => Err(PipelineError::invalid(
                    "permutation importance table contains an empty cell",
                )),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ImportanceTable::new(entries))
    }
}

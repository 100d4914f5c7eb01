//! Dataset loading and export for CSV and Parquet files

use polars::prelude::*;
use std::path::Path;

use crate::error::{PipelineError, Result};

/// Rows scanned to infer CSV column types
const INFER_SCHEMA_ROWS: usize = 10_000;

/// File formats the pipeline reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Parquet,
}

impl FileFormat {
    /// Detect the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "parquet" => Ok(FileFormat::Parquet),
            _ => Err(PipelineError::invalid(format!(
                "Unsupported file format '{}' for {}. Supported formats: csv, parquet",
                extension,
                path.display()
            ))),
        }
    }
}

/// Load a dataset from a file (CSV or Parquet based on extension).
pub fn load_dataset(path: &Path) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(PipelineError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Dataset not found: {}", path.display()),
        )));
    }

    let lf = match FileFormat::from_path(path)? {
        FileFormat::Csv => LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
            .finish()?,
        FileFormat::Parquet => LazyFrame::scan_parquet(path, Default::default())?,
    };

    let df = lf.collect()?;
    log::info!(
        "Loaded {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

/// Write a frame as CSV or Parquet based on the extension of `path`.
pub fn save_dataset(df: &mut DataFrame, path: &Path) -> Result<()> {
    let format = FileFormat::from_path(path)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::File::create(path)?;
    match format {
        FileFormat::Csv => {
            CsvWriter::new(file).include_header(true).finish(df)?;
        }
        FileFormat::Parquet => {
            ParquetWriter::new(file).finish(df)?;
        }
    }

    log::info!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

/// Shape and estimated memory footprint of a loaded dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetStats {
    pub rows: usize,
    pub columns: usize,
    pub memory_mb: f64,
}

impl DatasetStats {
    pub fn of(df: &DataFrame) -> Self {
        let (rows, columns) = df.shape();
        Self {
            rows,
            columns,
            memory_mb: df.estimated_size() as f64 / (1024.0 * 1024.0),
        }
    }
}

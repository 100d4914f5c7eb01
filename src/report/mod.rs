//! Report module - terminal tables for training, metrics and schema

pub mod metrics_report;
pub mod schema_report;
pub mod summary;

pub use metrics_report::*;
pub use schema_report::*;
pub use summary::*;

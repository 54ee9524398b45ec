//! Weather Pipeline Library
//!
//! Ingests daily station weather files into a SQLite record store and
//! aggregates them into yearly per-station statistics.
//!
//! This library provides tools for:
//! - Parsing tab-separated station files lazily, row by row
//! - Converting raw integer encodings into physical units
//! - Deduplicating readings against the store and within a batch
//! - Persisting readings and results as atomic bulk writes
//! - Computing and reporting yearly averages and precipitation totals
//! - Running ingestion and aggregation as background jobs on a worker pool

pub mod aggregation;
pub mod config;
pub mod constants;
pub mod conversion;
pub mod error;
pub mod ingestion;
pub mod jobs;
pub mod models;
pub mod parser;
pub mod run_log;
pub mod store;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use aggregation::AggregationEngine;
pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use ingestion::IngestionPipeline;
pub use jobs::{JobOrchestrator, JobSummary};
pub use models::{AggregateReport, IngestionStats, Reading, StationYearStats, YearlyResult};
pub use store::Database;

//! Error handling for ingestion and aggregation runs.
//!
//! Provides error types with enough context to tell a configuration problem
//! (reported synchronously to the submitter) apart from run failures that are
//! caught, logged and swallowed by the background worker.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("No station files found in {location}")]
    NoInputFiles { location: String },

    #[error("Malformed row in {path} at line {line}: {reason}")]
    Parse {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("Failed to read station file {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Duplicate key rejected by table '{table}': {message}")]
    DuplicateKey { table: &'static str, message: String },

    #[error("Store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Job queue closed, {job} job not submitted")]
    QueueClosed { job: &'static str },
}

impl PipelineError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a parse error for a specific line of a station file
    pub fn parse(path: impl Into<PathBuf>, line: u64, reason: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }

    /// True for errors that are raised at submission time rather than inside a run
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PipelineError::Configuration { .. } | PipelineError::NoInputFiles { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

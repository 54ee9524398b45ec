//! Configuration management and validation.
//!
//! Provides the directory layout and worker pool size for a pipeline
//! instance. Values are layered: defaults, then environment variables,
//! then whatever the CLI sets through the builder methods.

use crate::constants::{
    DEFAULT_DATABASE_FILE_NAME, DEFAULT_DATA_DIR_NAME, DEFAULT_LOG_DIR_NAME,
    DEFAULT_RESULTS_DIR_NAME, MAX_DEFAULT_WORKERS,
};
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Root directory holding the default layout
pub const ENV_ROOT_DIR: &str = "WX_ROOT_DIR";
/// Station file directory override
pub const ENV_DATA_DIR: &str = "WX_DATA_DIR";
/// Database file override
pub const ENV_DATABASE_PATH: &str = "WX_DATABASE_PATH";
/// Worker pool size override
pub const ENV_WORKERS: &str = "WX_WORKERS";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory scanned for `<station_id>.txt` files
    pub data_dir: PathBuf,

    /// SQLite database holding the record and result stores
    pub database_path: PathBuf,

    /// Per-run process logs
    pub log_dir: PathBuf,

    /// Dated aggregate reports
    pub results_dir: PathBuf,

    /// Number of background workers
    pub workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_root(Path::new("."))
    }
}

impl PipelineConfig {
    /// Lay out data, database, logs and results under one root directory
    pub fn from_root(root: &Path) -> Self {
        Self {
            data_dir: root.join(DEFAULT_DATA_DIR_NAME),
            database_path: root.join(DEFAULT_DATABASE_FILE_NAME),
            log_dir: root.join(DEFAULT_LOG_DIR_NAME),
            results_dir: root.join(DEFAULT_RESULTS_DIR_NAME),
            workers: default_workers(),
        }
    }

    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by any variable `lookup` returns
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match lookup(ENV_ROOT_DIR) {
            Some(root) => Self::from_root(Path::new(&root)),
            None => Self::default(),
        };

        if let Some(data_dir) = lookup(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Some(database_path) = lookup(ENV_DATABASE_PATH) {
            config.database_path = PathBuf::from(database_path);
        }
        if let Some(workers) = lookup(ENV_WORKERS) {
            config.workers = workers.trim().parse().map_err(|_| {
                PipelineError::configuration(format!(
                    "{} must be a positive integer, got '{}'",
                    ENV_WORKERS, workers
                ))
            })?;
        }

        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Move the whole layout under a new root, keeping the worker count
    pub fn with_root(self, root: &Path) -> Self {
        Self {
            workers: self.workers,
            ..Self::from_root(root)
        }
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_database_path(mut self, database_path: impl Into<PathBuf>) -> Self {
        self.database_path = database_path.into();
        self
    }

    /// Create configuration with custom worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(PipelineError::configuration("worker count must be at least 1"));
        }
        Ok(())
    }

    /// Create the log and results directories
    pub fn prepare_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.log_dir)?;
        fs::create_dir_all(&self.results_dir)?;
        Ok(())
    }
}

fn default_workers() -> usize {
    num_cpus::get().clamp(1, MAX_DEFAULT_WORKERS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_root_layout() {
        let config = PipelineConfig::from_root(Path::new("/srv/wx"));

        assert_eq!(config.data_dir, PathBuf::from("/srv/wx/wx_data"));
        assert_eq!(config.database_path, PathBuf::from("/srv/wx/database.db"));
        assert_eq!(config.log_dir, PathBuf::from("/srv/wx/logs"));
        assert_eq!(config.results_dir, PathBuf::from("/srv/wx/results"));
        assert!(config.workers >= 1 && config.workers <= MAX_DEFAULT_WORKERS);
    }

    #[test]
    fn test_environment_overrides() {
        let config = PipelineConfig::from_lookup(lookup_from(&[
            (ENV_ROOT_DIR, "/srv/wx"),
            (ENV_DATABASE_PATH, "/var/lib/wx.db"),
            (ENV_WORKERS, "2"),
        ]))
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/srv/wx/wx_data"));
        assert_eq!(config.database_path, PathBuf::from("/var/lib/wx.db"));
        assert_eq!(config.workers, 2);
    }

    #[test]
    fn test_invalid_worker_variable() {
        let err = PipelineConfig::from_lookup(lookup_from(&[(ENV_WORKERS, "many")])).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = PipelineConfig::default().with_workers(0);
        assert!(config.validate().is_err());
        assert!(config.with_workers(1).validate().is_ok());
    }

    #[test]
    fn test_with_root_keeps_workers() {
        let config = PipelineConfig::default()
            .with_workers(3)
            .with_root(Path::new("/data"));

        assert_eq!(config.workers, 3);
        assert_eq!(config.log_dir, PathBuf::from("/data/logs"));
    }

    #[test]
    fn test_prepare_directories() {
        let temp_dir = TempDir::new().unwrap();
        let config = PipelineConfig::from_root(temp_dir.path());

        config.prepare_directories().unwrap();

        assert!(config.log_dir.is_dir());
        assert!(config.results_dir.is_dir());
        assert!(!config.data_dir.exists());
    }
}

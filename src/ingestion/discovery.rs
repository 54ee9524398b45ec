//! Station file discovery
//!
//! Lists `*.txt` station files in a data directory in sorted order. An
//! empty or missing directory is a configuration error, raised before any
//! background work is submitted.

use crate::constants::STATION_FILE_EXTENSION;
use crate::error::{PipelineError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Discover every station file directly inside `data_dir`
pub fn discover_station_files(data_dir: &Path) -> Result<Vec<PathBuf>> {
    if !data_dir.is_dir() {
        return Err(PipelineError::NoInputFiles {
            location: format!("{} (directory not found)", data_dir.display()),
        });
    }

    let pattern = data_dir.join(format!("*.{}", STATION_FILE_EXTENSION));
    let pattern_str = pattern.to_string_lossy();
    debug!("Searching for station files with pattern: {}", pattern_str);

    let entries = glob::glob(&pattern_str).map_err(|e| {
        PipelineError::configuration(format!("invalid data directory pattern '{}': {}", pattern_str, e))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| PipelineError::Io(e.into_error()))?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(PipelineError::NoInputFiles {
            location: data_dir.display().to_string(),
        });
    }

    debug!("Found {} station files in {}", files.len(), data_dir.display());
    Ok(files)
}

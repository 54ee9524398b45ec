//! Tests for the ingestion pipeline
//!
//! Station files are written into a temp dir and ingested into an in-memory store.

pub mod deduplication_tests;

use crate::ingestion::IngestionPipeline;
use crate::store::Database;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Write a station file named `<station>.txt` with the given lines
pub fn create_station_file(dir: &TempDir, station: &str, lines: &[&str]) -> PathBuf {
    let path = dir.path().join(format!("{}.txt", station));
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(&path, content).unwrap();
    path
}

/// Pipeline over `files` with its log dir inside the temp dir
pub fn create_pipeline(db: &Database, temp_dir: &TempDir, files: Vec<PathBuf>) -> IngestionPipeline {
    IngestionPipeline::new(files, "test", db.records(), temp_dir.path().join("logs")).unwrap()
}

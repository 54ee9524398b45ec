//! Ingestion pipeline for station files
//!
//! A run reads every station file in order, converts each row into a
//! `Reading`, drops rows whose identity is already stored or already staged,
//! and persists whatever remains in one atomic bulk write. Any failure aborts
//! the run with zero effect on the record store.
//!
//! A run that inserts at least one reading hands off to aggregation through
//! the callback given to [`IngestionPipeline::run`], after its bulk write has
//! committed.

pub mod deduplication;
pub mod discovery;

#[cfg(test)]
pub mod tests;

pub use deduplication::SeenReadings;
pub use discovery::discover_station_files;

use crate::conversion::to_reading;
use crate::error::{PipelineError, Result};
use crate::models::{IngestionStats, Reading};
use crate::parser::StationFile;
use crate::run_log::{RunKind, RunLog};
use crate::store::RecordStore;
use chrono::Local;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error};

/// One ingestion unit of work over a fixed set of station files
#[derive(Debug, Clone)]
pub struct IngestionPipeline {
    files: Vec<PathBuf>,
    trigger: String,
    records: RecordStore,
    log_dir: PathBuf,
}

impl IngestionPipeline {
    /// Create a run over `files`; an empty set is rejected here, before any work is queued
    pub fn new(
        files: Vec<PathBuf>,
        trigger: impl Into<String>,
        records: RecordStore,
        log_dir: PathBuf,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        let files: Vec<PathBuf> = files
            .into_iter()
            .filter(|path| seen.insert(path.clone()))
            .collect();

        if files.is_empty() {
            return Err(PipelineError::NoInputFiles {
                location: "the submitted file list".to_string(),
            });
        }

        Ok(Self {
            files,
            trigger: trigger.into(),
            records,
            log_dir,
        })
    }

    /// Create a run over every station file in `data_dir`
    pub fn from_directory(
        data_dir: &Path,
        trigger: impl Into<String>,
        records: RecordStore,
        log_dir: PathBuf,
    ) -> Result<Self> {
        let files = discover_station_files(data_dir)?;
        Self::new(files, trigger, records, log_dir)
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    /// Run to completion, recording any failure in the run log instead of returning it.
    ///
    /// `hand_off` is called at most once, after a successful bulk write that
    /// inserted at least one reading.
    pub fn run(&self, hand_off: impl FnOnce()) -> Option<IngestionStats> {
        let mut log = match RunLog::open(&self.log_dir, RunKind::Ingestion) {
            Ok(log) => log,
            Err(e) => {
                error!("Ingestion run aborted, cannot open run log: {}", e);
                return None;
            }
        };
        log.info(format!("Number of files to ingest: {}", self.files.len()));
        log.info(format!("Ingestion type: {}", self.trigger));
        log.info(format!("Log file location: {}", log.path().display()));
        log.banner();

        match self.ingest(&mut log) {
            Ok(stats) => {
                if stats.should_trigger_aggregation() {
                    log.info("Handing off to aggregation");
                    hand_off();
                } else {
                    log.info("No new readings, aggregation not triggered");
                }
                Some(stats)
            }
            Err(e) => {
                log.error(format!("Ingestion run failed: {}", e));
                None
            }
        }
    }

    /// The ingestion steps, with errors propagated to the caller
    pub fn ingest(&self, log: &mut RunLog) -> Result<IngestionStats> {
        let start = Instant::now();
        log.info(format!("Process start: {}", Local::now()));

        log.info("RUN: loading existing reading ids");
        let mut seen = SeenReadings::load(&self.records)?;
        log.info(format!("Existing readings in store: {}", seen.preexisting()));

        let mut staged: Vec<Reading> = Vec::new();
        let mut stats = IngestionStats::default();

        for path in &self.files {
            log.info(format!("Processing station file: {}", path.display()));
            let file = StationFile::new(path.clone())?;
            let (read, skipped) = stage_file(&file, &mut seen, &mut staged)?;
            debug!(
                "{} ({}): {} rows read, {} already known",
                file.station_id(),
                file.path().display(),
                read,
                skipped
            );
            stats.files_processed += 1;
            stats.rows_read += read;
            stats.rows_skipped += skipped;
        }

        log.info(format!("Number of new readings identified: {}", seen.staged()));

        if !staged.is_empty() {
            log.info("START: bulk insertion of readings");
            stats.rows_inserted = self.records.insert_bulk(&staged)?;
            log.info("END: bulk insertion of readings");
        }

        stats.duration = start.elapsed();
        log.info(format!("Process end: {}", Local::now()));
        log.info(format!("Total ingestion process time: {:?}", stats.duration));

        Ok(stats)
    }
}

/// Stage every unseen row of one file; returns (rows read, rows skipped)
fn stage_file(
    file: &StationFile,
    seen: &mut SeenReadings,
    staged: &mut Vec<Reading>,
) -> Result<(usize, usize)> {
    let mut read = 0;
    let mut skipped = 0;

    for row in file.rows()? {
        let row = row?;
        read += 1;

        let reading_id = Reading::make_id(file.station_id(), &row.date);
        if seen.claim(&reading_id) {
            staged.push(to_reading(file.station_id(), &row));
        } else {
            skipped += 1;
        }
    }

    Ok((read, skipped))
}

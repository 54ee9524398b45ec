//! Aggregation engine for yearly per-station statistics
//!
//! A run computes statistics for every candidate (year, station) pair in the
//! record store, persists the pairs that have no result row yet, and writes
//! the full aggregate as a dated report.
//!
//! # Processing Pipeline
//!
//! 1. **Extract**: distinct years and distinct stations, queried independently
//! 2. **Compute**: one grouped query, expanded over the candidate cross product
//! 3. **Persist**: new result rows only, as one atomic bulk write
//! 4. **Report**: the full in-memory aggregate, whatever was newly persisted
//!
//! Existing result rows are never recomputed in the store or overwritten.

pub mod report;
pub mod stats;

#[cfg(test)]
pub mod tests;

pub use report::{latest_report, latest_report_path, read_report, write_report};
pub use stats::build_report;

use crate::error::Result;
use crate::models::{AggregateReport, AggregationStats, YearlyResult};
use crate::run_log::{RunKind, RunLog};
use crate::store::{RecordStore, ResultStore};
use chrono::Local;
use std::path::PathBuf;
use std::time::Instant;
use tracing::error;

/// One aggregation unit of work
#[derive(Debug, Clone)]
pub struct AggregationEngine {
    records: RecordStore,
    results: ResultStore,
    log_dir: PathBuf,
    results_dir: PathBuf,
}

impl AggregationEngine {
    pub fn new(
        records: RecordStore,
        results: ResultStore,
        log_dir: PathBuf,
        results_dir: PathBuf,
    ) -> Self {
        Self {
            records,
            results,
            log_dir,
            results_dir,
        }
    }

    /// Run to completion, recording any failure in the run log instead of returning it
    pub fn run(&self) -> Option<AggregationStats> {
        let mut log = match RunLog::open(&self.log_dir, RunKind::Analytics) {
            Ok(log) => log,
            Err(e) => {
                error!("Aggregation run aborted, cannot open run log: {}", e);
                return None;
            }
        };
        log.info(format!("Log file location: {}", log.path().display()));
        log.banner();

        match self.aggregate(&mut log) {
            Ok(stats) => Some(stats),
            Err(e) => {
                log.error(format!("Aggregation run failed: {}", e));
                None
            }
        }
    }

    /// The aggregation steps, with errors propagated to the caller
    pub fn aggregate(&self, log: &mut RunLog) -> Result<AggregationStats> {
        let start = Instant::now();
        log.info(format!("Process start: {}", Local::now()));

        log.info("RUN: extracting distinct years and stations");
        let years = self.records.distinct_years()?;
        let stations = self.records.distinct_stations()?;
        log.info(format!(
            "Candidate space: {} years x {} stations",
            years.len(),
            stations.len()
        ));

        log.info("RUN: computing statistics");
        let totals = self.records.station_year_totals()?;
        let report = build_report(&years, &stations, &totals);
        let candidate_pairs = stats::pair_count(&report);

        log.info("RUN: staging new results");
        let staged = self.stage_new_results(&report)?;
        log.info(format!("Number of new results identified: {}", staged.len()));

        let results_written = if staged.is_empty() {
            0
        } else {
            log.info("START: bulk insertion of results");
            let written = self.results.insert_bulk(&staged)?;
            log.info("END: bulk insertion of results");
            written
        };

        log.info("RUN: writing aggregate report");
        let report_path = write_report(&self.results_dir, &report)?;
        log.info(format!("Aggregate report written to {}", report_path.display()));

        let duration = start.elapsed();
        log.info(format!("Process end: {}", Local::now()));
        log.info(format!("Total aggregation process time: {:?}", duration));

        Ok(AggregationStats {
            candidate_pairs,
            results_written,
            report_path,
            duration,
        })
    }

    /// Result rows for pairs whose id is not stored yet
    fn stage_new_results(&self, report: &AggregateReport) -> Result<Vec<YearlyResult>> {
        let mut known = self.results.result_ids()?;
        let mut staged = Vec::new();

        for (&year, by_station) in report {
            for (station, stats) in by_station {
                if known.insert(YearlyResult::make_id(year, station)) {
                    staged.push(YearlyResult::from_stats(year, station, stats));
                }
            }
        }

        Ok(staged)
    }
}

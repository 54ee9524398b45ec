//! Core data structures for the weather pipeline.
//!
//! Defines the raw row decoded from a station file, the normalized
//! `Reading` and `YearlyResult` rows held by the stores, the aggregate
//! report shape, and the per-run statistics returned by each unit of work.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// One undecoded row of a station file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// Date exactly as it appears in the file (`YYYYMMDD`)
    pub date: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Tenths of a degree Celsius, or the missing sentinel
    pub raw_max_temperature: i64,
    /// Tenths of a degree Celsius, or the missing sentinel
    pub raw_min_temperature: i64,
    /// Hundredths of an inch, or the missing sentinel
    pub raw_precipitation: i64,
}

/// One daily observation at one station, in physical units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub reading_id: String,
    pub station_id: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Degrees Celsius
    pub max_temperature: Option<f64>,
    /// Degrees Celsius
    pub min_temperature: Option<f64>,
    /// Inches
    pub precipitation: Option<f64>,
}

impl Reading {
    /// Deterministic reading identity: station id followed by the raw date
    pub fn make_id(station_id: &str, raw_date: &str) -> String {
        format!("{}{}", station_id, raw_date)
    }
}

/// Aggregate statistics for one (year, station) pair as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyResult {
    pub result_id: String,
    pub year: i32,
    pub station_id: String,
    pub avg_max_temperature: Option<f64>,
    pub avg_min_temperature: Option<f64>,
    pub total_accumulated_precipitation: Option<f64>,
}

impl YearlyResult {
    /// Deterministic result identity: year followed by station id
    pub fn make_id(year: i32, station_id: &str) -> String {
        format!("{}{}", year, station_id)
    }

    pub fn from_stats(year: i32, station_id: &str, stats: &StationYearStats) -> Self {
        Self {
            result_id: Self::make_id(year, station_id),
            year,
            station_id: station_id.to_string(),
            avg_max_temperature: stats.avg_max_temperature,
            avg_min_temperature: stats.avg_min_temperature,
            total_accumulated_precipitation: stats.total_accumulated_precipitation,
        }
    }
}

/// The three statistics computed for a candidate pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationYearStats {
    pub avg_max_temperature: Option<f64>,
    pub avg_min_temperature: Option<f64>,
    pub total_accumulated_precipitation: Option<f64>,
}

/// Full aggregate keyed year -> station -> statistics
pub type AggregateReport = BTreeMap<i32, BTreeMap<String, StationYearStats>>;

/// Outcome of one ingestion run
#[derive(Debug, Clone, Default)]
pub struct IngestionStats {
    pub files_processed: usize,
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub rows_inserted: usize,
    pub duration: Duration,
}

impl IngestionStats {
    /// A run with new rows hands off to aggregation
    pub fn should_trigger_aggregation(&self) -> bool {
        self.rows_inserted > 0
    }
}

/// Outcome of one aggregation run
#[derive(Debug, Clone, Default)]
pub struct AggregationStats {
    pub candidate_pairs: usize,
    pub results_written: usize,
    pub report_path: PathBuf,
    pub duration: Duration,
}

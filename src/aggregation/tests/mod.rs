//! Tests for the aggregation engine and its statistics

pub mod stats_tests;

use crate::aggregation::AggregationEngine;
use crate::models::Reading;
use crate::store::Database;
use tempfile::TempDir;

/// Create a reading from a raw date and already-converted values
pub fn create_reading(
    station: &str,
    date: &str,
    max: Option<f64>,
    min: Option<f64>,
    precip: Option<f64>,
) -> Reading {
    Reading {
        reading_id: Reading::make_id(station, date),
        station_id: station.to_string(),
        year: date[..4].parse().unwrap(),
        month: date[4..6].parse().unwrap(),
        day: date[6..8].parse().unwrap(),
        max_temperature: max,
        min_temperature: min,
        precipitation: precip,
    }
}

/// Engine over an in-memory database with log and results dirs in a temp dir
pub fn create_engine(db: &Database, temp_dir: &TempDir) -> AggregationEngine {
    AggregationEngine::new(
        db.records(),
        db.results(),
        temp_dir.path().join("logs"),
        temp_dir.path().join("results"),
    )
}

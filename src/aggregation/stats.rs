//! Statistics for candidate (year, station) pairs
//!
//! The candidate space is the cross product of every known year with every
//! known station, so a pair may have no readings at all. Averages of an
//! empty set are `None`; the precipitation total of an empty set is `0.0`.

use crate::conversion::round_stored;
use crate::models::{AggregateReport, StationYearStats};
use crate::store::StationYearTotals;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Mean of `count` values summing to `sum`, or `None` when there are no values
pub fn average(sum: f64, count: u64) -> Option<f64> {
    if count == 0 {
        None
    } else {
        Some(round_stored(sum / count as f64))
    }
}

/// Sum of the non-null values; an empty sum is a valid zero
pub fn total(sum: f64) -> f64 {
    round_stored(sum)
}

impl From<&StationYearTotals> for StationYearStats {
    fn from(totals: &StationYearTotals) -> Self {
        Self {
            avg_max_temperature: average(totals.max_temperature_sum, totals.max_temperature_count),
            avg_min_temperature: average(totals.min_temperature_sum, totals.min_temperature_count),
            total_accumulated_precipitation: Some(total(totals.precipitation_sum)),
        }
    }
}

/// Compute statistics for every candidate pair
pub fn build_report(
    years: &BTreeSet<i32>,
    stations: &BTreeSet<String>,
    totals: &HashMap<(i32, String), StationYearTotals>,
) -> AggregateReport {
    let empty = StationYearTotals::default();
    let mut report = AggregateReport::new();

    for &year in years {
        let mut by_station = BTreeMap::new();
        for station in stations {
            let group = totals.get(&(year, station.clone())).unwrap_or(&empty);
            by_station.insert(station.clone(), StationYearStats::from(group));
        }
        report.insert(year, by_station);
    }

    report
}

/// Number of (year, station) entries in a report
pub fn pair_count(report: &AggregateReport) -> usize {
    report.values().map(BTreeMap::len).sum()
}

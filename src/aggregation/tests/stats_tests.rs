//! Tests for candidate-pair statistics

use crate::aggregation::stats::{average, build_report, pair_count, total};
use crate::models::StationYearStats;
use crate::store::StationYearTotals;
use std::collections::{BTreeSet, HashMap};

fn stations(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_average_of_two_values() {
    assert_eq!(average(30.0, 2), Some(15.0));
}

#[test]
fn test_average_of_nothing_is_none() {
    assert_eq!(average(0.0, 0), None);
}

#[test]
fn test_average_is_rounded() {
    assert_eq!(average(10.0, 3), Some(3.3333));
}

#[test]
fn test_average_tie_rounds_to_even() {
    // 0.5 / 16 is exactly 0.03125
    assert_eq!(average(0.5, 16), Some(0.0312));
    assert_eq!(average(-638.5, 16), Some(-39.9062));
}

#[test]
fn test_total_of_nothing_is_zero() {
    assert_eq!(total(0.0), 0.0);
    assert_eq!(total(0.1 + 0.2), 0.3);
}

#[test]
fn test_all_null_group_keeps_asymmetry() {
    let totals = StationYearTotals::default();
    let stats = StationYearStats::from(&totals);

    assert_eq!(stats.avg_max_temperature, None);
    assert_eq!(stats.avg_min_temperature, None);
    assert_eq!(stats.total_accumulated_precipitation, Some(0.0));
}

#[test]
fn test_report_covers_cross_product() {
    let years: BTreeSet<i32> = [2011, 2012].into_iter().collect();
    let stations = stations(&["USC00110072", "USC00110187"]);

    let mut totals = HashMap::new();
    totals.insert(
        (2011, "USC00110072".to_string()),
        StationYearTotals {
            max_temperature_sum: 30.0,
            max_temperature_count: 2,
            min_temperature_sum: -4.0,
            min_temperature_count: 2,
            precipitation_sum: 1.25,
            precipitation_count: 2,
        },
    );
    totals.insert(
        (2012, "USC00110187".to_string()),
        StationYearTotals {
            max_temperature_sum: 5.0,
            max_temperature_count: 1,
            ..Default::default()
        },
    );

    let report = build_report(&years, &stations, &totals);

    assert_eq!(pair_count(&report), 4);

    let observed = &report[&2011]["USC00110072"];
    assert_eq!(observed.avg_max_temperature, Some(15.0));
    assert_eq!(observed.avg_min_temperature, Some(-2.0));
    assert_eq!(observed.total_accumulated_precipitation, Some(1.25));

    // Pairs with no readings still appear
    let unobserved = &report[&2012]["USC00110072"];
    assert_eq!(unobserved.avg_max_temperature, None);
    assert_eq!(unobserved.avg_min_temperature, None);
    assert_eq!(unobserved.total_accumulated_precipitation, Some(0.0));

    let partial = &report[&2012]["USC00110187"];
    assert_eq!(partial.avg_max_temperature, Some(5.0));
    assert_eq!(partial.avg_min_temperature, None);
}

#[test]
fn test_empty_store_gives_empty_report() {
    let report = build_report(&BTreeSet::new(), &BTreeSet::new(), &HashMap::new());
    assert!(report.is_empty());
    assert_eq!(pair_count(&report), 0);
}

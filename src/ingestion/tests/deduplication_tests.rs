//! Tests for the run-scoped membership set

use super::*;
use crate::ingestion::SeenReadings;
use crate::models::Reading;

fn stored_reading(id_date: &str) -> Reading {
    Reading {
        reading_id: Reading::make_id("USC00110072", id_date),
        station_id: "USC00110072".to_string(),
        year: 2012,
        month: 1,
        day: 1,
        max_temperature: None,
        min_temperature: None,
        precipitation: None,
    }
}

#[test]
fn test_stored_ids_cannot_be_claimed() {
    let db = Database::open_in_memory().unwrap();
    db.records().insert_bulk(&[stored_reading("20120101")]).unwrap();

    let mut seen = SeenReadings::load(&db.records()).unwrap();

    assert_eq!(seen.preexisting(), 1);
    assert!(!seen.claim("USC0011007220120101"));
    assert_eq!(seen.staged(), 0);
}

#[test]
fn test_first_claim_wins() {
    let db = Database::open_in_memory().unwrap();
    let mut seen = SeenReadings::load(&db.records()).unwrap();

    assert!(seen.claim("USC0011007220120102"));
    assert!(!seen.claim("USC0011007220120102"));
    assert!(seen.claim("USC0011007220120103"));
    assert_eq!(seen.staged(), 2);
}

#[test]
fn test_same_date_different_station_is_distinct() {
    let db = Database::open_in_memory().unwrap();
    let mut seen = SeenReadings::load(&db.records()).unwrap();

    assert!(seen.claim(&Reading::make_id("USC00110072", "20120101")));
    assert!(seen.claim(&Reading::make_id("USC00110187", "20120101")));
}

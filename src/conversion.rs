//! Unit conversion from raw integer encodings to physical units.

use crate::constants::{
    DECIMAL_PLACES, MISSING_VALUE_SENTINEL, PRECIPITATION_SCALE, TEMPERATURE_SCALE,
};
use crate::models::{RawRow, Reading};

/// Round to the number of decimals stored for measurements and statistics.
///
/// Rounds the exact binary value with ties to even, so `0.03125` becomes
/// `0.0312`. Scaling by a power of ten first would round that tie upward.
pub fn round_stored(value: f64) -> f64 {
    // Formatted floats always parse back, "NaN" and "inf" included
    format!("{:.*}", DECIMAL_PLACES as usize, value)
        .parse()
        .unwrap_or(value)
}

/// Decode one raw field; the sentinel maps to `None`
pub fn decode_measurement(raw: i64, scale: f64) -> Option<f64> {
    if raw == MISSING_VALUE_SENTINEL {
        None
    } else {
        Some(round_stored(raw as f64 * scale))
    }
}

/// Build the normalized reading for a raw row of the given station
pub fn to_reading(station_id: &str, row: &RawRow) -> Reading {
    Reading {
        reading_id: Reading::make_id(station_id, &row.date),
        station_id: station_id.to_string(),
        year: row.year,
        month: row.month,
        day: row.day,
        max_temperature: decode_measurement(row.raw_max_temperature, TEMPERATURE_SCALE),
        min_temperature: decode_measurement(row.raw_min_temperature, TEMPERATURE_SCALE),
        precipitation: decode_measurement(row.raw_precipitation, PRECIPITATION_SCALE),
    }
}

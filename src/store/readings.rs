//! Record store: the `readings` table

use super::{Database, map_insert_error};
use crate::error::Result;
use crate::models::Reading;
use rusqlite::{OptionalExtension, Row, params};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

const TABLE: &str = "readings";

/// Sums and counts of non-null measurements for one (year, station) group
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationYearTotals {
    pub max_temperature_sum: f64,
    pub max_temperature_count: u64,
    pub min_temperature_sum: f64,
    pub min_temperature_count: u64,
    pub precipitation_sum: f64,
    pub precipitation_count: u64,
}

#[derive(Debug, Clone)]
pub struct RecordStore {
    db: Database,
}

impl RecordStore {
    pub(crate) fn new(db: Database) -> Self {
        Self { db }
    }

    /// Every reading id currently stored
    pub fn reading_ids(&self) -> Result<HashSet<String>> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare("SELECT reading_id FROM readings")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<HashSet<_>>>()?;
        Ok(ids)
    }

    /// Insert all readings in one transaction; any duplicate id rejects the whole batch
    pub fn insert_bulk(&self, readings: &[Reading]) -> Result<usize> {
        if readings.is_empty() {
            return Ok(0);
        }

        let mut conn = self.db.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO readings (
                    reading_id, station_id, year, month, day,
                    max_temperature, min_temperature, precipitation
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for reading in readings {
                stmt.execute(params![
                    reading.reading_id,
                    reading.station_id,
                    reading.year,
                    reading.month,
                    reading.day,
                    reading.max_temperature,
                    reading.min_temperature,
                    reading.precipitation,
                ])
                .map_err(|e| map_insert_error(TABLE, e))?;
            }
        }
        tx.commit()?;

        debug!("Committed {} readings", readings.len());
        Ok(readings.len())
    }

    pub fn distinct_years(&self) -> Result<BTreeSet<i32>> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare("SELECT DISTINCT year FROM readings")?;
        let years = stmt
            .query_map([], |row| row.get::<_, i32>(0))?
            .collect::<rusqlite::Result<BTreeSet<_>>>()?;
        Ok(years)
    }

    pub fn distinct_stations(&self) -> Result<BTreeSet<String>> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare("SELECT DISTINCT station_id FROM readings")?;
        let stations = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<BTreeSet<_>>>()?;
        Ok(stations)
    }

    /// Grouped sums and non-null counts for every (year, station) that has readings
    ///
    /// `COUNT(column)` skips nulls and `TOTAL(column)` is `0.0` over an empty
    /// set, so the null policy for averages is left to the caller.
    pub fn station_year_totals(&self) -> Result<HashMap<(i32, String), StationYearTotals>> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(
            "SELECT year, station_id,
                    TOTAL(max_temperature), COUNT(max_temperature),
                    TOTAL(min_temperature), COUNT(min_temperature),
                    TOTAL(precipitation), COUNT(precipitation)
             FROM readings
             GROUP BY year, station_id",
        )?;
        let totals = stmt
            .query_map([], |row| {
                let key = (row.get::<_, i32>(0)?, row.get::<_, String>(1)?);
                let totals = StationYearTotals {
                    max_temperature_sum: row.get(2)?,
                    max_temperature_count: row.get::<_, i64>(3)? as u64,
                    min_temperature_sum: row.get(4)?,
                    min_temperature_count: row.get::<_, i64>(5)? as u64,
                    precipitation_sum: row.get(6)?,
                    precipitation_count: row.get::<_, i64>(7)? as u64,
                };
                Ok((key, totals))
            })?
            .collect::<rusqlite::Result<HashMap<_, _>>>()?;
        Ok(totals)
    }

    pub fn get(&self, reading_id: &str) -> Result<Option<Reading>> {
        let conn = self.db.lock()?;
        let reading = conn
            .query_row(
                "SELECT reading_id, station_id, year, month, day,
                        max_temperature, min_temperature, precipitation
                 FROM readings WHERE reading_id = ?1",
                params![reading_id],
                map_reading_row,
            )
            .optional()?;
        Ok(reading)
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.db.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM readings", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn map_reading_row(row: &Row<'_>) -> rusqlite::Result<Reading> {
    Ok(Reading {
        reading_id: row.get(0)?,
        station_id: row.get(1)?,
        year: row.get(2)?,
        month: row.get(3)?,
        day: row.get(4)?,
        max_temperature: row.get(5)?,
        min_temperature: row.get(6)?,
        precipitation: row.get(7)?,
    })
}

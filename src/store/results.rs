//! Result store: the `results` table

use super::{Database, map_insert_error};
use crate::error::Result;
use crate::models::YearlyResult;
use rusqlite::{OptionalExtension, params};
use std::collections::HashSet;
use tracing::debug;

const TABLE: &str = "results";

#[derive(Debug, Clone)]
pub struct ResultStore {
    db: Database,
}

impl ResultStore {
    pub(crate) fn new(db: Database) -> Self {
        Self { db }
    }

    /// Every result id currently stored
    pub fn result_ids(&self) -> Result<HashSet<String>> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare("SELECT result_id FROM results")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<HashSet<_>>>()?;
        Ok(ids)
    }

    /// Insert all results in one transaction; any duplicate id rejects the whole batch
    pub fn insert_bulk(&self, results: &[YearlyResult]) -> Result<usize> {
        if results.is_empty() {
            return Ok(0);
        }

        let mut conn = self.db.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO results (
                    result_id, year, station_id,
                    avg_max_temperature, avg_min_temperature, total_accumulated_precipitation
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for result in results {
                stmt.execute(params![
                    result.result_id,
                    result.year,
                    result.station_id,
                    result.avg_max_temperature,
                    result.avg_min_temperature,
                    result.total_accumulated_precipitation,
                ])
                .map_err(|e| map_insert_error(TABLE, e))?;
            }
        }
        tx.commit()?;

        debug!("Committed {} results", results.len());
        Ok(results.len())
    }

    pub fn get(&self, result_id: &str) -> Result<Option<YearlyResult>> {
        let conn = self.db.lock()?;
        let result = conn
            .query_row(
                "SELECT result_id, year, station_id,
                        avg_max_temperature, avg_min_temperature, total_accumulated_precipitation
                 FROM results WHERE result_id = ?1",
                params![result_id],
                |row| {
                    Ok(YearlyResult {
                        result_id: row.get(0)?,
                        year: row.get(1)?,
                        station_id: row.get(2)?,
                        avg_max_temperature: row.get(3)?,
                        avg_min_temperature: row.get(4)?,
                        total_accumulated_precipitation: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(result)
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.db.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM results", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

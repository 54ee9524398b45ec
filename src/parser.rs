//! Station file parser
//!
//! Reads a tab-separated station file lazily, one `RawRow` at a time. The
//! station identifier is the file's base name without its extension. Rows
//! are not repaired: a wrong column count, a non-numeric field, or an
//! invalid date is returned as a parse error for the whole file.

use crate::constants::{RAW_DATE_FORMAT, STATION_FILE_COLUMNS, STATION_FILE_DELIMITER};
use crate::error::{PipelineError, Result};
use crate::models::RawRow;
use chrono::{Datelike, NaiveDate};
use csv::StringRecord;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Derive the station id from a station file path
pub fn station_id_from_path(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
        .ok_or_else(|| PipelineError::parse(path, 0, "cannot derive station id from file name"))
}

/// An open station file
#[derive(Debug)]
pub struct StationFile {
    path: PathBuf,
    station_id: String,
}

impl StationFile {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let station_id = station_id_from_path(&path)?;
        Ok(Self { path, station_id })
    }

    pub fn station_id(&self) -> &str {
        &self.station_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the file and return a lazy iterator over its rows
    pub fn rows(&self) -> Result<StationRows> {
        let file = File::open(&self.path)?;
        let reader = csv::ReaderBuilder::new()
            .delimiter(STATION_FILE_DELIMITER)
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        Ok(StationRows {
            path: self.path.clone(),
            records: reader.into_records(),
        })
    }
}

/// Lazy row iterator for one station file
pub struct StationRows {
    path: PathBuf,
    records: csv::StringRecordsIntoIter<File>,
}

impl Iterator for StationRows {
    type Item = Result<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some(match record {
            Ok(record) => parse_record(&self.path, &record),
            Err(source) => Err(PipelineError::Csv {
                path: self.path.clone(),
                source,
            }),
        })
    }
}

/// Decode one tab-separated record
fn parse_record(path: &Path, record: &StringRecord) -> Result<RawRow> {
    let line = record.position().map(|p| p.line()).unwrap_or(0);

    if record.len() != STATION_FILE_COLUMNS {
        return Err(PipelineError::parse(
            path,
            line,
            format!(
                "expected {} columns, found {}",
                STATION_FILE_COLUMNS,
                record.len()
            ),
        ));
    }

    let date = &record[0];
    let parsed_date = NaiveDate::parse_from_str(date, RAW_DATE_FORMAT)
        .ok()
        .filter(|_| date.len() == 8)
        .ok_or_else(|| {
            PipelineError::parse(path, line, format!("invalid date '{}' (expected YYYYMMDD)", date))
        })?;

    let field = |index: usize, name: &str| -> Result<i64> {
        record[index].parse::<i64>().map_err(|e| {
            PipelineError::parse(
                path,
                line,
                format!("invalid {} '{}' ({})", name, &record[index], e),
            )
        })
    };

    Ok(RawRow {
        date: date.to_string(),
        year: parsed_date.year(),
        month: parsed_date.month(),
        day: parsed_date.day(),
        raw_max_temperature: field(1, "max temperature")?,
        raw_min_temperature: field(2, "min temperature")?,
        raw_precipitation: field(3, "precipitation")?,
    })
}

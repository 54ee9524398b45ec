//! Dated aggregate report files
//!
//! Every successful aggregation run writes the full aggregate as
//! `results_<timestamp>_<seq>.json` in the results directory. The zero-padded
//! sequence orders reports written within the same millisecond, so the
//! greatest file name is the current report.

use crate::constants::{FILE_TIMESTAMP_FORMAT, REPORT_FILE_EXTENSION, REPORT_FILE_PREFIX};
use crate::error::Result;
use crate::models::AggregateReport;
use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

static REPORT_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Write a report snapshot and return its path
///
/// Never replaces an existing report: a name that is already taken moves on
/// to the next sequence number.
pub fn write_report(results_dir: &Path, report: &AggregateReport) -> Result<PathBuf> {
    fs::create_dir_all(results_dir)?;

    let (path, file) = loop {
        let sequence = REPORT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let file_name = format!(
            "{}{}_{:06}.{}",
            REPORT_FILE_PREFIX,
            Local::now().format(FILE_TIMESTAMP_FORMAT),
            sequence,
            REPORT_FILE_EXTENSION
        );
        let path = results_dir.join(file_name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => break (path, file),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    };

    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, report)?;
    writer.flush()?;

    debug!("Wrote aggregate report to {}", path.display());
    Ok(path)
}

/// Read one report file
pub fn read_report(path: &Path) -> Result<AggregateReport> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Path of the most recently dated report, if any
pub fn latest_report_path(results_dir: &Path) -> Result<Option<PathBuf>> {
    if !results_dir.exists() {
        return Ok(None);
    }

    let mut latest: Option<(String, PathBuf)> = None;
    for entry in fs::read_dir(results_dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        if !is_report_file_name(&name) {
            continue;
        }
        if latest.as_ref().is_none_or(|(current, _)| name > *current) {
            latest = Some((name, path));
        }
    }

    Ok(latest.map(|(_, path)| path))
}

/// The canonical current report and where it came from
pub fn latest_report(results_dir: &Path) -> Result<Option<(PathBuf, AggregateReport)>> {
    match latest_report_path(results_dir)? {
        Some(path) => {
            let report = read_report(&path)?;
            Ok(Some((path, report)))
        }
        None => Ok(None),
    }
}

fn is_report_file_name(name: &str) -> bool {
    name.starts_with(REPORT_FILE_PREFIX)
        && Path::new(name)
            .extension()
            .is_some_and(|ext| ext == REPORT_FILE_EXTENSION)
}

//! Per-run process log
//!
//! Each ingestion or aggregation run owns one `RunLog`: an append-only,
//! human-readable file under the log directory that records the run's
//! header, milestones, timings and any caught error. The log is a plain
//! value handed to the run, so concurrent runs never share logging state.
//! Lines are mirrored to `tracing` and the file is flushed on drop.

use crate::constants::{FILE_TIMESTAMP_FORMAT, LOG_BANNER, LOG_LINE_TIMESTAMP_FORMAT};
use crate::error::Result;
use chrono::Local;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{error, info, warn};

/// Distinguishes log files written by runs started in the same millisecond
static RUN_SEQUENCE: AtomicU64 = AtomicU64::new(0);

// ---------------------------------------------------------------------------
// Run kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Ingestion,
    Analytics,
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunKind::Ingestion => write!(f, "ingestion"),
            RunKind::Analytics => write!(f, "analytics"),
        }
    }
}

// ---------------------------------------------------------------------------
// Run log
// ---------------------------------------------------------------------------

pub struct RunLog {
    kind: RunKind,
    path: PathBuf,
    writer: LineWriter<File>,
}

impl RunLog {
    /// Open a fresh log file for one run and write the setup banner
    pub fn open(log_dir: &Path, kind: RunKind) -> Result<Self> {
        fs::create_dir_all(log_dir)?;

        let sequence = RUN_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let file_name = format!(
            "{}_{}_{}.log",
            kind,
            Local::now().format(FILE_TIMESTAMP_FORMAT),
            sequence
        );
        let path = log_dir.join(file_name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let mut log = Self {
            kind,
            path,
            writer: LineWriter::new(file),
        };
        log.info(format!("{} Logger setup complete {}", LOG_BANNER, LOG_BANNER));
        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> RunKind {
        self.kind
    }

    /// Record a milestone
    pub fn info(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        info!(run = %self.kind, "{}", message);
        self.append(message);
    }

    /// Record a caught failure
    pub fn error(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        error!(run = %self.kind, "{}", message);
        self.append(&format!("ERROR: {}", message));
    }

    /// Close the header block
    pub fn banner(&mut self) {
        self.append(&format!("{} {} {}", LOG_BANNER, "=".repeat(21), LOG_BANNER));
    }

    fn append(&mut self, message: &str) {
        let timestamp = Local::now().format(LOG_LINE_TIMESTAMP_FORMAT);
        if let Err(e) = writeln!(self.writer, "{}: {}", timestamp, message) {
            warn!("Failed to write to run log {}: {}", self.path.display(), e);
        }
    }
}

impl Drop for RunLog {
    fn drop(&mut self) {
        if let Err(e) = self.writer.flush() {
            warn!("Failed to flush run log {}: {}", self.path.display(), e);
        }
    }
}

impl fmt::Debug for RunLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunLog")
            .field("kind", &self.kind)
            .field("path", &self.path)
            .finish()
    }
}

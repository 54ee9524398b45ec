//! Durable record and result stores backed by SQLite.
//!
//! One `Database` owns a single connection behind a mutex and hands out two
//! cheap, clonable views:
//! - [`RecordStore`] - the `readings` table, keyed by `reading_id`
//! - [`ResultStore`] - the `results` table, keyed by `result_id`
//!
//! Both stores are append-only from the pipeline's point of view. Bulk
//! inserts run inside one transaction and use plain `INSERT`, so a duplicate
//! primary key fails the whole batch with [`PipelineError::DuplicateKey`]
//! and nothing from that batch is committed.

pub mod readings;
pub mod results;

pub use readings::{RecordStore, StationYearTotals};
pub use results::ResultStore;

use crate::error::{PipelineError, Result};
use rusqlite::{Connection, ErrorCode, ffi};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

/// Busy timeout for a connection shared by concurrent runs
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS readings (
        reading_id TEXT PRIMARY KEY NOT NULL,
        station_id TEXT NOT NULL,
        year INTEGER NOT NULL,
        month INTEGER NOT NULL,
        day INTEGER NOT NULL,
        max_temperature REAL,
        min_temperature REAL,
        precipitation REAL
    );
    CREATE INDEX IF NOT EXISTS idx_readings_year_station
        ON readings (year, station_id);
    CREATE TABLE IF NOT EXISTS results (
        result_id TEXT PRIMARY KEY NOT NULL,
        year INTEGER NOT NULL,
        station_id TEXT NOT NULL,
        avg_max_temperature REAL,
        avg_min_temperature REAL,
        total_accumulated_precipitation REAL
    );
";

/// Shared handle to the pipeline database
#[derive(Debug, Clone)]
pub struct Database {
    connection: Arc<Mutex<Connection>>,
    location: Option<PathBuf>,
}

impl Database {
    /// Open (or create) the database file and make sure both tables exist
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let connection = Connection::open(path)?;
        let mode: String =
            connection.pragma_update_and_check(None, "journal_mode", "wal", |row| row.get(0))?;
        debug!("Journal mode: {}", mode);
        connection.busy_timeout(BUSY_TIMEOUT)?;
        connection.execute_batch(SCHEMA)?;

        debug!("Opened database at {}", path.display());
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            location: Some(path.to_path_buf()),
        })
    }

    /// Private in-memory database, shared by all clones of the handle
    pub fn open_in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory()?;
        connection.execute_batch(SCHEMA)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            location: None,
        })
    }

    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    pub fn records(&self) -> RecordStore {
        RecordStore::new(self.clone())
    }

    pub fn results(&self) -> ResultStore {
        ResultStore::new(self.clone())
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| PipelineError::StoreUnavailable {
                reason: "database connection lock poisoned by a failed run".to_string(),
            })
    }
}

/// Map a failed insert into a duplicate-key error when a key constraint rejected it
///
/// Other constraint failures, such as NOT NULL, stay database errors.
pub(crate) fn map_insert_error(table: &'static str, err: rusqlite::Error) -> PipelineError {
    match err {
        rusqlite::Error::SqliteFailure(failure, message)
            if failure.code == ErrorCode::ConstraintViolation
                && matches!(
                    failure.extended_code,
                    ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE
                ) =>
        {
            PipelineError::DuplicateKey {
                table,
                message: message.unwrap_or_else(|| failure.to_string()),
            }
        }
        other => PipelineError::Database(other),
    }
}

//! Run-scoped reading membership set
//!
//! Loaded once from the record store at the start of a run. Ids staged
//! during the run are added immediately, so a reading repeated within the
//! same batch is kept only at its first occurrence in file-then-row order.

use crate::error::Result;
use crate::store::RecordStore;
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Default)]
pub struct SeenReadings {
    ids: HashSet<String>,
    preexisting: usize,
}

impl SeenReadings {
    /// Snapshot every reading id already stored
    pub fn load(records: &RecordStore) -> Result<Self> {
        let ids = records.reading_ids()?;
        let preexisting = ids.len();
        debug!("Loaded {} existing reading ids", preexisting);
        Ok(Self { ids, preexisting })
    }

    /// Record `reading_id` as seen; false when it was already stored or staged
    pub fn claim(&mut self, reading_id: &str) -> bool {
        !self.ids.contains(reading_id) && self.ids.insert(reading_id.to_string())
    }

    /// Number of ids present when the snapshot was loaded
    pub fn preexisting(&self) -> usize {
        self.preexisting
    }

    /// Number of ids claimed during this run
    pub fn staged(&self) -> usize {
        self.ids.len() - self.preexisting
    }
}

//! Log sources for traffic snapshots
//!
//! A log source returns the full event table each time it is asked.
//! Failures to read it are never fatal to the caller: `load_or_empty`
//! degrades to an empty table and logs a warning.

pub mod csv_source;

pub use csv_source::CsvLogSource;

use crate::models::EventTable;
use thiserror::Error;

/// Errors that can occur while reading a log source
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Log file not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(String),
}

/// Trait for anything that can produce a snapshot of the traffic log
pub trait LogSource {
    /// Read the current snapshot
    fn load(&self) -> Result<EventTable, SourceError>;

    /// Human-readable name of the source, used in log messages
    fn describe(&self) -> String;

    /// Read the current snapshot, substituting an empty table on failure
    fn load_or_empty(&self) -> EventTable {
        match self.load() {
            Ok(table) => table,
            Err(e) => {
                log::warn!("Could not load {}: {}", self.describe(), e);
                EventTable::empty()
            }
        }
    }
}

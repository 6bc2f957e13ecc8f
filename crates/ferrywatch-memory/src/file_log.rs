//! Plain-text transition log.
//!
//! Each transition becomes one line:
//!
//! ```text
//! 2025-05-22 00:03:10: MMSI 503123456 is ARRIVING at UQ terminal.
//! 2025-05-22 00:04:40: MMSI 503123456 is DEPARTING from UQ terminal.
//! ```

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use ferrywatch_core::EventLog;
use ferrywatch_types::{FerryError, Transition};

use crate::LogStoreError;

/// Timestamp layout used at the start of every line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render one log line without the trailing newline.
pub fn format_entry(timestamp: DateTime<Utc>, transition: &Transition) -> String {
    format!("{}: {transition}.", timestamp.format(TIMESTAMP_FORMAT))
}

/// [`EventLog`] appending to a text file, created on first write.
#[derive(Debug, Clone)]
pub struct FileEventLog {
    path: PathBuf,
}

impl FileEventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&self, line: &str) -> Result<(), LogStoreError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

impl EventLog for FileEventLog {
    fn append(&mut self, timestamp: DateTime<Utc>, transition: &Transition) -> Result<(), FerryError> {
        self.write_line(&format_entry(timestamp, transition))
            .map_err(FerryError::from)
    }
}

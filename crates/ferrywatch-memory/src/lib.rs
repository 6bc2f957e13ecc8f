//! `ferrywatch-memory` – durable audit trail of terminal transitions.
//!
//! # Modules
//!
//! - [`file_log`] – [`FileEventLog`][file_log::FileEventLog]: one human-readable
//!   line per transition appended to a text file (`FERRYLOG.txt`).
//! - [`sqlite_log`] – [`SqliteEventLog`][sqlite_log::SqliteEventLog]: queryable
//!   transition history in a local SQLite database.

use ferrywatch_types::FerryError;
use thiserror::Error;

pub mod file_log;
pub mod sqlite_log;

pub use file_log::FileEventLog;
pub use sqlite_log::{LogEntry, SqliteEventLog};

/// Errors raised by the audit log stores.
#[derive(Error, Debug)]
pub enum LogStoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Corrupt log entry: {0}")]
    Corrupt(String),
}

impl From<LogStoreError> for FerryError {
    fn from(e: LogStoreError) -> Self {
        FerryError::EventLog(e.to_string())
    }
}

//! SQLite transition history.
//!
//! # Storage layout
//!
//! A single table `transition_log` is created (if it does not already
//! exist):
//!
//! | column    | type    | description                          |
//! |-----------|---------|--------------------------------------|
//! | id        | TEXT    | UUID v4 primary key                  |
//! | timestamp | TEXT    | RFC-3339 transition time (UTC)       |
//! | zone      | TEXT    | Terminal name                        |
//! | mmsi      | INTEGER | Vessel identifier                    |
//! | direction | TEXT    | `arrival` or `departure`             |
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use ferrywatch_core::EventLog;
//! use ferrywatch_memory::SqliteEventLog;
//! use ferrywatch_types::{Transition, VehicleId};
//!
//! let mut log = SqliteEventLog::open_in_memory().unwrap();
//! log.append(Utc::now(), &Transition::arrival("UQ", VehicleId(111))).unwrap();
//!
//! let history = log.history(VehicleId(111)).unwrap();
//! assert_eq!(history.len(), 1);
//! ```

use chrono::{DateTime, Utc};
use ferrywatch_core::EventLog;
use ferrywatch_types::{Direction, FerryError, Transition, VehicleId};
use rusqlite::{Connection, params};
use tracing::debug;
use uuid::Uuid;

use crate::LogStoreError;

/// One persisted transition.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub transition: Transition,
}

fn direction_to_str(direction: Direction) -> &'static str {
    match direction {
        Direction::Arrival => "arrival",
        Direction::Departure => "departure",
    }
}

fn direction_from_str(s: &str) -> Result<Direction, LogStoreError> {
    match s {
        "arrival" => Ok(Direction::Arrival),
        "departure" => Ok(Direction::Departure),
        other => Err(LogStoreError::Corrupt(format!("unknown direction '{other}'"))),
    }
}

type RawRow = (String, String, String, u32, String);

/// SQLite-backed [`EventLog`].
pub struct SqliteEventLog {
    conn: Connection,
}

impl SqliteEventLog {
    /// Open (or create) a persistent database at `path`.
    pub fn open(path: &str) -> Result<Self, LogStoreError> {
        let conn = Connection::open(path)?;
        let log = Self { conn };
        log.init_schema()?;
        debug!(path, "transition log opened");
        Ok(log)
    }

    /// Open a temporary in-memory database (useful for testing).
    pub fn open_in_memory() -> Result<Self, LogStoreError> {
        let conn = Connection::open_in_memory()?;
        let log = Self { conn };
        log.init_schema()?;
        Ok(log)
    }

    fn init_schema(&self) -> Result<(), LogStoreError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS transition_log (
                id        TEXT NOT NULL PRIMARY KEY,
                timestamp TEXT NOT NULL,
                zone      TEXT NOT NULL,
                mmsi      INTEGER NOT NULL,
                direction TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS transition_log_mmsi ON transition_log (mmsi);",
        )?;
        Ok(())
    }

    /// Persist `transition` at `timestamp` and return the stored entry.
    pub fn record(
        &self,
        timestamp: DateTime<Utc>,
        transition: &Transition,
    ) -> Result<LogEntry, LogStoreError> {
        let entry = LogEntry {
            id: Uuid::new_v4(),
            timestamp,
            transition: transition.clone(),
        };
        self.conn.execute(
            "INSERT INTO transition_log (id, timestamp, zone, mmsi, direction)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.id.to_string(),
                entry.timestamp.to_rfc3339(),
                entry.transition.zone,
                entry.transition.vehicle.0,
                direction_to_str(entry.transition.direction),
            ],
        )?;
        Ok(entry)
    }

    /// Every transition of `vehicle`, oldest first.
    pub fn history(&self, vehicle: VehicleId) -> Result<Vec<LogEntry>, LogStoreError> {
        self.query(
            "SELECT id, timestamp, zone, mmsi, direction
             FROM transition_log
             WHERE mmsi = ?1
             ORDER BY timestamp ASC, rowid ASC",
            params![vehicle.0],
        )
    }

    /// The `limit` most recent transitions, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<LogEntry>, LogStoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.query(
            "SELECT id, timestamp, zone, mmsi, direction
             FROM transition_log
             ORDER BY timestamp DESC, rowid DESC
             LIMIT ?1",
            params![limit],
        )
    }

    /// Total number of stored transitions.
    pub fn count(&self) -> Result<usize, LogStoreError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM transition_log", [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    fn query(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<LogEntry>, LogStoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(Self::decode(row?)?);
        }
        Ok(entries)
    }

    fn decode((id, timestamp, zone, mmsi, direction): RawRow) -> Result<LogEntry, LogStoreError> {
        let id = Uuid::parse_str(&id).map_err(|e| LogStoreError::Corrupt(format!("id: {e}")))?;
        let timestamp = timestamp
            .parse::<DateTime<Utc>>()
            .map_err(|e| LogStoreError::Corrupt(format!("timestamp: {e}")))?;
        Ok(LogEntry {
            id,
            timestamp,
            transition: Transition {
                zone,
                vehicle: VehicleId(mmsi),
                direction: direction_from_str(&direction)?,
            },
        })
    }
}

impl EventLog for SqliteEventLog {
    fn append(&mut self, timestamp: DateTime<Utc>, transition: &Transition) -> Result<(), FerryError> {
        self.record(timestamp, transition)?;
        Ok(())
    }
}

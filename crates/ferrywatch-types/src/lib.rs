use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Stable identifier of a tracked vessel (its maritime MMSI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(pub u32);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for VehicleId {
    fn from(mmsi: u32) -> Self {
        Self(mmsi)
    }
}

/// A latitude/longitude pair in degrees.
///
/// Range is not validated; field nodes are trusted to report sane fixes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A circular geographic region whose membership triggers events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Human-readable terminal name, e.g. `"UQ"`.
    pub name: String,
    pub center: Coordinate,
    /// Membership radius in meters. A vessel exactly on the boundary is outside.
    pub radius_m: f64,
}

/// Radius used by the reference deployment.
pub const DEFAULT_RADIUS_M: f64 = 100.0;

impl Zone {
    pub fn new(name: impl Into<String>, center: Coordinate, radius_m: f64) -> Self {
        Self {
            name: name.into(),
            center,
            radius_m,
        }
    }

    /// The UQ St Lucia ferry terminal with the 100 m reference radius.
    pub fn uq_terminal() -> Self {
        Self::new(
            "UQ",
            Coordinate::new(-27.496776268829635, 153.0195395998301),
            DEFAULT_RADIUS_M,
        )
    }
}

/// An already-decoded position fix handed to the engine by the ingestion
/// collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    pub id: VehicleId,
    pub coord: Coordinate,
}

impl PositionReport {
    pub fn new(id: impl Into<VehicleId>, lat: f64, lon: f64) -> Self {
        Self {
            id: id.into(),
            coord: Coordinate::new(lat, lon),
        }
    }
}

/// Direction of a zone-membership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// `Far → Near`
    Arrival,
    /// `Near → Far`
    Departure,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Arrival => write!(f, "ARRIVING"),
            Direction::Departure => write!(f, "DEPARTING"),
        }
    }
}

/// A detected change in a vessel's membership of one zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// Name of the [`Zone`] the vessel entered or left.
    pub zone: String,
    pub vehicle: VehicleId,
    pub direction: Direction,
}

impl Transition {
    pub fn arrival(zone: impl Into<String>, vehicle: VehicleId) -> Self {
        Self {
            zone: zone.into(),
            vehicle,
            direction: Direction::Arrival,
        }
    }

    pub fn departure(zone: impl Into<String>, vehicle: VehicleId) -> Self {
        Self {
            zone: zone.into(),
            vehicle,
            direction: Direction::Departure,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preposition = match self.direction {
            Direction::Arrival => "at",
            Direction::Departure => "from",
        };
        write!(
            f,
            "MMSI {} is {} {} {} terminal",
            self.vehicle, self.direction, preposition, self.zone
        )
    }
}

/// Envelope for transitions published on the in-process event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub transition: Transition,
}

impl TerminalEvent {
    pub fn new(transition: Transition, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            transition,
        }
    }
}

/// Workspace-wide error type spanning registry, dispatch, and transport failures.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FerryError {
    #[error("Registry full: capacity of {capacity} vessels reached")]
    RegistryFull { capacity: usize },

    #[error("Unknown vessel: MMSI {0} is not tracked")]
    UnknownVehicle(VehicleId),

    #[error("Duplicate vessel: MMSI {0} is already tracked")]
    DuplicateVehicle(VehicleId),

    /// The transition was committed but at least one collaborator failed.
    #[error("Dispatch failed for {transition}: {reason}")]
    DispatchFailed { transition: Transition, reason: String },

    #[error("Notification Error: {0}")]
    Notification(String),

    #[error("Event Log Error: {0}")]
    EventLog(String),

    #[error("Transport Error: {0}")]
    Transport(String),

    #[error("Malformed Report: {0}")]
    MalformedReport(String),

    #[error("Channel Error: {0}")]
    Channel(String),
}

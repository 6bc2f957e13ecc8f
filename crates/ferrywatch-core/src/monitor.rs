//! [`TerminalMonitor`] – one [`ProximityEngine`] per named terminal.
//!
//! Each engine keeps its own registry, so a vessel counts against the
//! capacity of every terminal it is reported to.

use ferrywatch_types::{FerryError, PositionReport, Transition, VehicleId};

use crate::engine::ProximityEngine;

/// Result of feeding one report to one terminal.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneOutcome {
    pub zone: String,
    pub result: Result<Option<Transition>, FerryError>,
}

/// Fans every report out to a fixed set of terminal engines.
#[derive(Default)]
pub struct TerminalMonitor {
    engines: Vec<ProximityEngine>,
}

impl TerminalMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a terminal (builder-style).
    pub fn with_engine(mut self, engine: ProximityEngine) -> Self {
        self.engines.push(engine);
        self
    }

    pub fn add_engine(&mut self, engine: ProximityEngine) {
        self.engines.push(engine);
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Names of the monitored terminals in insertion order.
    pub fn zones(&self) -> impl Iterator<Item = &str> {
        self.engines.iter().map(|e| e.zone().name.as_str())
    }

    /// Feed `report` to every terminal, in insertion order.
    pub fn ingest(&mut self, report: PositionReport) -> Vec<ZoneOutcome> {
        self.engines
            .iter_mut()
            .map(|engine| ZoneOutcome {
                zone: engine.zone().name.clone(),
                result: engine.ingest(report),
            })
            .collect()
    }

    /// Membership of `id` at the terminal named `zone`.
    ///
    /// Returns `None` when the terminal is unknown or the vessel is untracked there.
    pub fn is_near(&self, zone: &str, id: VehicleId) -> Option<bool> {
        self.engines
            .iter()
            .find(|e| e.zone().name == zone)
            .and_then(|e| e.is_near(id))
    }
}

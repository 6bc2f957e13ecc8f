//! Two-state proximity machine (`Far` / `Near`) per tracked vessel.
//!
//! Each [`PositionReport`] is resolved against the [`VehicleRegistry`]:
//!
//! | Prior state | `distance < radius` | Emitted | New state |
//! |---|---|---|---|
//! | unseen | `true` | Arrival | `Near` |
//! | unseen | `false` | – | `Far` |
//! | `Far` | `true` | Arrival | `Near` |
//! | `Near` | `false` | Departure | `Far` |
//! | `Near` | `true` | – | `Near` |
//! | `Far` | `false` | – | `Far` |
//!
//! The first sighting is evaluated directly instead of assuming a `Far`
//! default, and an unchanged state never emits, so duplicate reports are
//! harmless.

use ferrywatch_types::{
    Coordinate, Direction, FerryError, PositionReport, Transition, VehicleId, Zone,
};
use tracing::{debug, warn};

use crate::geo::distance;
use crate::registry::{TrackedVehicle, VehicleRegistry};

/// Zone membership of one vessel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneState {
    Far,
    Near,
}

impl From<bool> for ZoneState {
    fn from(in_zone: bool) -> Self {
        if in_zone { ZoneState::Near } else { ZoneState::Far }
    }
}

/// Compare the stored membership with the freshly computed one.
///
/// Returns the direction of the flip, or `None` when nothing changed.
pub fn step(previous: ZoneState, currently_near: bool) -> Option<Direction> {
    match (previous, currently_near) {
        (ZoneState::Far, true) => Some(Direction::Arrival),
        (ZoneState::Near, false) => Some(Direction::Departure),
        _ => None,
    }
}

/// Returns `true` when `coord` lies strictly inside `zone`.
pub fn is_within(zone: &Zone, coord: Coordinate) -> bool {
    distance(coord, zone.center) < zone.radius_m
}

/// Owns the registry for a single zone and turns reports into transitions.
#[derive(Debug, Clone)]
pub struct ProximityTracker {
    zone: Zone,
    registry: VehicleRegistry,
}

impl ProximityTracker {
    pub fn new(zone: Zone, registry: VehicleRegistry) -> Self {
        Self { zone, registry }
    }

    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    pub fn registry(&self) -> &VehicleRegistry {
        &self.registry
    }

    /// Apply one report and return the transition it caused, if any.
    ///
    /// # Errors
    ///
    /// Returns [`FerryError::RegistryFull`] when the vessel is new and no
    /// slot is free. The report is dropped and nothing is mutated.
    pub fn observe(&mut self, report: PositionReport) -> Result<Option<Transition>, FerryError> {
        let currently_near = is_within(&self.zone, report.coord);

        let previous = match self.registry.find(report.id) {
            Some(vehicle) => ZoneState::from(vehicle.in_zone),
            None => return self.first_sighting(report, currently_near),
        };

        self.registry.update_position(report.id, report.coord)?;
        let Some(direction) = step(previous, currently_near) else {
            debug!(mmsi = %report.id, zone = %self.zone.name, near = currently_near, "no transition");
            return Ok(None);
        };
        if let Some(vehicle) = self.registry.find_mut(report.id) {
            vehicle.in_zone = currently_near;
        }
        Ok(Some(self.transition(report.id, direction)))
    }

    /// Current membership of `id`, or `None` if it has never been seen.
    pub fn is_near(&self, id: VehicleId) -> Option<bool> {
        self.registry.find(id).map(|v| v.in_zone)
    }

    fn first_sighting(
        &mut self,
        report: PositionReport,
        currently_near: bool,
    ) -> Result<Option<Transition>, FerryError> {
        let vehicle = TrackedVehicle::new(report.id, report.coord, currently_near);
        if let Err(e) = self.registry.insert(vehicle) {
            warn!(mmsi = %report.id, zone = %self.zone.name, error = %e, "report dropped");
            return Err(e);
        }
        debug!(mmsi = %report.id, zone = %self.zone.name, near = currently_near, "tracking new vessel");
        Ok(currently_near.then(|| self.transition(report.id, Direction::Arrival)))
    }

    fn transition(&self, vehicle: VehicleId, direction: Direction) -> Transition {
        Transition {
            zone: self.zone.name.clone(),
            vehicle,
            direction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_zone() -> Zone {
        Zone::new("UQ", Coordinate::new(-27.496776, 153.019540), 100.0)
    }

    fn tracker() -> ProximityTracker {
        ProximityTracker::new(scenario_zone(), VehicleRegistry::new())
    }

    const AT_TERMINAL: (f64, f64) = (-27.496776, 153.019540);
    const FAR_AWAY: (f64, f64) = (-27.50, 153.05);

    fn report(id: u32, (lat, lon): (f64, f64)) -> PositionReport {
        PositionReport::new(id, lat, lon)
    }

    #[test]
    fn step_table() {
        assert_eq!(step(ZoneState::Far, true), Some(Direction::Arrival));
        assert_eq!(step(ZoneState::Near, false), Some(Direction::Departure));
        assert_eq!(step(ZoneState::Near, true), None);
        assert_eq!(step(ZoneState::Far, false), None);
    }

    #[test]
    fn boundary_distance_is_not_near() {
        let center = Coordinate::new(0.0, 0.0);
        let edge = Coordinate::new(0.001, 0.0);
        let zone = Zone::new("edge", center, distance(edge, center));
        assert!(!is_within(&zone, edge));
    }

    #[test]
    fn scenario_arrival_departure_then_silence() {
        let mut t = tracker();

        let first = t.observe(report(111, AT_TERMINAL)).unwrap();
        assert_eq!(first, Some(Transition::arrival("UQ", VehicleId(111))));

        let second = t.observe(report(111, FAR_AWAY)).unwrap();
        assert_eq!(second, Some(Transition::departure("UQ", VehicleId(111))));

        let third = t.observe(report(111, FAR_AWAY)).unwrap();
        assert_eq!(third, None);
        assert_eq!(t.is_near(VehicleId(111)), Some(false));
    }

    #[test]
    fn first_sighting_outside_emits_nothing() {
        let mut t = tracker();
        assert_eq!(t.observe(report(7, FAR_AWAY)).unwrap(), None);
        assert_eq!(t.is_near(VehicleId(7)), Some(false));
    }

    #[test]
    fn repeated_near_reports_are_idempotent() {
        let mut t = tracker();
        t.observe(report(1, AT_TERMINAL)).unwrap();
        for _ in 0..5 {
            assert_eq!(t.observe(report(1, AT_TERMINAL)).unwrap(), None);
            assert_eq!(t.is_near(VehicleId(1)), Some(true));
        }
    }

    #[test]
    fn position_is_updated_even_without_transition() {
        let mut t = tracker();
        t.observe(report(1, FAR_AWAY)).unwrap();
        t.observe(report(1, (-27.6, 153.1))).unwrap();
        let stored = t.registry().find(VehicleId(1)).unwrap().last_known;
        assert_eq!(stored, Coordinate::new(-27.6, 153.1));
    }

    #[test]
    fn transitions_count_matches_flips() {
        let mut t = tracker();
        let path = [FAR_AWAY, AT_TERMINAL, AT_TERMINAL, FAR_AWAY, FAR_AWAY, AT_TERMINAL, FAR_AWAY];
        let emitted: Vec<Direction> = path
            .iter()
            .filter_map(|p| t.observe(report(9, *p)).unwrap())
            .map(|tr| tr.direction)
            .collect();
        assert_eq!(
            emitted,
            vec![
                Direction::Arrival,
                Direction::Departure,
                Direction::Arrival,
                Direction::Departure
            ]
        );
        for pair in emitted.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn full_registry_drops_new_vessel() {
        let mut t = ProximityTracker::new(scenario_zone(), VehicleRegistry::with_capacity(1));
        t.observe(report(1, AT_TERMINAL)).unwrap();

        let result = t.observe(report(2, AT_TERMINAL));
        assert_eq!(result, Err(FerryError::RegistryFull { capacity: 1 }));
        assert_eq!(t.is_near(VehicleId(2)), None);
        assert_eq!(t.is_near(VehicleId(1)), Some(true));
    }

    #[test]
    fn known_vessel_still_tracked_when_registry_full() {
        let mut t = ProximityTracker::new(scenario_zone(), VehicleRegistry::with_capacity(1));
        t.observe(report(1, AT_TERMINAL)).unwrap();
        let departed = t.observe(report(1, FAR_AWAY)).unwrap();
        assert_eq!(departed, Some(Transition::departure("UQ", VehicleId(1))));
    }

    #[test]
    fn unknown_vessel_has_no_state() {
        assert_eq!(tracker().is_near(VehicleId(123)), None);
    }
}

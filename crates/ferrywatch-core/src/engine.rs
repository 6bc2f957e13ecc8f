//! [`ProximityEngine`] – the single entry point for decoded position reports.
//!
//! `ingest` runs the whole resolve → evaluate → transition → dispatch
//! sequence synchronously. Wrap the engine in a [`SharedEngine`] when more
//! than one thread feeds reports; the lock is held for the full sequence.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ferrywatch_types::{FerryError, PositionReport, Transition, VehicleId, Zone};

use crate::dispatcher::EventDispatcher;
use crate::proximity::ProximityTracker;
use crate::registry::VehicleRegistry;

/// Tracks vessels against one zone and notifies collaborators of transitions.
///
/// # Example
///
/// ```
/// use ferrywatch_core::{EventDispatcher, ProximityEngine, VehicleRegistry};
/// use ferrywatch_types::{Direction, PositionReport, VehicleId, Zone};
///
/// let mut engine = ProximityEngine::new(
///     Zone::uq_terminal(),
///     VehicleRegistry::new(),
///     EventDispatcher::default(),
/// );
///
/// let arrived = engine
///     .ingest(PositionReport::new(111, -27.496776, 153.019540))
///     .unwrap()
///     .unwrap();
/// assert_eq!(arrived.direction, Direction::Arrival);
/// assert_eq!(engine.is_near(VehicleId(111)), Some(true));
/// ```
pub struct ProximityEngine {
    tracker: ProximityTracker,
    dispatcher: EventDispatcher,
}

impl ProximityEngine {
    pub fn new(zone: Zone, registry: VehicleRegistry, dispatcher: EventDispatcher) -> Self {
        Self {
            tracker: ProximityTracker::new(zone, registry),
            dispatcher,
        }
    }

    pub fn zone(&self) -> &Zone {
        self.tracker.zone()
    }

    pub fn registry(&self) -> &VehicleRegistry {
        self.tracker.registry()
    }

    /// Apply `report` and dispatch the resulting transition, if any.
    ///
    /// # Errors
    ///
    /// - [`FerryError::RegistryFull`] – the vessel is new and the registry is
    ///   full; the report is dropped with no mutation.
    /// - [`FerryError::DispatchFailed`] – the state change was committed but a
    ///   collaborator failed. The error carries the committed transition.
    pub fn ingest(&mut self, report: PositionReport) -> Result<Option<Transition>, FerryError> {
        let Some(transition) = self.tracker.observe(report)? else {
            return Ok(None);
        };
        self.dispatcher.dispatch(&transition)?;
        Ok(Some(transition))
    }

    /// Current zone membership of `id`, or `None` if it is not tracked.
    pub fn is_near(&self, id: VehicleId) -> Option<bool> {
        self.tracker.is_near(id)
    }
}

/// Thread-safe handle serialising every `ingest` behind one mutex.
#[derive(Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<ProximityEngine>>,
}

impl SharedEngine {
    pub fn new(engine: ProximityEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    pub fn ingest(&self, report: PositionReport) -> Result<Option<Transition>, FerryError> {
        self.lock().ingest(report)
    }

    pub fn is_near(&self, id: VehicleId) -> Option<bool> {
        self.lock().is_near(id)
    }

    // Registry updates finish before dispatch runs, so a poisoned lock still
    // guards consistent state.
    fn lock(&self) -> MutexGuard<'_, ProximityEngine> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::{EventLog, Notifier};
    use chrono::{DateTime, Utc};
    use ferrywatch_types::Direction;
    use std::thread;

    #[derive(Clone, Default)]
    struct RecordingNotifier {
        seen: Arc<Mutex<Vec<Transition>>>,
    }
    impl Notifier for RecordingNotifier {
        fn name(&self) -> &str {
            "recording"
        }
        fn notify(&self, transition: &Transition) -> Result<(), FerryError> {
            self.seen.lock().unwrap().push(transition.clone());
            Ok(())
        }
    }

    struct BrokenLog;
    impl EventLog for BrokenLog {
        fn append(&mut self, _: DateTime<Utc>, _: &Transition) -> Result<(), FerryError> {
            Err(FerryError::EventLog("disk full".into()))
        }
    }

    fn engine_with(notifier: &RecordingNotifier, capacity: usize) -> ProximityEngine {
        ProximityEngine::new(
            Zone::uq_terminal(),
            VehicleRegistry::with_capacity(capacity),
            EventDispatcher::default().with_notifier(Box::new(notifier.clone())),
        )
    }

    fn at_terminal(id: u32) -> PositionReport {
        PositionReport::new(id, -27.496776, 153.019540)
    }

    fn far_away(id: u32) -> PositionReport {
        PositionReport::new(id, -27.50, 153.05)
    }

    #[test]
    fn scenario_notifies_arrival_then_departure_only() {
        let notifier = RecordingNotifier::default();
        let mut engine = engine_with(&notifier, 4);

        engine.ingest(at_terminal(111)).unwrap();
        engine.ingest(far_away(111)).unwrap();
        engine.ingest(far_away(111)).unwrap();

        let seen = notifier.seen.lock().unwrap();
        let directions: Vec<_> = seen.iter().map(|t| t.direction).collect();
        assert_eq!(directions, vec![Direction::Arrival, Direction::Departure]);
    }

    #[test]
    fn first_sight_inside_yields_single_arrival() {
        let notifier = RecordingNotifier::default();
        let mut engine = engine_with(&notifier, 4);

        engine.ingest(at_terminal(3)).unwrap();
        engine.ingest(at_terminal(3)).unwrap();

        let seen = notifier.seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[Transition::arrival("UQ", VehicleId(3))]);
    }

    #[test]
    fn registry_full_drops_report_and_dispatches_nothing() {
        let notifier = RecordingNotifier::default();
        let mut engine = engine_with(&notifier, 1);
        engine.ingest(far_away(1)).unwrap();

        let result = engine.ingest(at_terminal(2));
        assert_eq!(result, Err(FerryError::RegistryFull { capacity: 1 }));
        assert!(notifier.seen.lock().unwrap().is_empty());
        assert_eq!(engine.is_near(VehicleId(1)), Some(false));
        assert_eq!(engine.registry().len(), 1);
    }

    #[test]
    fn dispatch_failure_keeps_committed_state() {
        let mut engine = ProximityEngine::new(
            Zone::uq_terminal(),
            VehicleRegistry::new(),
            EventDispatcher::default().with_log(Box::new(BrokenLog)),
        );

        let err = engine.ingest(at_terminal(9)).unwrap_err();
        assert!(matches!(err, FerryError::DispatchFailed { .. }));
        assert_eq!(engine.is_near(VehicleId(9)), Some(true));

        // The same fix again is a no-op, so the failure is not replayed.
        assert_eq!(engine.ingest(at_terminal(9)), Ok(None));
    }

    #[test]
    fn shared_engine_serialises_concurrent_reports() {
        let notifier = RecordingNotifier::default();
        let shared = SharedEngine::new(engine_with(&notifier, 4));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        let _ = shared.ingest(at_terminal(77));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(shared.is_near(VehicleId(77)), Some(true));
        assert_eq!(notifier.seen.lock().unwrap().len(), 1);
    }
}

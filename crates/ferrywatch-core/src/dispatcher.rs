//! [`EventDispatcher`] – fans a detected [`Transition`] out to collaborators.
//!
//! The dispatcher owns no tracking state. It forwards each transition to
//! every registered [`Notifier`] and appends one audit entry, stamped by the
//! injected [`Clock`], to every attached [`EventLog`]. Retries belong to the
//! collaborators; the dispatcher calls each one exactly once.

use chrono::{DateTime, Utc};
use ferrywatch_types::{Direction, FerryError, Transition, VehicleId};
use tracing::{info, warn};

/// Outbound delivery channel for transitions (HTTP push, in-process bus, …).
pub trait Notifier: Send {
    /// Short label used in logs and error messages, e.g. `"http"`.
    fn name(&self) -> &str;

    /// Deliver `transition`.
    ///
    /// # Errors
    ///
    /// Returns [`FerryError::Notification`] when the transition could not be
    /// handed off.
    fn notify(&self, transition: &Transition) -> Result<(), FerryError>;
}

/// Durable audit trail of transitions.
pub trait EventLog: Send {
    /// Append one entry.
    ///
    /// # Errors
    ///
    /// Returns [`FerryError::EventLog`] when the entry could not be persisted.
    fn append(&mut self, timestamp: DateTime<Utc>, transition: &Transition) -> Result<(), FerryError>;
}

/// Wall-clock source for audit timestamps.
pub trait Clock: Send {
    fn now(&self) -> DateTime<Utc>;
}

/// The host's UTC clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Routes transitions to notifiers and event logs.
///
/// # Example
///
/// ```
/// use ferrywatch_core::dispatcher::{EventDispatcher, SystemClock};
/// use ferrywatch_types::VehicleId;
///
/// // With no collaborators attached every dispatch trivially succeeds.
/// let mut dispatcher = EventDispatcher::new(Box::new(SystemClock));
/// assert!(dispatcher.on_arrival("UQ", VehicleId(111)).is_ok());
/// ```
pub struct EventDispatcher {
    notifiers: Vec<Box<dyn Notifier>>,
    logs: Vec<Box<dyn EventLog>>,
    clock: Box<dyn Clock>,
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(Box::new(SystemClock))
    }
}

impl EventDispatcher {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self {
            notifiers: Vec::new(),
            logs: Vec::new(),
            clock,
        }
    }

    /// Attach a notifier (builder-style). Notifiers are called in the order added.
    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    /// Attach an audit log (builder-style). All logs share one timestamp per transition.
    pub fn with_log(mut self, log: Box<dyn EventLog>) -> Self {
        self.logs.push(log);
        self
    }

    pub fn notifier_count(&self) -> usize {
        self.notifiers.len()
    }

    pub fn on_arrival(&mut self, zone: &str, id: VehicleId) -> Result<(), FerryError> {
        self.dispatch(&Transition::arrival(zone, id))
    }

    pub fn on_departure(&mut self, zone: &str, id: VehicleId) -> Result<(), FerryError> {
        self.dispatch(&Transition::departure(zone, id))
    }

    /// Deliver `transition` to every collaborator.
    ///
    /// Every collaborator is attempted even when an earlier one fails.
    ///
    /// # Errors
    ///
    /// Returns [`FerryError::DispatchFailed`] listing each failed
    /// collaborator. The transition itself is not undone.
    pub fn dispatch(&mut self, transition: &Transition) -> Result<(), FerryError> {
        match transition.direction {
            Direction::Arrival => {
                info!(mmsi = %transition.vehicle, zone = %transition.zone, "vessel arrived at terminal")
            }
            Direction::Departure => {
                info!(mmsi = %transition.vehicle, zone = %transition.zone, "vessel left terminal")
            }
        }

        let mut failures = Vec::new();
        for notifier in &self.notifiers {
            if let Err(e) = notifier.notify(transition) {
                warn!(notifier = notifier.name(), error = %e, "notification failed");
                failures.push(format!("{}: {e}", notifier.name()));
            }
        }
        if !self.logs.is_empty() {
            let timestamp = self.clock.now();
            for log in &mut self.logs {
                if let Err(e) = log.append(timestamp, transition) {
                    warn!(error = %e, "event log append failed");
                    failures.push(format!("log: {e}"));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(FerryError::DispatchFailed {
                transition: transition.clone(),
                reason: failures.join("; "),
            })
        }
    }
}

//! In-process broadcast bus for terminal transitions.
//!
//! Uses [`tokio::sync::broadcast`] so every subscriber sees every
//! [`TerminalEvent`] without a slow subscriber blocking the engine.
//! [`BusNotifier`] plugs the bus into the engine's dispatcher.

use chrono::Utc;
use ferrywatch_core::Notifier;
use ferrywatch_types::{FerryError, TerminalEvent, Transition};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Default channel capacity (number of buffered events before old ones are
/// dropped for slow subscribers).
const DEFAULT_CAPACITY: usize = 64;

/// Shared transition bus. Clones share the same underlying channel.
#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<TerminalEvent>,
}

impl EventBus {
    /// Create a bus buffering `capacity` events. A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish `event` to every subscriber.
    ///
    /// Returns the number of receivers handed the event.
    ///
    /// # Errors
    ///
    /// Returns [`FerryError::Channel`] when nobody is subscribed.
    pub fn publish(&self, event: TerminalEvent) -> Result<usize, FerryError> {
        self.sender
            .send(event)
            .map_err(|e| FerryError::Channel(format!("event bus send error: {e}")))
    }

    /// Subscribe to every transition.
    pub fn subscribe(&self) -> broadcast::Receiver<TerminalEvent> {
        self.sender.subscribe()
    }

    /// Subscribe to transitions of a single terminal.
    pub fn subscribe_zone(&self, zone: impl Into<String>) -> ZoneSubscriber {
        ZoneSubscriber {
            zone: zone.into(),
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// A subscriber that only yields events for one terminal.
pub struct ZoneSubscriber {
    zone: String,
    receiver: broadcast::Receiver<TerminalEvent>,
}

impl ZoneSubscriber {
    /// Wait for the next event at this subscriber's terminal.
    ///
    /// Returns `None` once the bus is closed.
    pub async fn recv(&mut self) -> Option<TerminalEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.transition.zone == self.zone => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(zone = %self.zone, lagged_by = n, "ZoneSubscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// [`Notifier`] that republishes transitions on an [`EventBus`].
///
/// Having no subscribers is normal and is not reported as a failure.
#[derive(Clone, Debug)]
pub struct BusNotifier {
    bus: EventBus,
}

impl BusNotifier {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }
}

impl Notifier for BusNotifier {
    fn name(&self) -> &str {
        "bus"
    }

    fn notify(&self, transition: &Transition) -> Result<(), FerryError> {
        if self.bus.subscriber_count() == 0 {
            debug!(mmsi = %transition.vehicle, "no bus subscribers");
            return Ok(());
        }
        self.bus
            .publish(TerminalEvent::new(transition.clone(), Utc::now()))
            .map(|_| ())
    }
}

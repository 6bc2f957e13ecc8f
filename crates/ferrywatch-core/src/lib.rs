//! `ferrywatch-core` – The Proximity Tracking Engine
//!
//! Converts a stream of decoded vessel position fixes into discrete
//! arrival/departure transitions at a fixed terminal zone. Nothing in this
//! crate performs I/O; transport, notification delivery, audit storage, and
//! clock access are injected collaborators.
//!
//! # Modules
//!
//! - [`geo`] – haversine great-circle distance, the sole source of nearness.
//! - [`registry`] – [`VehicleRegistry`][registry::VehicleRegistry]: fixed-capacity
//!   store of tracked vessels that rejects inserts once full.
//! - [`proximity`] – [`ProximityTracker`][proximity::ProximityTracker]: the
//!   `Far`/`Near` state machine that emits one transition per membership flip.
//! - [`dispatcher`] – [`EventDispatcher`][dispatcher::EventDispatcher] and the
//!   [`Notifier`][dispatcher::Notifier], [`EventLog`][dispatcher::EventLog],
//!   and [`Clock`][dispatcher::Clock] collaborator traits.
//! - [`engine`] – [`ProximityEngine`][engine::ProximityEngine], the `ingest`
//!   entry point, and the mutex-guarded [`SharedEngine`][engine::SharedEngine].
//! - [`monitor`] – [`TerminalMonitor`][monitor::TerminalMonitor]: one engine
//!   per named terminal.

pub mod dispatcher;
pub mod engine;
pub mod geo;
pub mod monitor;
pub mod proximity;
pub mod registry;

pub use dispatcher::{Clock, EventDispatcher, EventLog, Notifier, SystemClock};
pub use engine::{ProximityEngine, SharedEngine};
pub use monitor::{TerminalMonitor, ZoneOutcome};
pub use proximity::{ProximityTracker, ZoneState};
pub use registry::{TrackedVehicle, VehicleRegistry, DEFAULT_CAPACITY};

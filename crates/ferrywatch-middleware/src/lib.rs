//! `ferrywatch-middleware` – network-facing collaborators of the engine.
//!
//! # Modules
//!
//! - [`report`] – decodes the field node's `/ferry` JSON packets into
//!   [`PositionReport`][ferrywatch_types::PositionReport]s.
//! - [`http`] – [`HttpReportSource`][http::HttpReportSource] polling loop and
//!   the queue-backed [`HttpNotifier`][http::HttpNotifier] with retry.
//! - [`clock`] – [`ServerClock`][clock::ServerClock], a wall clock aligned
//!   with the server's `/rtc` reading.
//! - [`bus`] – Tokio broadcast [`EventBus`][bus::EventBus] and the
//!   [`BusNotifier`][bus::BusNotifier] that feeds it.

pub mod bus;
pub mod clock;
pub mod http;
pub mod report;

#[cfg(test)]
mod test_support;

pub use bus::{BusNotifier, EventBus, ZoneSubscriber};
pub use clock::ServerClock;
pub use http::{HttpNotifier, HttpReportSource, ReportSource, RetryPolicy};

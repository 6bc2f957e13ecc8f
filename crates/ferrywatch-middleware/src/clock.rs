//! [`ServerClock`] – wall clock corrected against the rig server.
//!
//! Field nodes have no battery-backed clock, so audit timestamps are
//! aligned with the server's `GET /rtc` reading:
//!
//! ```json
//! {"year":2025,"mon":5,"day":22,"hour":0,"min":0,"sec":0}
//! ```
//!
//! The month is 1-based. The difference to the local UTC clock is stored
//! once and applied to every later [`Clock::now`] call.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use ferrywatch_core::Clock;
use ferrywatch_types::FerryError;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
struct RtcPacket {
    year: i32,
    mon: u32,
    day: u32,
    hour: u32,
    min: u32,
    sec: u32,
}

/// Decode a `/rtc` body into a UTC timestamp.
///
/// # Errors
///
/// Returns [`FerryError::MalformedReport`] for invalid JSON or an
/// impossible calendar date.
pub fn decode_rtc(body: &str) -> Result<DateTime<Utc>, FerryError> {
    let rtc: RtcPacket = serde_json::from_str(body)
        .map_err(|e| FerryError::MalformedReport(format!("invalid rtc JSON: {e}")))?;
    NaiveDate::from_ymd_opt(rtc.year, rtc.mon, rtc.day)
        .and_then(|d| d.and_hms_opt(rtc.hour, rtc.min, rtc.sec))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            FerryError::MalformedReport(format!(
                "impossible rtc time {}-{}-{} {}:{}:{}",
                rtc.year, rtc.mon, rtc.day, rtc.hour, rtc.min, rtc.sec
            ))
        })
}

/// [`Clock`] that reports local UTC shifted by the last server offset.
///
/// Until [`ServerClock::sync_to`] is called the offset is zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerClock {
    offset: TimeDelta,
}

impl ServerClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Align the clock with a server reading taken just now.
    pub fn sync_to(&mut self, server_now: DateTime<Utc>) {
        self.offset = server_now - Utc::now();
        info!(offset_ms = self.offset.num_milliseconds(), "clock synchronised with server");
    }

    /// Fetch `GET {base_url}/rtc` and align the clock with it.
    ///
    /// # Errors
    ///
    /// Returns [`FerryError::Transport`] on network failure and
    /// [`FerryError::MalformedReport`] for an undecodable body. The previous
    /// offset is kept in both cases.
    pub async fn sync(&mut self, client: &reqwest::Client, base_url: &str) -> Result<(), FerryError> {
        let url = format!("{}/rtc", base_url.trim_end_matches('/'));
        let body = client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FerryError::Transport(format!("GET {url} failed: {e}")))?
            .text()
            .await
            .map_err(|e| FerryError::Transport(format!("reading {url} failed: {e}")))?;
        self.sync_to(decode_rtc(&body)?);
        Ok(())
    }

    pub fn offset(&self) -> TimeDelta {
        self.offset
    }
}

impl Clock for ServerClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now() + self.offset
    }
}

//! HTTP collaborators talking to the rig server.
//!
//! - [`HttpReportSource`] polls `GET /ferry` and decodes position packets.
//! - [`HttpNotifier`] posts transitions to `/arriving` and `/departing`.
//!
//! The engine calls notifiers synchronously, so [`HttpNotifier::notify`]
//! only enqueues; a background task owns delivery and its retry policy.

use std::time::Duration;

use async_trait::async_trait;
use ferrywatch_core::Notifier;
use ferrywatch_types::{Direction, FerryError, PositionReport, Transition};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::report::decode_packet;

/// Per-request timeout applied to every call to the rig server.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of transitions buffered for delivery.
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// Build the shared HTTP client used by every collaborator.
pub fn build_client() -> Result<reqwest::Client, FerryError> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| FerryError::Transport(format!("failed to build HTTP client: {e}")))
}

// ---------------------------------------------------------------------------
// Report source
// ---------------------------------------------------------------------------

/// Producer of decoded position reports.
#[async_trait]
pub trait ReportSource: Send {
    /// Fetch the next report, or `None` when no fresh fix is available.
    async fn next_report(&mut self) -> Result<Option<PositionReport>, FerryError>;
}

/// Polls the rig server's `/ferry` endpoint.
pub struct HttpReportSource {
    client: reqwest::Client,
    url: String,
}

impl HttpReportSource {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            url: format!("{}/ferry", base_url.trim_end_matches('/')),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ReportSource for HttpReportSource {
    async fn next_report(&mut self) -> Result<Option<PositionReport>, FerryError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FerryError::Transport(format!("GET {} failed: {e}", self.url)))?;
        // The node reports "no fix" inside the body, so non-2xx codes are
        // still handed to the decoder.
        let body = response
            .text()
            .await
            .map_err(|e| FerryError::Transport(format!("reading {} failed: {e}", self.url)))?;
        decode_packet(&body)
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Exponential backoff for transition delivery.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            initial_backoff: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        self.initial_backoff.saturating_mul(2u32.saturating_pow(retry))
    }
}

/// Server path for a transition direction.
pub fn endpoint(direction: Direction) -> &'static str {
    match direction {
        Direction::Arrival => "arriving",
        Direction::Departure => "departing",
    }
}

/// JSON body posted for a transition. The MMSI is sent as a string.
pub fn request_body(transition: &Transition) -> serde_json::Value {
    json!({ "mmsi": transition.vehicle.to_string() })
}

/// Non-blocking [`Notifier`] backed by a delivery task.
#[derive(Clone, Debug)]
pub struct HttpNotifier {
    queue: mpsc::Sender<Transition>,
}

impl HttpNotifier {
    /// Spawn the delivery task on the current Tokio runtime.
    ///
    /// The task runs until every `HttpNotifier` clone is dropped and the
    /// queue is drained. A `queue_capacity` of 0 is raised to 1.
    pub fn spawn(
        client: reqwest::Client,
        base_url: &str,
        queue_capacity: usize,
        policy: RetryPolicy,
    ) -> (Self, JoinHandle<()>) {
        let (queue, rx) = mpsc::channel(queue_capacity.max(1));
        let base_url = base_url.trim_end_matches('/').to_string();
        let worker = tokio::spawn(deliver_all(client, base_url, rx, policy));
        (Self { queue }, worker)
    }
}

impl Notifier for HttpNotifier {
    fn name(&self) -> &str {
        "http"
    }

    fn notify(&self, transition: &Transition) -> Result<(), FerryError> {
        self.queue.try_send(transition.clone()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                FerryError::Notification("delivery queue full".to_string())
            }
            mpsc::error::TrySendError::Closed(_) => {
                FerryError::Notification("delivery task stopped".to_string())
            }
        })
    }
}

async fn deliver_all(
    client: reqwest::Client,
    base_url: String,
    mut rx: mpsc::Receiver<Transition>,
    policy: RetryPolicy,
) {
    while let Some(transition) = rx.recv().await {
        if let Err(e) = deliver(&client, &base_url, &transition, policy).await {
            warn!(mmsi = %transition.vehicle, error = %e, "giving up on transition delivery");
        }
    }
    debug!("delivery task stopped");
}

/// POST one transition, retrying with exponential backoff.
pub async fn deliver(
    client: &reqwest::Client,
    base_url: &str,
    transition: &Transition,
    policy: RetryPolicy,
) -> Result<(), FerryError> {
    let url = format!("{base_url}/{}", endpoint(transition.direction));
    let body = request_body(transition);
    let mut last_error = String::new();

    for attempt in 0..policy.attempts.max(1) {
        if attempt > 0 {
            tokio::time::sleep(policy.backoff(attempt - 1)).await;
        }
        match client
            .post(&url)
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
        {
            Ok(_) => {
                info!(mmsi = %transition.vehicle, url = %url, "transition delivered");
                return Ok(());
            }
            Err(e) => {
                debug!(attempt, error = %e, "delivery attempt failed");
                last_error = e.to_string();
            }
        }
    }

    Err(FerryError::Notification(format!(
        "POST {url} failed after {} attempts: {last_error}",
        policy.attempts.max(1)
    )))
}

//! `ferrywatch-cli` – terminal node entry point
//!
//! This binary runs the central node of the ferry-terminal rig. It:
//!
//! 1. Loads `~/.ferrywatch/config.toml`, writing the defaults on first run.
//! 2. Aligns its audit clock with the rig server's `/rtc` endpoint.
//! 3. Polls `/ferry` for vessel fixes and feeds them to one proximity
//!    engine per configured terminal.
//! 4. Posts arrivals/departures back to the server, appends them to the
//!    audit logs, and prints them to the console.
//! 5. Stops cleanly on **Ctrl-C**, draining queued notifications.

mod config;

use colored::Colorize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use ferrywatch_core::{EventDispatcher, ProximityEngine, TerminalMonitor, VehicleRegistry, ZoneOutcome};
use ferrywatch_memory::{FileEventLog, SqliteEventLog};
use ferrywatch_middleware::http::{self, DEFAULT_QUEUE_CAPACITY};
use ferrywatch_middleware::{
    BusNotifier, EventBus, HttpNotifier, HttpReportSource, ReportSource, RetryPolicy, ServerClock,
};
use ferrywatch_types::{Direction, FerryError, TerminalEvent};

/// Upper bound on how long shutdown waits for queued notifications.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

fn main() {
    // ── Structured logging ────────────────────────────────────────────────
    // RUST_LOG sets the filter (default "info"); FERRYWATCH_LOG_FORMAT=json
    // switches to newline-delimited JSON.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("FERRYWATCH_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .compact()
            .init();
    }

    print_banner();

    // ── Shutdown flag ─────────────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping after the current poll …".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; graceful shutdown on Ctrl-C will not be available");
    }

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => match config::bootstrap() {
            Ok(cfg) => {
                println!(
                    "  {} Default config written to {}",
                    "✓".green().bold(),
                    config::config_path().display().to_string().bold()
                );
                cfg
            }
            Err(e) => {
                println!("{}: {}", "Error saving config".red(), e);
                let mut cfg = config::Config::default();
                config::apply_env_overrides(&mut cfg);
                cfg
            }
        },
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    };

    println!("  Rig server: {}", cfg.server_url.dimmed());
    for zone in &cfg.zones {
        println!(
            "  Watching {} ({:.6}, {:.6}) within {} m",
            zone.name.bold(),
            zone.lat,
            zone.lon,
            zone.radius_m
        );
    }
    println!();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to start Tokio runtime");
            std::process::exit(1);
        }
    };
    if let Err(e) = runtime.block_on(run(cfg, shutdown)) {
        error!(error = %e, "ferrywatch stopped");
        std::process::exit(1);
    }
    println!("{}", "  ✓ Exiting ferrywatch.".green());
}

// ─────────────────────────────────────────────────────────────────────────────
// Poll loop
// ─────────────────────────────────────────────────────────────────────────────

async fn run(cfg: config::Config, shutdown: Arc<AtomicBool>) -> Result<(), FerryError> {
    let client = http::build_client()?;

    let mut clock = ServerClock::new();
    if cfg.sync_clock
        && let Err(e) = clock.sync(&client, &cfg.server_url).await
    {
        warn!(error = %e, "clock sync failed; using local time for the audit log");
    }

    let bus = EventBus::default();
    let printer = tokio::spawn(print_transitions(bus.subscribe()));

    let (http_notifier, delivery) = if cfg.notify_http {
        let (notifier, worker) = HttpNotifier::spawn(
            client.clone(),
            &cfg.server_url,
            DEFAULT_QUEUE_CAPACITY,
            RetryPolicy::default(),
        );
        (Some(notifier), Some(worker))
    } else {
        (None, None)
    };

    let mut monitor = TerminalMonitor::new();
    for zone in cfg.zones() {
        let mut dispatcher = EventDispatcher::new(Box::new(clock))
            .with_notifier(Box::new(BusNotifier::new(bus.clone())));
        if let Some(notifier) = &http_notifier {
            dispatcher = dispatcher.with_notifier(Box::new(notifier.clone()));
        }
        dispatcher = dispatcher.with_log(Box::new(FileEventLog::new(&cfg.log_path)));
        if let Some(path) = &cfg.sqlite_path {
            dispatcher = dispatcher.with_log(Box::new(SqliteEventLog::open(path)?));
        }
        monitor.add_engine(ProximityEngine::new(
            zone,
            VehicleRegistry::with_capacity(cfg.registry_capacity),
            dispatcher,
        ));
    }
    info!(terminals = monitor.len(), capacity = cfg.registry_capacity, "monitor ready");

    let mut source = HttpReportSource::new(client, &cfg.server_url);
    let interval = Duration::from_millis(cfg.poll_interval_ms);
    while !shutdown.load(Ordering::SeqCst) {
        match source.next_report().await {
            Ok(Some(report)) => {
                debug!(mmsi = %report.id, lat = report.coord.lat, lon = report.coord.lon, "fix received");
                for outcome in monitor.ingest(report) {
                    log_outcome(&outcome);
                }
            }
            Ok(None) => debug!("no fresh fix"),
            Err(e) => warn!(url = source.url(), error = %e, "poll failed"),
        }
        tokio::time::sleep(interval).await;
    }

    // Dropping every sender lets the delivery task and printer finish.
    drop(monitor);
    drop(http_notifier);
    drop(bus);
    if let Some(worker) = delivery {
        match tokio::time::timeout(DRAIN_TIMEOUT, worker).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "delivery task failed"),
            Err(_) => warn!("pending notifications abandoned at shutdown"),
        }
    }
    if let Err(e) = printer.await {
        warn!(error = %e, "console printer task failed");
    }
    Ok(())
}

fn log_outcome(outcome: &ZoneOutcome) {
    match &outcome.result {
        Ok(Some(_)) | Ok(None) => {}
        Err(FerryError::RegistryFull { capacity }) => {
            warn!(zone = %outcome.zone, capacity, "registry full; report dropped");
        }
        Err(FerryError::DispatchFailed { transition, reason }) => {
            warn!(zone = %outcome.zone, mmsi = %transition.vehicle, reason = %reason, "transition recorded but not fully delivered");
        }
        Err(e) => warn!(zone = %outcome.zone, error = %e, "report rejected"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Console output
// ─────────────────────────────────────────────────────────────────────────────

async fn print_transitions(mut rx: broadcast::Receiver<TerminalEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => println!("{}", transition_line(&event)),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(lagged_by = n, "console fell behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn transition_line(event: &TerminalEvent) -> String {
    let t = &event.transition;
    let stamp = event.timestamp.format("%H:%M:%S").to_string();
    match t.direction {
        Direction::Arrival => format!(
            "  {} {} Ferry {} has arrived at {}",
            stamp.dimmed(),
            "▶".green().bold(),
            t.vehicle.to_string().bold(),
            t.zone
        ),
        Direction::Departure => format!(
            "  {} {} Ferry {} has left {}",
            stamp.dimmed(),
            "◀".yellow().bold(),
            t.vehicle.to_string().bold(),
            t.zone
        ),
    }
}

fn print_banner() {
    println!();
    println!("{}", "  ~~~~ ferrywatch ~~~~".bold().cyan());
    println!(
        "  {} {}",
        "ferrywatch".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Ferry terminal arrival/departure monitor");
    println!();
}

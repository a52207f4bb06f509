//! unitwatch - exports service unit states to a Prometheus Pushgateway
//!
//! Reads unit property-change notifications as JSON lines on stdin, keeps the
//! latest `ActiveState` per unit and pushes a `service_state` gauge to the
//! gateway, either periodically or after every state change.
//!
//! # Usage
//! ```sh
//! unit-bridge | PUSHGATEWAY_URL=http://gw:9091 unitwatch --mode per-event
//! ```
//!
//! # Environment Variables
//! - `PUSHGATEWAY_URL`, `PUSHGATEWAY_JOB`, `PUSHGATEWAY_INSTANCE` - push target
//! - `EXPORT_MODE` - `periodic` (default) or `per-event`
//! - `EXPORT_INTERVAL_SECS` - periodic push interval (default: 15)
//! - `PUSH_SCOPE`, `PUSH_MAX_RETRIES`, `PUSH_TIMEOUT_SECS`, `EXPORTER_SELF_METRICS`
//!
//! Sending SIGUSR1 pushes the current snapshot immediately.

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{Level, error, info};
use tracing_subscriber::prelude::*;
use unitwatch::application::coordinator::{Coordinator, CoordinatorCommand};
use unitwatch::application::state_store::StateStore;
use unitwatch::config::Config;
use unitwatch::infrastructure::observability::Metrics;
use unitwatch::infrastructure::{HttpPusher, JsonLinesBus};

#[derive(Parser, Debug)]
#[command(author, version, about = "Push service unit states to a Prometheus Pushgateway", long_about = None)]
struct Cli {
    /// Gateway base URL (overrides PUSHGATEWAY_URL)
    #[arg(long)]
    gateway_url: Option<String>,

    /// Job label (overrides PUSHGATEWAY_JOB)
    #[arg(long)]
    job: Option<String>,

    /// Instance label (overrides PUSHGATEWAY_INSTANCE)
    #[arg(long)]
    instance: Option<String>,

    /// Export mode: periodic or per-event (overrides EXPORT_MODE)
    #[arg(short, long)]
    mode: Option<String>,

    /// Periodic push interval in seconds (overrides EXPORT_INTERVAL_SECS)
    #[arg(short, long)]
    interval: Option<u64>,

    /// Per-event payload: full or unit (overrides PUSH_SCOPE)
    #[arg(long)]
    scope: Option<String>,
}

impl Cli {
    fn overrides(&self) -> HashMap<&'static str, String> {
        let mut overrides = HashMap::new();
        let mut set = |key: &'static str, value: Option<String>| {
            if let Some(value) = value {
                overrides.insert(key, value);
            }
        };

        set("PUSHGATEWAY_URL", self.gateway_url.clone());
        set("PUSHGATEWAY_JOB", self.job.clone());
        set("PUSHGATEWAY_INSTANCE", self.instance.clone());
        set("EXPORT_MODE", self.mode.clone());
        set("EXPORT_INTERVAL_SECS", self.interval.map(|secs| secs.to_string()));
        set("PUSH_SCOPE", self.scope.clone());
        overrides
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    let cli = Cli::parse();
    let overrides = cli.overrides();
    let config = Config::from_lookup(&|key: &str| {
        overrides
            .get(key)
            .cloned()
            .or_else(|| env::var(key).ok())
    })?;

    info!("unitwatch {} starting...", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded: Gateway={}, Job={}, Instance={}, Mode={}, Interval={:?}",
        config.gateway_url, config.job, config.instance, config.export_mode, config.export_interval
    );

    let metrics = Metrics::new().context("Failed to register exporter metrics")?;
    let pusher = HttpPusher::new(config.push_timeout).context("Failed to build HTTP client")?;
    let bus = JsonLinesBus::new(
        tokio::io::BufReader::new(tokio::io::stdin()),
        config.bus_channel_capacity,
    );

    let (cmd_tx, cmd_rx) = mpsc::channel(8);
    let coordinator = Coordinator::new(
        Arc::new(bus),
        Arc::new(StateStore::new()),
        Arc::new(pusher),
        config.to_push_target(),
        config.to_export_policy(),
        config.to_retry_policy(),
        metrics,
        Some(cmd_rx),
    );

    spawn_signal_forwarding(cmd_tx);

    // The stdin reader blocks a runtime thread and cannot be cancelled, so
    // exit explicitly instead of waiting for runtime shutdown.
    match coordinator.run().await {
        Ok(()) => {
            info!("Shutdown complete.");
            std::process::exit(0);
        }
        Err(e) => {
            error!("Fatal: {}", e);
            std::process::exit(1);
        }
    }
}

/// Ctrl+C requests shutdown; SIGUSR1 requests an immediate push.
fn spawn_signal_forwarding(cmd_tx: mpsc::Sender<CoordinatorCommand>) {
    let (flush_tx, flush_rx) = mpsc::channel(1);
    forward_flush_signal(flush_tx);

    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
    };
    tokio::spawn(relay_signals(interrupt, flush_rx, cmd_tx));
}

#[cfg(unix)]
fn forward_flush_signal(flush_tx: mpsc::Sender<()>) {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::user_defined1()) {
        Ok(mut usr1) => {
            tokio::spawn(async move {
                while usr1.recv().await.is_some() {
                    if flush_tx.send(()).await.is_err() {
                        return;
                    }
                }
            });
        }
        Err(e) => error!("Failed to install SIGUSR1 handler: {}", e),
    }
}

#[cfg(not(unix))]
fn forward_flush_signal(_flush_tx: mpsc::Sender<()>) {}

/// Turns flush requests into `Flush` commands until `interrupt` resolves,
/// then sends `Shutdown`.
///
/// `interrupt` is created once and raced against every pending send, so an
/// interrupt is seen even while the command channel is full.
async fn relay_signals(
    interrupt: impl Future<Output = ()>,
    mut flushes: mpsc::Receiver<()>,
    cmd_tx: mpsc::Sender<CoordinatorCommand>,
) {
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            biased;

            _ = &mut interrupt => break,

            flush = flushes.recv() => match flush {
                Some(()) => {
                    info!("SIGUSR1 received, pushing snapshot.");
                    tokio::select! {
                        biased;

                        _ = &mut interrupt => break,
                        sent = cmd_tx.send(CoordinatorCommand::Flush) => {
                            if sent.is_err() {
                                return;
                            }
                        }
                    }
                }
                None => {
                    (&mut interrupt).await;
                    break;
                }
            }
        }
    }

    info!("Shutdown signal received. Exiting...");
    let _ = cmd_tx.send(CoordinatorCommand::Shutdown).await;
}

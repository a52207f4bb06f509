use crate::application::push_retry::PushRetryPolicy;
use crate::application::serializer;
use crate::application::state_store::StateStore;
use crate::domain::errors::{BusError, CoordinatorError};
use crate::domain::export_policy::{ExportMode, ExportPolicy, PushScope};
use crate::domain::ports::{BusSubscription, MetricsPusher, PropertiesUpdate, UnitBus};
use crate::domain::push_target::PushTarget;
use crate::infrastructure::observability::Metrics;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::mpsc::Receiver;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorCommand {
    /// Close the subscription and stop after the current turn
    Shutdown,
    /// Push the full snapshot now, regardless of export mode
    Flush,
}

/// Single control loop: bus notifications in, gateway pushes out.
///
/// Renders and pushes run inside the loop's own turn, so at most one push
/// is in flight and payloads reach the gateway in trigger order.
pub struct Coordinator {
    bus: Arc<dyn UnitBus>,
    store: Arc<StateStore>,
    pusher: Arc<dyn MetricsPusher>,
    target: PushTarget,
    policy: ExportPolicy,
    retry: PushRetryPolicy,
    metrics: Metrics,
    cmd_rx: Option<Receiver<CoordinatorCommand>>,
}

impl Coordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bus: Arc<dyn UnitBus>,
        store: Arc<StateStore>,
        pusher: Arc<dyn MetricsPusher>,
        target: PushTarget,
        policy: ExportPolicy,
        retry: PushRetryPolicy,
        metrics: Metrics,
        cmd_rx: Option<Receiver<CoordinatorCommand>>,
    ) -> Self {
        Self {
            bus,
            store,
            pusher,
            target,
            policy,
            retry,
            metrics,
            cmd_rx,
        }
    }

    /// Run until shutdown (`Ok`) or until the subscription fails or dies (`Err`).
    pub async fn run(mut self) -> Result<(), CoordinatorError> {
        let BusSubscription {
            mut updates,
            mut errors,
        } = self.bus.subscribe().await?;

        info!(
            "Coordinator: Subscribed to unit notifications (mode: {}, job: {}, instance: {})",
            self.policy.mode,
            self.target.job(),
            self.target.instance()
        );

        let mut ticker = match self.policy.mode {
            ExportMode::Periodic => {
                let period = self.policy.interval;
                let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                Some(ticker)
            }
            ExportMode::PerEvent => None,
        };
        let mut cmd_rx = self.cmd_rx.take();
        let mut errors_open = true;

        loop {
            tokio::select! {
                // Bus errors first so a dead subscription is noticed before
                // queued updates; queued updates before timer and commands.
                biased;

                maybe_error = errors.recv(), if errors_open => {
                    match maybe_error {
                        Some(err) => self.handle_bus_error(err)?,
                        None => {
                            debug!("Coordinator: Bus error stream closed");
                            errors_open = false;
                        }
                    }
                }

                maybe_update = updates.recv() => {
                    match maybe_update {
                        Some(update) => self.handle_update(update).await,
                        None => {
                            error!("Coordinator: Update stream closed, bus subscription is gone");
                            return Err(CoordinatorError::SubscriptionLost {
                                reason: "update stream closed".to_string(),
                            });
                        }
                    }
                }

                _ = next_tick(&mut ticker) => {
                    self.export_snapshot().await;
                }

                maybe_cmd = next_command(&mut cmd_rx) => {
                    match maybe_cmd {
                        Some(CoordinatorCommand::Shutdown) => {
                            info!("Coordinator: Shutdown requested, closing subscription");
                            break;
                        }
                        Some(CoordinatorCommand::Flush) => self.export_snapshot().await,
                        None => cmd_rx = None,
                    }
                }
            }
        }

        drop(updates);
        drop(errors);
        drop(ticker);
        info!(
            "Coordinator stopped with {} tracked units.\n{}",
            self.store.len(),
            self.metrics.render()
        );
        Ok(())
    }

    async fn handle_update(&self, update: PropertiesUpdate) {
        let Some(raw_state) = update.active_state() else {
            debug!(
                "Coordinator: No ActiveState in update for {}, skipping",
                update.unit_name
            );
            self.metrics.inc_update("no_active_state");
            return;
        };

        match self.store.update(&update.unit_name, raw_state) {
            Ok(true) => {
                self.metrics.inc_update("changed");
                self.metrics.tracked_units.set(self.store.len() as i64);
                debug!("Coordinator: {} is now {}", update.unit_name, raw_state);

                if self.policy.mode == ExportMode::PerEvent {
                    self.export_changed(&update.unit_name).await;
                }
            }
            Ok(false) => self.metrics.inc_update("unchanged"),
            Err(e) => {
                self.metrics.inc_update("unknown_state");
                warn!(
                    "Coordinator: Dropping update for {}: {}",
                    update.unit_name, e
                );
            }
        }
    }

    fn handle_bus_error(&self, err: BusError) -> Result<(), CoordinatorError> {
        self.metrics.bus_errors_total.inc();
        match err {
            BusError::SubscriptionLost { reason } => {
                error!("Coordinator: Bus subscription lost: {}", reason);
                Err(CoordinatorError::SubscriptionLost { reason })
            }
            BusError::Transport { reason } => {
                warn!("Coordinator: Error from bus: {}", reason);
                Ok(())
            }
        }
    }

    async fn export_snapshot(&self) {
        let payload = serializer::render(&self.store.snapshot());
        self.deliver(&self.target, payload).await;
    }

    async fn export_changed(&self, unit_name: &str) {
        match self.policy.scope {
            PushScope::Full => self.export_snapshot().await,
            PushScope::Unit => {
                if let Some(unit) = self.store.get(unit_name) {
                    let target = self.target.for_unit(unit_name);
                    self.deliver(&target, serializer::render_unit(&unit)).await;
                }
            }
        }
    }

    async fn deliver(&self, target: &PushTarget, mut payload: String) {
        if self.policy.include_self_metrics {
            payload.push_str(&self.metrics.render());
        }

        let started_at = SystemTime::now();
        let mut past_retries = 0;
        loop {
            match self.pusher.push(target, payload.clone()).await {
                Ok(()) => {
                    self.metrics.inc_push("success");
                    return;
                }
                Err(e) => {
                    self.metrics.inc_push("failure");
                    let Some(delay) = self.retry.next_delay(started_at, past_retries) else {
                        warn!("Coordinator: Failed to push to gateway: {}", e);
                        return;
                    };
                    past_retries += 1;
                    warn!(
                        "Coordinator: Push attempt {} failed, retrying in {:?}: {}",
                        past_retries, delay, e
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn next_command(
    cmd_rx: &mut Option<Receiver<CoordinatorCommand>>,
) -> Option<CoordinatorCommand> {
    match cmd_rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

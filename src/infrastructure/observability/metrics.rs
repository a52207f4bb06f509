//! Prometheus metrics describing the exporter itself.
//!
//! All metrics use the `unitwatch_` prefix.

use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Self-observability counters for the export pipeline
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Bus notifications by outcome (changed, unchanged, unknown_state, no_active_state)
    pub updates_total: IntCounterVec,
    /// Push attempts by outcome (success, failure)
    pub pushes_total: IntCounterVec,
    /// Errors received on the bus error stream
    pub bus_errors_total: IntCounter,
    /// Units currently held in the state store
    pub tracked_units: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let updates_total = IntCounterVec::new(
            Opts::new(
                "unitwatch_updates_total",
                "Bus property notifications by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(updates_total.clone()))?;

        let pushes_total = IntCounterVec::new(
            Opts::new("unitwatch_pushes_total", "Gateway push attempts by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(pushes_total.clone()))?;

        let bus_errors_total = IntCounter::with_opts(Opts::new(
            "unitwatch_bus_errors_total",
            "Errors reported by the bus subscription",
        ))?;
        registry.register(Box::new(bus_errors_total.clone()))?;

        let tracked_units = IntGauge::with_opts(Opts::new(
            "unitwatch_tracked_units",
            "Units with a known state",
        ))?;
        registry.register(Box::new(tracked_units.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            updates_total,
            pushes_total,
            bus_errors_total,
            tracked_units,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn inc_update(&self, outcome: &str) {
        self.updates_total.with_label_values(&[outcome]).inc();
    }

    pub fn inc_push(&self, outcome: &str) {
        self.pushes_total.with_label_values(&[outcome]).inc();
    }

    pub fn update_count(&self, outcome: &str) -> u64 {
        self.updates_total.with_label_values(&[outcome]).get()
    }

    pub fn push_count(&self, outcome: &str) -> u64 {
        self.pushes_total.with_label_values(&[outcome]).get()
    }
}

//! Export trigger and retry configuration parsing from environment variables.

use super::{Lookup, parse_var};
use crate::domain::export_policy::{ExportMode, PushScope};
use anyhow::{Result, ensure};
use std::time::Duration;

/// Export environment configuration
#[derive(Debug, Clone)]
pub struct ExportEnvConfig {
    pub mode: ExportMode,
    pub interval: Duration,
    pub scope: PushScope,
    pub include_self_metrics: bool,

    // Retry
    pub max_retries: u32,
    pub retry_min_delay: Duration,
    pub retry_max_delay: Duration,

    // Bus adapter
    pub bus_channel_capacity: usize,
}

impl ExportEnvConfig {
    pub fn from_lookup(lookup: &Lookup<'_>) -> Result<Self> {
        let mode: ExportMode = parse_var(lookup, "EXPORT_MODE", ExportMode::Periodic)?;
        let interval_secs: u64 = parse_var(lookup, "EXPORT_INTERVAL_SECS", 15)?;
        ensure!(interval_secs > 0, "EXPORT_INTERVAL_SECS must be positive");

        let scope: PushScope = parse_var(lookup, "PUSH_SCOPE", PushScope::Full)?;
        let include_self_metrics: bool = parse_var(lookup, "EXPORTER_SELF_METRICS", false)?;

        let max_retries: u32 = parse_var(lookup, "PUSH_MAX_RETRIES", 0)?;
        let retry_min_ms: u64 = parse_var(lookup, "PUSH_RETRY_MIN_MS", 500)?;
        let retry_max_ms: u64 = parse_var(lookup, "PUSH_RETRY_MAX_MS", 5000)?;
        ensure!(
            retry_min_ms <= retry_max_ms,
            "PUSH_RETRY_MIN_MS ({}) must not exceed PUSH_RETRY_MAX_MS ({})",
            retry_min_ms,
            retry_max_ms
        );

        let bus_channel_capacity: usize = parse_var(lookup, "BUS_CHANNEL_CAPACITY", 256)?;
        ensure!(bus_channel_capacity > 0, "BUS_CHANNEL_CAPACITY must be positive");

        Ok(Self {
            mode,
            interval: Duration::from_secs(interval_secs),
            scope,
            include_self_metrics,
            max_retries,
            retry_min_delay: Duration::from_millis(retry_min_ms),
            retry_max_delay: Duration::from_millis(retry_max_ms),
            bus_channel_capacity,
        })
    }
}

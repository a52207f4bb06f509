//! Configuration module for unitwatch.
//!
//! Configuration is loaded from environment variables (optionally seeded from
//! a `.env` file by the binary), organized by concern: Gateway and Export.

mod export_config;
mod gateway_config;

pub use export_config::ExportEnvConfig;
pub use gateway_config::GatewayEnvConfig;

pub use crate::domain::export_policy::{ExportMode, ExportPolicy, PushScope};
use crate::application::push_retry::PushRetryPolicy;
use crate::domain::push_target::PushTarget;
use anyhow::{Context, Result, anyhow};
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Source of configuration values, keyed by variable name
pub type Lookup<'a> = dyn Fn(&str) -> Option<String> + 'a;

/// Parse `key` with `FromStr`, falling back to `default` when unset or blank
pub(crate) fn parse_var<T>(lookup: &Lookup<'_>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("Failed to parse {}={}: {}", key, raw, e)),
        _ => Ok(default),
    }
}

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    // Gateway (from GatewayEnvConfig)
    pub gateway_url: Url,
    pub job: String,
    pub instance: String,
    pub push_timeout: Duration,

    // Export (from ExportEnvConfig)
    pub export_mode: ExportMode,
    pub export_interval: Duration,
    pub push_scope: PushScope,
    pub include_self_metrics: bool,
    pub push_max_retries: u32,
    pub push_retry_min_delay: Duration,
    pub push_retry_max_delay: Duration,
    pub bus_channel_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key: &str| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key/value source.
    pub fn from_lookup(lookup: &Lookup<'_>) -> Result<Self> {
        let gateway =
            GatewayEnvConfig::from_lookup(lookup).context("Failed to load gateway config")?;
        let export = ExportEnvConfig::from_lookup(lookup).context("Failed to load export config")?;

        Ok(Self {
            gateway_url: gateway.url,
            job: gateway.job,
            instance: gateway.instance,
            push_timeout: gateway.push_timeout,

            export_mode: export.mode,
            export_interval: export.interval,
            push_scope: export.scope,
            include_self_metrics: export.include_self_metrics,
            push_max_retries: export.max_retries,
            push_retry_min_delay: export.retry_min_delay,
            push_retry_max_delay: export.retry_max_delay,
            bus_channel_capacity: export.bus_channel_capacity,
        })
    }

    pub fn to_push_target(&self) -> PushTarget {
        PushTarget::new(self.gateway_url.clone(), &self.job, &self.instance)
    }

    pub fn to_export_policy(&self) -> ExportPolicy {
        ExportPolicy {
            mode: self.export_mode,
            interval: self.export_interval,
            scope: self.push_scope,
            include_self_metrics: self.include_self_metrics,
        }
    }

    pub fn to_retry_policy(&self) -> PushRetryPolicy {
        PushRetryPolicy::new(
            self.push_max_retries,
            self.push_retry_min_delay,
            self.push_retry_max_delay,
        )
    }
}

/// Lookup over a fixed set of variables
#[cfg(test)]
pub(crate) fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
    let vars: std::collections::HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

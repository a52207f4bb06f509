//! Gateway configuration parsing from environment variables.
//!
//! Covers where payloads are pushed and how each request is bounded.

use super::{Lookup, parse_var};
use anyhow::{Context, Result, ensure};
use std::time::Duration;
use url::Url;

/// Pushgateway environment configuration
#[derive(Debug, Clone)]
pub struct GatewayEnvConfig {
    pub url: Url,
    pub job: String,
    pub instance: String,
    pub push_timeout: Duration,
}

impl GatewayEnvConfig {
    pub fn from_lookup(lookup: &Lookup<'_>) -> Result<Self> {
        let raw_url =
            lookup("PUSHGATEWAY_URL").unwrap_or_else(|| "http://localhost:9091".to_string());
        let url = Url::parse(&raw_url)
            .with_context(|| format!("Invalid PUSHGATEWAY_URL: {}", raw_url))?;
        ensure!(
            matches!(url.scheme(), "http" | "https"),
            "PUSHGATEWAY_URL must use http or https, got {}",
            url.scheme()
        );

        let job = lookup("PUSHGATEWAY_JOB").unwrap_or_else(|| "top".to_string());
        let instance = lookup("PUSHGATEWAY_INSTANCE").unwrap_or_else(|| "machine".to_string());
        ensure!(!job.trim().is_empty(), "PUSHGATEWAY_JOB must not be empty");
        ensure!(
            !instance.trim().is_empty(),
            "PUSHGATEWAY_INSTANCE must not be empty"
        );

        let timeout_secs: u64 = parse_var(lookup, "PUSH_TIMEOUT_SECS", 10)?;
        ensure!(timeout_secs > 0, "PUSH_TIMEOUT_SECS must be positive");

        Ok(Self {
            url,
            job,
            instance,
            push_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// When the coordinator pushes to the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    /// Push the snapshot on a fixed interval, independent of update rate
    Periodic,
    /// Push right after every update that changed a unit's state
    PerEvent,
}

impl FromStr for ExportMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "periodic" => Ok(ExportMode::Periodic),
            "per-event" | "per_event" | "perevent" => Ok(ExportMode::PerEvent),
            _ => anyhow::bail!(
                "Invalid EXPORT_MODE: {}. Must be 'periodic' or 'per-event'",
                s
            ),
        }
    }
}

impl fmt::Display for ExportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportMode::Periodic => f.write_str("periodic"),
            ExportMode::PerEvent => f.write_str("per-event"),
        }
    }
}

/// Payload pushed in per-event mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushScope {
    /// Every known unit
    Full,
    /// Only the unit that changed, under its own grouping key
    Unit,
}

impl FromStr for PushScope {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(PushScope::Full),
            "unit" => Ok(PushScope::Unit),
            _ => anyhow::bail!("Invalid PUSH_SCOPE: {}. Must be 'full' or 'unit'", s),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportPolicy {
    pub mode: ExportMode,
    pub interval: Duration,
    pub scope: PushScope,
    pub include_self_metrics: bool,
}

impl Default for ExportPolicy {
    fn default() -> Self {
        Self {
            mode: ExportMode::Periodic,
            interval: Duration::from_secs(15),
            scope: PushScope::Full,
            include_self_metrics: false,
        }
    }
}

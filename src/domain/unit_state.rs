use crate::domain::errors::UnknownStateError;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a unit as reported by the service bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActiveState {
    Active,
    Inactive,
    Failed,
    Reloading,
    Activating,
    Deactivating,
}

impl ActiveState {
    pub const ALL: [ActiveState; 6] = [
        ActiveState::Failed,
        ActiveState::Inactive,
        ActiveState::Active,
        ActiveState::Reloading,
        ActiveState::Activating,
        ActiveState::Deactivating,
    ];

    /// Gauge value exported for this state.
    ///
    /// Activating/Deactivating use 3/4; older deployments emitted 4/5.
    pub fn gauge_value(self) -> i64 {
        match self {
            ActiveState::Failed => -1,
            ActiveState::Inactive => 0,
            ActiveState::Active => 1,
            ActiveState::Reloading => 2,
            ActiveState::Activating => 3,
            ActiveState::Deactivating => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActiveState::Active => "active",
            ActiveState::Inactive => "inactive",
            ActiveState::Failed => "failed",
            ActiveState::Reloading => "reloading",
            ActiveState::Activating => "activating",
            ActiveState::Deactivating => "deactivating",
        }
    }
}

impl fmt::Display for ActiveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActiveState {
    type Err = UnknownStateError;

    /// Accepts the bare state name or the bus' quoted rendering (`"active"`).
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let name = trimmed
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(trimmed);

        ActiveState::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownStateError {
                raw: raw.to_string(),
            })
    }
}

/// Latest known state of a single unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitState {
    pub unit_name: String,
    pub active_state: ActiveState,
    pub last_updated: DateTime<Utc>,
}

impl UnitState {
    pub fn new(unit_name: impl Into<String>, active_state: ActiveState) -> Self {
        Self {
            unit_name: unit_name.into(),
            active_state,
            last_updated: Utc::now(),
        }
    }
}

/// Point-in-time copy of every tracked unit, ordered by unit name
pub type Snapshot = BTreeMap<String, UnitState>;

use crate::domain::errors::{BusError, PushFailure, SubscriptionError};
use crate::domain::push_target::PushTarget;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::mpsc::Receiver;

/// Property key carrying the unit lifecycle state
pub const ACTIVE_STATE_PROPERTY: &str = "ActiveState";

/// A property-change notification for one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertiesUpdate {
    pub unit_name: String,
    pub changed: HashMap<String, String>,
}

impl PropertiesUpdate {
    pub fn new(unit_name: impl Into<String>) -> Self {
        Self {
            unit_name: unit_name.into(),
            changed: HashMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.changed.insert(key.into(), value.into());
        self
    }

    pub fn active_state(&self) -> Option<&str> {
        self.changed.get(ACTIVE_STATE_PROPERTY).map(String::as_str)
    }
}

/// The two inbound streams of a live bus subscription.
///
/// Dropping the subscription closes both receivers.
pub struct BusSubscription {
    pub updates: Receiver<PropertiesUpdate>,
    pub errors: Receiver<BusError>,
}

#[async_trait]
pub trait UnitBus: Send + Sync {
    async fn subscribe(&self) -> Result<BusSubscription, SubscriptionError>;
}

/// Delivers a rendered payload to the metrics gateway. Never retries.
#[async_trait]
pub trait MetricsPusher: Send + Sync {
    async fn push(&self, target: &PushTarget, payload: String) -> Result<(), PushFailure>;
}

use crate::domain::errors::{BusError, PushFailure, SubscriptionError};
use crate::domain::ports::{BusSubscription, MetricsPusher, PropertiesUpdate, UnitBus};
use crate::domain::push_target::PushTarget;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc::{self, Sender};

/// In-memory bus whose streams are driven through a [`MockBusHandle`]
pub struct MockUnitBus {
    subscription: Mutex<Option<BusSubscription>>,
    connect_error: Option<String>,
}

/// Sending side of a [`MockUnitBus`]
#[derive(Clone)]
pub struct MockBusHandle {
    pub updates: Sender<PropertiesUpdate>,
    pub errors: Sender<BusError>,
}

impl MockUnitBus {
    pub fn new(capacity: usize) -> (Self, MockBusHandle) {
        let (updates_tx, updates_rx) = mpsc::channel(capacity);
        let (errors_tx, errors_rx) = mpsc::channel(capacity);

        let bus = Self {
            subscription: Mutex::new(Some(BusSubscription {
                updates: updates_rx,
                errors: errors_rx,
            })),
            connect_error: None,
        };
        let handle = MockBusHandle {
            updates: updates_tx,
            errors: errors_tx,
        };
        (bus, handle)
    }

    /// A bus whose subscription always fails
    pub fn unreachable(reason: &str) -> Self {
        Self {
            subscription: Mutex::new(None),
            connect_error: Some(reason.to_string()),
        }
    }
}

#[async_trait]
impl UnitBus for MockUnitBus {
    async fn subscribe(&self) -> Result<BusSubscription, SubscriptionError> {
        if let Some(reason) = &self.connect_error {
            return Err(SubscriptionError::Connect {
                reason: reason.clone(),
            });
        }

        self.subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(SubscriptionError::AlreadySubscribed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPush {
    pub url: String,
    pub payload: String,
}

/// Pusher that records every attempt and can be told to fail
#[derive(Clone, Default)]
pub struct MockPusher {
    attempts: Arc<Mutex<Vec<RecordedPush>>>,
    failures_remaining: Arc<AtomicUsize>,
}

impl MockPusher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `count` pushes with a 503
    pub fn fail_next(&self, count: usize) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    /// Every attempt so far, successful or not
    pub fn attempts(&self) -> Vec<RecordedPush> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl MetricsPusher for MockPusher {
    async fn push(&self, target: &PushTarget, payload: String) -> Result<(), PushFailure> {
        let url = target.endpoint()?.to_string();
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedPush {
                url: url.clone(),
                payload,
            });

        let failing = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(PushFailure::Rejected {
                url,
                status: 503,
                body: "mock failure".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[tokio::test]
    async fn test_mock_bus_subscribes_once() {
        let (bus, _handle) = MockUnitBus::new(4);
        assert!(bus.subscribe().await.is_ok());
        assert!(matches!(
            bus.subscribe().await,
            Err(SubscriptionError::AlreadySubscribed)
        ));
    }

    #[tokio::test]
    async fn test_mock_pusher_failure_budget() {
        let pusher = MockPusher::new();
        let target = PushTarget::new(Url::parse("http://gw:9091").unwrap(), "top", "machine");
        pusher.fail_next(1);

        assert!(pusher.push(&target, "a".to_string()).await.is_err());
        assert!(pusher.push(&target, "b".to_string()).await.is_ok());
        assert_eq!(pusher.attempts().len(), 2);
    }
}

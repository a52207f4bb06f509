//! Bus adapter reading newline-delimited JSON notifications.
//!
//! Each line carries one property change for one unit:
//!
//! ```text
//! {"unit":"nginx.service","changed":{"ActiveState":"\"active\"","SubState":"\"running\""}}
//! ```
//!
//! This lets any bridge that can print unit property changes (for example a
//! small script wrapping the system bus monitor) feed the exporter on stdin.

use crate::domain::errors::{BusError, SubscriptionError};
use crate::domain::ports::{BusSubscription, PropertiesUpdate, UnitBus};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc::{self, Sender};
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct WireUpdate {
    unit: String,
    #[serde(default)]
    changed: HashMap<String, Value>,
}

impl From<WireUpdate> for PropertiesUpdate {
    fn from(wire: WireUpdate) -> Self {
        let changed = wire
            .changed
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, value)
            })
            .collect();

        PropertiesUpdate {
            unit_name: wire.unit,
            changed,
        }
    }
}

/// [`UnitBus`] over any line-oriented async reader. Can be subscribed once.
pub struct JsonLinesBus<R> {
    reader: Mutex<Option<R>>,
    capacity: usize,
}

impl<R> JsonLinesBus<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    pub fn new(reader: R, capacity: usize) -> Self {
        Self {
            reader: Mutex::new(Some(reader)),
            capacity,
        }
    }
}

#[async_trait]
impl<R> UnitBus for JsonLinesBus<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    async fn subscribe(&self) -> Result<BusSubscription, SubscriptionError> {
        let reader = self
            .reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(SubscriptionError::AlreadySubscribed)?;

        let (updates_tx, updates_rx) = mpsc::channel(self.capacity);
        let (errors_tx, errors_rx) = mpsc::channel(self.capacity);
        tokio::spawn(pump_lines(reader, updates_tx, errors_tx));

        info!("JsonLinesBus: Reading unit notifications");
        Ok(BusSubscription {
            updates: updates_rx,
            errors: errors_rx,
        })
    }
}

async fn pump_lines<R>(
    mut reader: R,
    updates_tx: Sender<PropertiesUpdate>,
    errors_tx: Sender<BusError>,
) where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let mut line_no: u64 = 0;

    loop {
        line.clear();
        // Returning drops both senders; the coordinator drains queued
        // updates and then sees the closed stream as a lost subscription.
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => {
                info!("JsonLinesBus: End of input after {} lines", line_no);
                return;
            }
            Ok(_) => {}
            Err(e) => {
                let _ = errors_tx
                    .send(BusError::Transport {
                        reason: format!("failed to read notification stream: {}", e),
                    })
                    .await;
                return;
            }
        }
        line_no += 1;

        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        // Raw bytes: invalid UTF-8 is a decode error for this line only.
        let sent = match serde_json::from_slice::<WireUpdate>(&line) {
            Ok(wire) => updates_tx.send(wire.into()).await.is_ok(),
            Err(e) => errors_tx
                .send(BusError::Transport {
                    reason: format!("malformed notification on line {}: {}", line_no, e),
                })
                .await
                .is_ok(),
        };

        if !sent {
            debug!("JsonLinesBus: Subscriber dropped, stopping reader");
            return;
        }
    }
}

//! Event bus for the registry service.
//!
//! Keeps an append-only log of every published event and fans each one out
//! to live subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use soulreg_types::{Component, RegistryEvent};
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// A published event with its position in the service-wide order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: Uuid,
    /// Strictly increasing, starting at 1
    pub sequence: u64,
    pub component: Component,
    pub event: RegistryEvent,
    pub emitted_at: DateTime<Utc>,
}

pub struct EventBus {
    log: Mutex<Vec<EventEnvelope>>,
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// `capacity` bounds how far a slow subscriber may lag before it starts
    /// missing events. The log itself is unbounded.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            log: Mutex::new(Vec::new()),
            sender,
        }
    }

    pub async fn publish(&self, component: Component, event: RegistryEvent) -> EventEnvelope {
        let mut log = self.log.lock().await;
        let envelope = EventEnvelope {
            event_id: Uuid::new_v4(),
            sequence: log.len() as u64 + 1,
            component,
            event,
            emitted_at: Utc::now(),
        };
        log.push(envelope.clone());

        // No receivers is fine
        let _ = self.sender.send(envelope.clone());
        envelope
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Snapshot of the full log.
    pub async fn events(&self) -> Vec<EventEnvelope> {
        self.log.lock().await.clone()
    }

    pub async fn events_for(&self, component: Component) -> Vec<EventEnvelope> {
        self.log
            .lock()
            .await
            .iter()
            .filter(|envelope| envelope.component == component)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.log.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.log.lock().await.is_empty()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

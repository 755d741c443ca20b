//! Broadcast-channel EventPublisher implementation.
//!
//! Fans committed call events out to every connected realtime subscriber via
//! a `tokio::sync::broadcast` channel. Slow subscribers that overflow the
//! channel miss events rather than blocking publishers; clients reconcile
//! through the call status endpoint after a gap.

use async_trait::async_trait;
use fitroom_core::call::CallEvent;
use fitroom_core::ports::EventPublisher;
use fitroom_core::Result;
use serde::Serialize;
use tokio::sync::broadcast;

/// Default capacity of the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// An event as delivered to realtime subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct PublishedEvent {
    pub room_id: String,
    pub call_id: String,
    /// Realtime topic name, e.g. `call:browse-update`.
    pub name: String,
    pub event: CallEvent,
}

/// Publishes call events onto a broadcast channel.
pub struct BroadcastEventPublisher {
    sender: broadcast::Sender<PublishedEvent>,
}

impl Default for BroadcastEventPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl BroadcastEventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Opens a new subscription receiving every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl EventPublisher for BroadcastEventPublisher {
    async fn publish(&self, room_id: &str, call_id: &str, event: &CallEvent) -> Result<()> {
        let mut names = vec![event.name()];
        names.extend(event.alias());
        for name in names {
            let published = PublishedEvent {
                room_id: room_id.to_string(),
                call_id: call_id.to_string(),
                name: name.to_string(),
                event: event.clone(),
            };
            // A send error only means there are no subscribers right now.
            if self.sender.send(published).is_err() {
                tracing::debug!("[BroadcastEventPublisher] no subscribers for '{name}'");
            }
        }
        Ok(())
    }
}

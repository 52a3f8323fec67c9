//! Fan-out of change events to WebSocket clients.
//!
//! One broadcast channel per topic. A channel is opened by the first
//! subscriber and closed again once a publish finds nobody listening.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

/// Events a slow client may fall behind by before it starts skipping.
const CHANNEL_CAPACITY: usize = 100;

#[derive(Clone, Default)]
pub struct WebSocketManager {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<String>>>>,
}

impl WebSocketManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe(&self, topic: &str) -> broadcast::Receiver<String> {
        let mut channels = self.channels.write().await;
        channels
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Publishes `msg` on `topic` and returns how many clients received it.
    ///
    /// Publishing to a topic nobody has opened is a no-op.
    pub async fn broadcast(&self, topic: &str, msg: impl Into<String>) -> usize {
        let mut channels = self.channels.write().await;
        let Some(sender) = channels.get(topic) else {
            return 0;
        };
        let delivered = sender.send(msg.into()).unwrap_or(0);
        if delivered == 0 {
            tracing::debug!(topic, "Closing change feed with no listeners");
            channels.remove(topic);
        }
        delivered
    }
}

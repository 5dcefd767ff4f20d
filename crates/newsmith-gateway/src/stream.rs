// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broadcast-backed progress hub.
//!
//! Implements the [`ProgressSink`] port over per-user
//! `tokio::sync::broadcast` channels capped at the stream limit. Producers
//! never block; when a consumer lags past the cap, the oldest entries are
//! dropped for that consumer.

use async_trait::async_trait;
use dashmap::DashMap;
use newsmith_core::{AgentUpdate, CallOptions, NewsmithError, ProgressSink, PROGRESS_STREAM_CAP};
use tokio::sync::broadcast;

/// Fan-in progress hub: one capped stream per user id.
pub struct ProgressHub {
    channels: DashMap<String, broadcast::Sender<AgentUpdate>>,
}

impl ProgressHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    fn sender(&self, user_id: &str) -> broadcast::Sender<AgentUpdate> {
        self.channels
            .entry(user_id.to_string())
            .or_insert_with(|| broadcast::channel(PROGRESS_STREAM_CAP).0)
            .clone()
    }

    /// Subscribes to a user's stream. Events published before the
    /// subscription are not replayed.
    pub fn subscribe(&self, user_id: &str) -> broadcast::Receiver<AgentUpdate> {
        self.sender(user_id).subscribe()
    }
}

impl Default for ProgressHub {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProgressSink for ProgressHub {
    async fn publish(
        &self,
        user_id: &str,
        update: AgentUpdate,
        _opts: &CallOptions,
    ) -> Result<(), NewsmithError> {
        // A send with no subscribers is fine; the stream is best-effort.
        let _ = self.sender(user_id).send(update);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsmith_core::{AgentStatus, UpdateType};

    fn update(message: &str) -> AgentUpdate {
        AgentUpdate::new(
            UpdateType::AgentUpdate,
            "wf",
            "req",
            "memory",
            AgentStatus::Processing,
            message,
        )
    }

    #[tokio::test]
    async fn subscribers_receive_published_updates_in_order() {
        let hub = ProgressHub::new();
        let mut receiver = hub.subscribe("user-1");
        let opts = CallOptions::unbounded();
        hub.publish("user-1", update("one"), &opts).await.unwrap();
        hub.publish("user-1", update("two"), &opts).await.unwrap();
        assert_eq!(receiver.recv().await.unwrap().message, "one");
        assert_eq!(receiver.recv().await.unwrap().message, "two");
    }

    #[tokio::test]
    async fn streams_are_user_scoped() {
        let hub = ProgressHub::new();
        let mut a = hub.subscribe("user-a");
        let _b = hub.subscribe("user-b");
        let opts = CallOptions::unbounded();
        hub.publish("user-b", update("for b"), &opts).await.unwrap();
        hub.publish("user-a", update("for a"), &opts).await.unwrap();
        assert_eq!(a.recv().await.unwrap().message, "for a");
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_ok() {
        let hub = ProgressHub::new();
        let opts = CallOptions::unbounded();
        hub.publish("nobody", update("lost"), &opts).await.unwrap();
    }
}

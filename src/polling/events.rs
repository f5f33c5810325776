//! Change notifications for the realtime layer
//!
//! The stores publish one [`ChangeEvent`] after every successful mutation. What
//! happens to the event afterwards (websocket, SSE, polling) is up to the sink.

use crate::types::PollId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

/// Which collection changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeEntity {
    Poll,
    Vote,
}

/// Emitted after a successful `create_poll`, `close_poll` or `append_vote`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub entity: ChangeEntity,
    pub poll_id: PollId,
    pub at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn poll(poll_id: PollId) -> Self {
        Self {
            entity: ChangeEntity::Poll,
            poll_id,
            at: Utc::now(),
        }
    }

    pub fn vote(poll_id: PollId) -> Self {
        Self {
            entity: ChangeEntity::Vote,
            poll_id,
            at: Utc::now(),
        }
    }
}

/// Receiver of change notifications
///
/// Implementations must not block; they are called right after a store
/// releases its lock, on the caller's thread.
pub trait ChangeSink: Send + Sync {
    fn publish(&self, event: ChangeEvent);
}

/// Sink that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ChangeSink for NullSink {
    fn publish(&self, _event: ChangeEvent) {}
}

/// In-process fan-out of change events over a tokio broadcast channel
pub struct BroadcastFeed {
    sender: broadcast::Sender<ChangeEvent>,
    published: AtomicU64,
}

impl BroadcastFeed {
    /// Create a feed buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            published: AtomicU64::new(0),
        }
    }

    /// Start receiving every event published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Events published since the feed was created, delivered or not
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

impl ChangeSink for BroadcastFeed {
    fn publish(&self, event: ChangeEvent) {
        self.published.fetch_add(1, Ordering::Relaxed);

        // Err only means nobody is listening right now
        if self.sender.send(event.clone()).is_err() {
            tracing::trace!(
                poll_id = %event.poll_id,
                entity = ?event.entity,
                "change event dropped, no subscribers"
            );
        }
    }
}

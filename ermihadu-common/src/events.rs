//! Event types and EventBus for the vault
//!
//! Events are broadcast via [`EventBus`] and serialized for SSE so open
//! pages can refresh themselves after another browser submits an item.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Vault event types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VaultEvent {
    /// Item list was refetched from the remote source
    ItemsRefreshed {
        item_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A validated submission began uploading assets
    SubmissionStarted {
        submission_id: Uuid,
        image_count: usize,
        has_audio: bool,
    },

    /// Row appended
    SubmissionSucceeded { submission_id: Uuid, title: String },

    /// Upload or append failed; nothing was appended
    SubmissionFailed { submission_id: Uuid, message: String },
}

impl VaultEvent {
    /// SSE event name (the serde tag)
    pub fn event_type(&self) -> &'static str {
        match self {
            VaultEvent::ItemsRefreshed { .. } => "ItemsRefreshed",
            VaultEvent::SubmissionStarted { .. } => "SubmissionStarted",
            VaultEvent::SubmissionSucceeded { .. } => "SubmissionSucceeded",
            VaultEvent::SubmissionFailed { .. } => "SubmissionFailed",
        }
    }
}

/// Broadcast channel for [`VaultEvent`]s
///
/// Cloning shares the same channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<VaultEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<VaultEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: VaultEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("No SSE subscribers for event");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

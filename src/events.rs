//! Event system for speech-player
//!
//! The player reports lifecycle transitions two ways:
//! - **Callbacks** registered in [`PlayerOptions`](crate::options::PlayerOptions)
//!   (`on_playing`, `on_pause`, `on_chunk_end`)
//! - **EventBus** (tokio::broadcast): one-to-many event broadcasting for
//!   components that prefer subscribing over registering closures
//!
//! Emission is lossy: if no subscriber is listening the event is dropped,
//! never an error.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

/// Player lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerEvent {
    /// The playback element entered the playing state
    Playing,

    /// The playback element entered the paused state
    Paused,

    /// End of stream inferred: the chunk queue stayed empty through a full
    /// quiescence window and end-of-input was signaled to the pipeline
    ChunkEnd,
}

/// Broadcast bus for [`PlayerEvent`]
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PlayerEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: PlayerEvent) {
        if self.tx.send(event).is_err() {
            trace!(?event, "no subscribers for player event");
        }
    }

    /// Channel capacity this bus was created with
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

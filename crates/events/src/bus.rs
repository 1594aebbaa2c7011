//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the local publish/subscribe hub for [`CarChangeEvent`]s.
//! It is designed to be shared via `Arc<EventBus>` across the application.
//! Producers depend only on the [`EventSink`] trait so tests can substitute
//! a recording sink.

use tokio::sync::broadcast;

use crate::change::CarChangeEvent;

// ---------------------------------------------------------------------------
// EventSink
// ---------------------------------------------------------------------------

/// Destination for translated change events.
pub trait EventSink: Send + Sync {
    /// Deliver one event. Must not block.
    fn publish(&self, event: CarChangeEvent);
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`CarChangeEvent`]. Subscribers
/// filter by floor themselves.
pub struct EventBus {
    sender: broadcast::Sender<CarChangeEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: CarChangeEvent) {
        // Ignore the SendError; it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<CarChangeEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventSink for EventBus {
    fn publish(&self, event: CarChangeEvent) {
        EventBus::publish(self, event);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

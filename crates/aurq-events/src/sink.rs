use std::sync::{
    mpsc::{self, Receiver, Sender},
    Mutex,
};

use tracing::trace;

use crate::QueryEvent;

/// Trait for consuming query events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: QueryEvent);
}

/// Channel-based event sink.
///
/// The receiver end can be drained by any consumer on another thread.
pub struct ChannelSink {
    sender: Mutex<Sender<QueryEvent>>,
}

impl ChannelSink {
    pub fn new() -> (Self, Receiver<QueryEvent>) {
        let (sender, receiver) = mpsc::channel();
        (
            Self {
                sender: Mutex::new(sender),
            },
            receiver,
        )
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: QueryEvent) {
        if let Ok(sender) = self.sender.lock() {
            let _ = sender.send(event);
        }
    }
}

/// No-op event sink.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: QueryEvent) {}
}

/// Forwards every event to `tracing` at trace level.
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: QueryEvent) {
        trace!(event = ?event, "query event");
    }
}

/// Collector sink that stores all events for inspection.
#[derive(Default)]
pub struct CollectorSink {
    events: Mutex<Vec<QueryEvent>>,
}

impl CollectorSink {
    pub fn events(&self) -> Vec<QueryEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for CollectorSink {
    fn emit(&self, event: QueryEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

//! src/eventbus/mod.rs
//!
//! In-process fan-out of overlay broadcasts to any number of observers via
//! bounded per-subscriber queues.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tracing::{trace, warn};

use tikplays_common::models::OverlayEvent;
use tikplays_common::traits::StateBroadcaster;

/// Default size for each subscriber's buffer.
const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Each subscriber gets its own `mpsc::Sender<OverlayEvent>`.
///
/// Publishing never waits: live-event handling must not stall behind a slow
/// observer. A full subscriber queue drops that one event for that one
/// subscriber; a dropped `Receiver` unsubscribes it.
#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::Sender<OverlayEvent>>>>,
    default_buffer: usize,
    shutdown_tx: Arc<watch::Sender<bool>>,
    pub shutdown_rx: watch::Receiver<bool>,
}

impl EventBus {
    /// Create a new, empty event bus.
    pub fn new() -> Self {
        Self::with_buffer(DEFAULT_BUFFER_SIZE)
    }

    pub fn with_buffer(default_buffer: usize) -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            subscribers: Arc::new(Mutex::new(vec![])),
            default_buffer: default_buffer.max(1),
            shutdown_tx: Arc::new(tx),
            shutdown_rx: rx,
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// Returns a receiver on which events will be delivered.
    pub fn subscribe(&self, buffer_size: Option<usize>) -> mpsc::Receiver<OverlayEvent> {
        let size = buffer_size.unwrap_or(self.default_buffer).max(1);
        let (tx, rx) = mpsc::channel(size);
        self.subscribers.lock().push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: OverlayEvent) {
        let mut subs = self.subscribers.lock();
        trace!("EventBus: publishing {} to {} subscriber(s)", event.channel(), subs.len());
        subs.retain(|s| match s.try_send(event.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("EventBus: subscriber queue full, dropping '{}' event", event.channel());
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }

    /// Convenience method: publish an operator log line.
    pub fn publish_log(&self, line: impl Into<String>) {
        self.publish(OverlayEvent::Log(line.into()));
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl StateBroadcaster for EventBus {
    fn broadcast(&self, event: OverlayEvent) {
        self.publish(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tikplays_common::models::WinCounterState;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = EventBus::new();

        let mut rx1 = bus.subscribe(Some(5));
        let mut rx2 = bus.subscribe(Some(5));

        bus.publish(OverlayEvent::Wins(WinCounterState::default()));

        let evt1 = rx1.recv().await.expect("rx1 should get event");
        let evt2 = rx2.recv().await.expect("rx2 should get event");
        assert_eq!(evt1.channel(), "wins");
        assert_eq!(evt2, evt1);
    }

    #[tokio::test]
    async fn test_full_queue_drops_instead_of_blocking() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe(Some(1));

        bus.publish_log("first");
        bus.publish_log("second");

        match rx.recv().await.unwrap() {
            OverlayEvent::Log(txt) => assert_eq!(txt, "first"),
            other => panic!("unexpected event {:?}", other),
        }
        assert!(rx.try_recv().is_err(), "second event should have been dropped");
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_dropped_receivers_are_pruned() {
        let bus = EventBus::new();
        let rx = bus.subscribe(None);
        drop(rx);
        bus.publish_log("anyone?");
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_shutdown_flag() {
        let bus = EventBus::new();
        assert!(!bus.is_shutdown());
        bus.shutdown();
        assert!(bus.is_shutdown());
    }
}

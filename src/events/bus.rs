//! # Event bus for queue events.
//!
//! [`Bus`] hands every published [`Event`] to each live receiver through its own
//! unbounded [`tokio::sync::mpsc`] channel.
//!
//! ## Architecture
//! ```text
//! Publishers (queue lock held):         Receivers (one channel each):
//!   acquire()        ──┐          ┌──► TicketQueue::subscribe()
//!   remove()         ──┼──► Bus ──┼──► TicketQueue::subscribe()
//!   stall timer      ──┘          └──► subscriber worker (one per Subscribe)
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: unbounded sends never wait, so publishing is
//!   allowed while the queue state is locked.
//! - **Lossless and ordered**: a receiver sees every event published after it
//!   subscribed, in publish order. There is no lag and no skipping.
//! - **Pruning**: receivers that were dropped are removed on the next publish.
//! - **Closing**: when the bus is dropped (with its queue) every receiver drains
//!   its backlog and then observes the end of the stream.

use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;

use super::event::Event;

/// Fan-out of queue events to every subscribed receiver.
#[derive(Debug, Default)]
pub struct Bus {
    receivers: Mutex<Vec<mpsc::UnboundedSender<Event>>>,
}

impl Bus {
    /// Creates a bus with no receivers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers an event to all live receivers.
    ///
    /// If there are no receivers, the event is dropped.
    pub fn publish(&self, ev: Event) {
        let mut receivers = self.receivers.lock().unwrap_or_else(PoisonError::into_inner);
        receivers.retain(|tx| tx.send(ev.clone()).is_ok());
    }

    /// Creates a new receiver that will observe subsequent events.
    ///
    /// A receiver only gets events **published after** it subscribes.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Event> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.receivers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Number of receivers still registered (as of the last publish).
    pub fn receivers(&self) -> usize {
        self.receivers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn test_receivers_see_events_in_publish_order() {
        let bus = Bus::new();
        let mut rx = bus.subscribe();

        bus.publish(Event::new(EventKind::TicketAcquired));
        bus.publish(Event::new(EventKind::HeadChanged));

        assert_eq!(rx.recv().await.unwrap().kind, EventKind::TicketAcquired);
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::HeadChanged);
    }

    #[test]
    fn test_publish_without_receivers_is_silent() {
        let bus = Bus::new();
        bus.publish(Event::new(EventKind::TicketAcquired));
        assert_eq!(bus.receivers(), 0);
    }

    #[test]
    fn test_backlog_is_not_truncated() {
        let bus = Bus::new();
        let mut rx = bus.subscribe();

        for _ in 0..5000 {
            bus.publish(Event::new(EventKind::HeadChanged));
        }

        let seqs: Vec<u64> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| e.seq)
            .collect();
        assert_eq!(seqs.len(), 5000);
        assert!(seqs.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_dropping_bus_ends_stream_after_backlog() {
        let bus = Bus::new();
        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::TicketAcquired));
        drop(bus);

        assert_eq!(rx.recv().await.map(|e| e.kind), Some(EventKind::TicketAcquired));
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_dropped_receivers_are_pruned_on_publish() {
        let bus = Bus::new();
        let rx = bus.subscribe();
        let _kept = bus.subscribe();
        assert_eq!(bus.receivers(), 2);

        drop(rx);
        bus.publish(Event::new(EventKind::TicketAcquired));
        assert_eq!(bus.receivers(), 1);
    }
}

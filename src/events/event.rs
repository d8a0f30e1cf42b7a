//! # Queue events emitted by the ticket queue and its stall supervisor.
//!
//! The [`EventKind`] enum classifies queue transitions: ticket acquisition,
//! head changes, removals and stall-driven requeues.
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the
//! ticket id, retry counts and removal reasons.
//!
//! ## Ordering guarantees
//! Queue events are published while the queue state is locked, so the bus
//! observes them in exactly the order the state transitions happened. Each event
//! also has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use turnstile::{Event, EventKind, TicketId};
//!
//! let ev = Event::new(EventKind::TicketRemoved)
//!     .with_ticket(TicketId::new(7))
//!     .with_retries(2)
//!     .with_reason("stalled past retry limit");
//!
//! assert_eq!(ev.kind, EventKind::TicketRemoved);
//! assert_eq!(ev.ticket, Some(TicketId::new(7)));
//! assert_eq!(ev.reason.as_deref(), Some("stalled past retry limit"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

use crate::core::TicketId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of queue events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A ticket was appended to the tail of the queue.
    ///
    /// Sets:
    /// - `ticket`: id of the new ticket
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TicketAcquired,

    /// The head of the queue changed.
    ///
    /// Sets:
    /// - `ticket`: id of the new head, `None` when the queue became empty
    /// - `retries`: retry count of the new head (if any)
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    HeadChanged,

    /// A ticket left the queue (explicit removal, scope exit or eviction).
    ///
    /// Sets:
    /// - `ticket`: id of the removed ticket
    /// - `retries`: retry count at removal time
    /// - `reason`: removal reason, if one was supplied
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TicketRemoved,

    /// A stalled head was moved to the tail by the stall supervisor.
    ///
    /// Always followed by [`EventKind::HeadChanged`].
    ///
    /// Sets:
    /// - `ticket`: id of the requeued ticket
    /// - `retries`: retry count after the increment
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TicketRequeued,
}

/// Queue event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Ticket the event is about (for `HeadChanged`, `None` means empty queue).
    pub ticket: Option<TicketId>,
    /// Retry count of the ticket at the time of the event.
    pub retries: Option<u32>,
    /// Removal reason, if one was supplied.
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            ticket: None,
            retries: None,
            reason: None,
        }
    }

    /// Attaches a ticket id.
    #[inline]
    pub fn with_ticket(mut self, id: TicketId) -> Self {
        self.ticket = Some(id);
        self
    }

    /// Attaches a retry count.
    #[inline]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an optional reason, leaving the field empty for `None`.
    #[inline]
    pub(crate) fn with_reason_opt(mut self, reason: Option<Arc<str>>) -> Self {
        self.reason = reason;
        self
    }

    /// True if this event reports a new head (or an empty queue).
    #[inline]
    pub fn is_head_change(&self) -> bool {
        matches!(self.kind, EventKind::HeadChanged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::TicketAcquired);
        let b = Event::new(EventKind::HeadChanged);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_empty_head_change_has_no_ticket() {
        let ev = Event::new(EventKind::HeadChanged);
        assert!(ev.is_head_change());
        assert_eq!(ev.ticket, None);
        assert_eq!(ev.reason, None);
    }
}

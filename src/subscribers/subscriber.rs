//! # Queue event subscriber.
//!
//! [`Subscribe`] is the hook for reacting to queue activity outside the queue:
//! audit trails of who got the turn, eviction alerts, counters of requeues.
//! Register implementations with
//! [`QueueBuilder::with_subscribers`](crate::QueueBuilder::with_subscribers).
//!
//! ## Delivery
//! ```text
//! queue mutation ──► Bus ──► [unbounded channel] ──► worker ──► accepts(kind)? ──► on_event()
//!                                                            └─► panic caught → tracing::error!
//! ```
//!
//! - Every event published while the queue is alive reaches the worker, in the
//!   order the queue produced it. Nothing is dropped for a slow subscriber; its
//!   backlog grows instead.
//! - `on_event` never runs under the queue lock, so a subscriber may call back
//!   into the queue (`first()`, `snapshot()`, ...). What it sees there is the
//!   *current* state, which may already be ahead of the event it handles.
//! - After the queue is dropped the worker finishes the backlog and stops.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! use async_trait::async_trait;
//! use turnstile::{Event, EventKind, Subscribe, STALLED_PAST_RETRY_LIMIT};
//!
//! #[derive(Default)]
//! struct Evictions(AtomicU64);
//!
//! #[async_trait]
//! impl Subscribe for Evictions {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.reason.as_deref() == Some(STALLED_PAST_RETRY_LIMIT) {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "evictions"
//!     }
//!
//!     fn accepts(&self, kind: EventKind) -> bool {
//!         kind == EventKind::TicketRemoved
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};

/// Consumer of queue events, driven by its own worker task.
///
/// Keep `on_event` non-blocking (async I/O only). A panic is caught and logged;
/// the worker moves on to the next event.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event.
    async fn on_event(&self, event: &Event);

    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Filters events by kind before `on_event` is called. Default: all kinds.
    fn accepts(&self, kind: EventKind) -> bool {
        let _ = kind;
        true
    }
}

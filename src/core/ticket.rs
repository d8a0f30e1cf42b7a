//! # Ticket: a disposable reservation of a turn in the queue.
//!
//! A [`Ticket`] is created only by [`TicketQueue::acquire`](crate::TicketQueue::acquire).
//! It carries its identity, retry count and disposal state, and delegates all
//! waiting and removal back to the queue that produced it.
//!
//! ## Ownership
//! ```text
//! TicketQueue ──Arc──► Shared { order: [Arc<TicketCell>, ...] }
//!                          ▲
//! Ticket ──Weak────────────┘   (addresses the queue, does not keep it alive)
//! Ticket ──Arc──► TicketCell   (shared with the queue's order)
//! ```
//!
//! ## Scoped disposal
//! Dropping a [`Ticket`] removes it from its queue with the reason
//! [`SCOPE_EXITED`]. This covers early returns, `?` and panics in the scope
//! that acquired the ticket. Dropping an already disposed ticket does nothing.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Weak};

use super::queue::Shared;
use crate::error::QueueError;

/// Removal reason used when a [`Ticket`] is dropped while still enqueued.
pub const SCOPE_EXITED: &str = "scope exited";

/// Per-queue ticket identity.
///
/// Ids are strictly increasing in acquisition order and never reused within one queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TicketId(u64);

impl TicketId {
    /// Wraps a raw id.
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// State shared between a [`Ticket`] handle and the queue's order.
#[derive(Debug)]
pub(crate) struct TicketCell {
    pub(crate) id: TicketId,
    disposed: AtomicBool,
    retries: AtomicU32,
}

impl TicketCell {
    pub(crate) fn new(id: TicketId) -> Self {
        Self {
            id,
            disposed: AtomicBool::new(false),
            retries: AtomicU32::new(0),
        }
    }

    #[inline]
    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn mark_disposed(&self) {
        self.disposed.store(true, Ordering::Release);
    }

    #[inline]
    pub(crate) fn retries(&self) -> u32 {
        self.retries.load(Ordering::Relaxed)
    }

    /// Increments the retry count; only called by the stall supervisor under the queue lock.
    #[inline]
    pub(crate) fn bump_retries(&self) -> u32 {
        self.retries.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Handle to a reserved turn.
///
/// Not `Clone`: exactly one handle exists per ticket, and dropping it releases the turn.
pub struct Ticket {
    pub(crate) cell: Arc<TicketCell>,
    pub(crate) queue: Weak<Shared>,
}

impl Ticket {
    pub(crate) fn new(cell: Arc<TicketCell>, queue: Weak<Shared>) -> Self {
        Self { cell, queue }
    }

    /// Identity of this ticket within its queue.
    #[inline]
    pub fn id(&self) -> TicketId {
        self.cell.id
    }

    /// Number of times the stall supervisor moved this ticket from head to tail.
    #[inline]
    pub fn retries(&self) -> u32 {
        self.cell.retries()
    }

    /// True once the ticket left the queue by any path. Irreversible.
    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.cell.is_disposed()
    }

    /// Waits until this ticket is the head of its queue, then removes it.
    ///
    /// The wait is registered when this method is called, not when the future is
    /// first polled.
    ///
    /// # Errors
    /// - [`QueueError::Disposed`] if the ticket is already disposed
    /// - [`QueueError::Removed`] if the ticket is removed before reaching the head
    /// - [`QueueError::Closed`] if the queue is gone
    pub fn wait_until_first(
        &self,
    ) -> impl Future<Output = Result<(), QueueError>> + Send + 'static {
        let id = self.id();
        let pending = if self.is_disposed() {
            Err(QueueError::Disposed { id })
        } else {
            match self.queue.upgrade() {
                Some(shared) => Ok(Shared::wait_for_first_and_remove(&shared, &self.cell)),
                None => Err(QueueError::Closed { id }),
            }
        };

        async move { pending?.await }
    }

    /// Removes this ticket from its queue without a reason. Idempotent.
    pub fn remove_from_queue(&self) {
        self.release(None);
    }

    /// Removes this ticket from its queue with the given reason. Idempotent.
    pub fn remove_from_queue_with_reason(&self, reason: impl Into<Arc<str>>) {
        self.release(Some(reason.into()));
    }

    fn release(&self, reason: Option<Arc<str>>) {
        if self.is_disposed() {
            return;
        }
        if let Some(shared) = self.queue.upgrade() {
            Shared::remove(&shared, &self.cell, reason);
        }
        self.cell.mark_disposed();
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        self.release(Some(Arc::from(SCOPE_EXITED)));
    }
}

impl fmt::Debug for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ticket")
            .field("id", &self.id())
            .field("retries", &self.retries())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

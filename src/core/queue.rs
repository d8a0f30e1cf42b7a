//! # TicketQueue: FIFO order, head transitions and waits.
//!
//! The [`TicketQueue`] owns the ordered sequence of outstanding tickets, the
//! identity counter, the configuration and the stall supervisor. Every state
//! change goes through a short synchronous critical section; notifications
//! (waiter settlement, bus events, supervisor re-arming) happen inside that
//! same section, so no other queue operation can observe an intermediate state.
//!
//! ## Control flow
//! ```text
//! acquire() ──► push_back ──► TicketAcquired
//!                   └─ queue was empty ──► head_changed(new)
//!
//! remove(t) ──► t present? ──no──► no-op
//!                   └─ yes ──► mark disposed, drop from order
//!                              ├─► TicketRemoved{reason}, fail waits on t
//!                              └─ t was head ──► head_changed(next or none)
//!
//! head_changed(h):
//!   ├─► HeadChanged{h}
//!   ├─► settle waits on h (Ok)
//!   └─► supervisor: disarm, then arm for h (if any and timeout > 0)
//! ```
//!
//! ## Rules
//! - A ticket appears in `order` at most once, and only while not disposed.
//! - Ids strictly increase per queue and are never reused.
//! - The armed stall timer (if any) always watches the current head.
//! - Waits fail locally; removal and head advancement always complete.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use super::builder::QueueBuilder;
use super::supervisor::StallTimer;
use super::ticket::{Ticket, TicketCell, TicketId};
use super::waiters::{WaitResult, Waiters};
use crate::config::QueueConfig;
use crate::error::{ConfigError, QueueError};
use crate::events::{Bus, Event, EventKind};

/// Mutable queue state, guarded by [`Shared::state`].
pub(crate) struct State {
    pub(crate) order: VecDeque<Arc<TicketCell>>,
    next_id: u64,
    pub(crate) waiters: Waiters,
    pub(crate) armed: Option<StallTimer>,
}

impl State {
    fn new() -> Self {
        Self {
            order: VecDeque::new(),
            next_id: 0,
            waiters: Waiters::default(),
            armed: None,
        }
    }

    #[inline]
    pub(crate) fn is_head(&self, cell: &Arc<TicketCell>) -> bool {
        self.order.front().is_some_and(|h| Arc::ptr_eq(h, cell))
    }

    #[inline]
    fn position(&self, cell: &Arc<TicketCell>) -> Option<usize> {
        self.order.iter().position(|c| Arc::ptr_eq(c, cell))
    }
}

/// Queue internals shared by [`TicketQueue`] clones; tickets and timers hold it weakly.
pub(crate) struct Shared {
    pub(crate) cfg: QueueConfig,
    pub(crate) bus: Bus,
    state: Mutex<State>,
}

/// Outcome of registering a wait, computed synchronously at call time.
enum PendingWait {
    Ready(WaitResult),
    Waiting {
        id: TicketId,
        rx: tokio::sync::oneshot::Receiver<WaitResult>,
    },
}

impl PendingWait {
    async fn resolve(self) -> WaitResult {
        match self {
            PendingWait::Ready(res) => res,
            PendingWait::Waiting { id, rx } => rx.await.unwrap_or(Err(QueueError::Closed { id })),
        }
    }
}

impl Shared {
    pub(crate) fn new(cfg: QueueConfig, bus: Bus) -> Self {
        Self {
            cfg,
            bus,
            state: Mutex::new(State::new()),
        }
    }

    /// Locks the state. Every critical section leaves the state consistent, so a
    /// poisoned lock is recovered rather than propagated.
    pub(crate) fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn acquire(this: &Arc<Self>) -> Arc<TicketCell> {
        let mut state = this.lock();
        state.next_id += 1;
        let cell = Arc::new(TicketCell::new(TicketId::new(state.next_id)));
        state.order.push_back(Arc::clone(&cell));

        tracing::debug!(ticket = %cell.id, queued = state.order.len(), "ticket acquired");
        this.bus
            .publish(Event::new(EventKind::TicketAcquired).with_ticket(cell.id));

        if state.order.len() == 1 {
            Self::head_changed(this, &mut state);
        }
        cell
    }

    pub(crate) fn remove(
        this: &Arc<Self>,
        cell: &Arc<TicketCell>,
        reason: Option<Arc<str>>,
    ) -> bool {
        let mut state = this.lock();
        Self::remove_locked(this, &mut state, cell, reason)
    }

    /// Single removal path for explicit removal, scoped release and eviction.
    pub(crate) fn remove_locked(
        this: &Arc<Self>,
        state: &mut State,
        cell: &Arc<TicketCell>,
        reason: Option<Arc<str>>,
    ) -> bool {
        let Some(pos) = state.position(cell) else {
            return false;
        };

        cell.mark_disposed();
        state.order.remove(pos);

        tracing::debug!(
            ticket = %cell.id,
            retries = cell.retries(),
            reason = reason.as_deref().unwrap_or(""),
            "ticket removed"
        );
        state.waiters.settle_removed(cell.id, reason.as_ref());
        this.bus.publish(
            Event::new(EventKind::TicketRemoved)
                .with_ticket(cell.id)
                .with_retries(cell.retries())
                .with_reason_opt(reason),
        );

        if pos == 0 {
            Self::head_changed(this, state);
        }
        true
    }

    /// Announces the current head: bus event, waiter settlement, supervisor re-arm.
    pub(crate) fn head_changed(this: &Arc<Self>, state: &mut State) {
        let mut ev = Event::new(EventKind::HeadChanged);
        if let Some(head) = state.order.front() {
            ev = ev.with_ticket(head.id).with_retries(head.retries());
            state.waiters.settle_first(head.id);
        }
        this.bus.publish(ev);
        Self::rearm(this, state);
    }

    fn register_wait(&self, cell: &Arc<TicketCell>) -> PendingWait {
        let id = cell.id;
        let mut state = self.lock();
        if cell.is_disposed() {
            PendingWait::Ready(Err(QueueError::Disposed { id }))
        } else if state.is_head(cell) {
            PendingWait::Ready(Ok(()))
        } else if state.position(cell).is_none() {
            PendingWait::Ready(Err(QueueError::NotPresent { id }))
        } else {
            PendingWait::Waiting {
                id,
                rx: state.waiters.register(id),
            }
        }
    }

    pub(crate) fn wait_for_first(
        this: &Arc<Self>,
        cell: &Arc<TicketCell>,
    ) -> impl Future<Output = WaitResult> + Send + 'static {
        this.register_wait(cell).resolve()
    }

    pub(crate) fn wait_for_first_and_remove(
        this: &Arc<Self>,
        cell: &Arc<TicketCell>,
    ) -> impl Future<Output = WaitResult> + Send + 'static {
        let pending = this.register_wait(cell);
        let queue = Arc::downgrade(this);
        let cell = Arc::clone(cell);

        async move {
            pending.resolve().await?;
            if let Some(shared) = queue.upgrade() {
                Self::remove(&shared, &cell, None);
            }
            cell.mark_disposed();
            Ok(())
        }
    }
}

/// FIFO ticket queue with stall supervision.
///
/// Cheap to clone; all clones address the same queue. Tickets hold only a weak
/// reference, so the queue closes once every `TicketQueue` clone is dropped.
///
/// # Example
/// ```rust
/// use turnstile::{QueueConfig, TicketQueue};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let queue = TicketQueue::new(QueueConfig::default());
///
///     let first = queue.acquire();
///     let second = queue.acquire();
///     assert_eq!(queue.first(), Some(first.id()));
///
///     let wait = second.wait_until_first();
///     first.remove_from_queue();
///     wait.await.unwrap();
///
///     assert!(queue.is_empty());
/// }
/// ```
#[derive(Clone)]
pub struct TicketQueue {
    pub(crate) shared: Arc<Shared>,
}

impl TicketQueue {
    /// Creates a queue with the given configuration.
    pub fn new(cfg: QueueConfig) -> Self {
        Self::builder(cfg).build()
    }

    /// Creates a queue with the default configuration (1s timeout, 3 retries).
    pub fn with_defaults() -> Self {
        Self::new(QueueConfig::default())
    }

    /// Validates raw settings and creates a queue.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if either value is negative; no queue is created.
    pub fn try_from_millis(timeout_ms: i64, retries: i64) -> Result<Self, ConfigError> {
        QueueConfig::from_millis(timeout_ms, retries).map(Self::new)
    }

    /// Returns a builder for a queue with subscribers.
    pub fn builder(cfg: QueueConfig) -> QueueBuilder {
        QueueBuilder::new(cfg)
    }

    pub(crate) fn from_shared(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Reserves the next turn. Never blocks.
    pub fn acquire(&self) -> Ticket {
        let cell = Shared::acquire(&self.shared);
        Ticket::new(cell, Arc::downgrade(&self.shared))
    }

    /// Removes a ticket without a reason. No-op if the ticket is not enqueued here.
    pub fn remove(&self, ticket: &Ticket) {
        Shared::remove(&self.shared, &ticket.cell, None);
    }

    /// Removes a ticket with a reason. No-op if the ticket is not enqueued here.
    pub fn remove_with_reason(&self, ticket: &Ticket, reason: impl Into<Arc<str>>) {
        Shared::remove(&self.shared, &ticket.cell, Some(reason.into()));
    }

    /// Returns the current head, if any.
    pub fn first(&self) -> Option<TicketId> {
        self.shared.lock().order.front().map(|c| c.id)
    }

    /// Waits until `ticket` is the head.
    ///
    /// Checks and registration happen when this method is called; the returned
    /// future only awaits the outcome.
    ///
    /// # Errors
    /// - [`QueueError::Disposed`] if the ticket is already disposed
    /// - [`QueueError::NotPresent`] if the ticket is not enqueued in this queue
    /// - [`QueueError::Removed`] if the ticket is removed before reaching the head
    /// - [`QueueError::Closed`] if the queue is dropped while waiting
    pub fn wait_for_first(
        &self,
        ticket: &Ticket,
    ) -> impl Future<Output = Result<(), QueueError>> + Send + 'static {
        Shared::wait_for_first(&self.shared, &ticket.cell)
    }

    /// Waits until `ticket` is the head, then removes it.
    ///
    /// A failed wait is returned as-is and no removal is attempted.
    pub fn wait_for_first_and_remove(
        &self,
        ticket: &Ticket,
    ) -> impl Future<Output = Result<(), QueueError>> + Send + 'static {
        Shared::wait_for_first_and_remove(&self.shared, &ticket.cell)
    }

    /// Creates a receiver for subsequent queue events.
    ///
    /// Delivery is lossless and in mutation order: every event is queued for
    /// the receiver inside the same critical section that produced it, so each
    /// head change is observed exactly once. The receiver's backlog is
    /// unbounded; drop it when no longer interested.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Event> {
        self.shared.bus.subscribe()
    }

    /// Number of enqueued tickets.
    pub fn len(&self) -> usize {
        self.shared.lock().order.len()
    }

    /// True if no ticket is enqueued.
    pub fn is_empty(&self) -> bool {
        self.shared.lock().order.is_empty()
    }

    /// True if `ticket` is currently enqueued in this queue.
    pub fn contains(&self, ticket: &Ticket) -> bool {
        self.shared.lock().position(&ticket.cell).is_some()
    }

    /// Ticket ids in queue order, head first.
    pub fn snapshot(&self) -> Vec<TicketId> {
        self.shared.lock().order.iter().map(|c| c.id).collect()
    }

    /// Configuration the queue was built with.
    pub fn config(&self) -> &QueueConfig {
        &self.shared.cfg
    }

    /// Ticket watched by the armed stall timer, if any.
    pub fn supervised(&self) -> Option<TicketId> {
        self.shared.lock().armed.as_ref().map(|t| t.ticket)
    }

    /// True while a stall timer is armed for the current head.
    pub fn is_supervising(&self) -> bool {
        self.supervised().is_some()
    }

    /// Number of tickets with at least one pending wait.
    pub fn waiting(&self) -> usize {
        self.shared.lock().waiters.len()
    }
}

impl std::fmt::Debug for TicketQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketQueue")
            .field("cfg", &self.shared.cfg)
            .field("order", &self.snapshot())
            .finish()
    }
}

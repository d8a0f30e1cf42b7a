//! # Stall supervisor: requeues or evicts a head that never leaves.
//!
//! The supervisor keeps at most one armed timer, always bound to the ticket
//! that was head when it was armed. It reacts only to head changes; there is
//! no polling loop.
//!
//! ## Transitions
//! ```text
//! head_changed(h) ──► disarm current timer (drop guard → token cancelled)
//!                     └─ h is Some and timeout > 0 ──► arm timer(h, now + timeout)
//!
//! timer(h) fires ──► h still head? ──no──► nothing (stale timer)
//!                    └─ yes
//!                        ├─ h.retries < limit ──► retries += 1, move h to tail,
//!                        │                        TicketRequeued, head_changed(front)
//!                        └─ otherwise ──────────► remove(h, "stalled past retry limit")
//! ```
//!
//! ## Rules
//! - Timer tasks hold the queue weakly; a dropped queue never fires.
//! - The "still head" check at fire time is the only guard against a timer
//!   that fired while being cancelled.
//! - Requeue and eviction go through the same `head_changed` / `remove` paths
//!   as synchronous callers, so the queue invariants hold for every entry point.
//! - Arming needs a Tokio runtime; without one the head is left unsupervised.
//! - Any timeout is accepted; one too large for the clock never fires.

use std::sync::Arc;

use tokio_util::sync::{CancellationToken, DropGuard};

use super::queue::{Shared, State};
use super::ticket::{TicketCell, TicketId};
use crate::events::{Event, EventKind};

/// Removal reason used when the supervisor evicts a head.
pub const STALLED_PAST_RETRY_LIMIT: &str = "stalled past retry limit";

/// The currently armed timer. Dropping it cancels the timer task.
pub(crate) struct StallTimer {
    pub(crate) ticket: TicketId,
    _guard: DropGuard,
}

impl Shared {
    /// Disarms the current timer and arms one for the current head, if supervision is on.
    pub(crate) fn rearm(this: &Arc<Self>, state: &mut State) {
        state.armed = None;

        let Some(timeout) = this.cfg.stall_timeout() else {
            return;
        };
        let Some(head) = state.order.front() else {
            return;
        };
        let Ok(rt) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(ticket = %head.id, "no tokio runtime; head left unsupervised");
            return;
        };

        let token = CancellationToken::new();
        let cancelled = token.clone();
        // Saturates to a far-future deadline for timeouts past the clock's range.
        let stall = tokio::time::sleep(timeout);
        let queue = Arc::downgrade(this);
        let cell = Arc::clone(head);

        rt.spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = stall => {
                    if let Some(shared) = queue.upgrade() {
                        Shared::on_stall(&shared, &cell);
                    }
                }
            }
        });

        state.armed = Some(StallTimer {
            ticket: head.id,
            _guard: token.drop_guard(),
        });
    }

    /// Handles an expired timer for `cell`.
    pub(crate) fn on_stall(this: &Arc<Self>, cell: &Arc<TicketCell>) {
        let mut state = this.lock();
        if !state.is_head(cell) {
            return;
        }

        let limit = this.cfg.retries;
        if cell.retries() < limit {
            let retries = cell.bump_retries();
            state.order.rotate_left(1);
            tracing::debug!(ticket = %cell.id, retries, limit, "stalled head requeued");
            this.bus.publish(
                Event::new(EventKind::TicketRequeued)
                    .with_ticket(cell.id)
                    .with_retries(retries),
            );
            Self::head_changed(this, &mut state);
        } else {
            tracing::warn!(
                ticket = %cell.id,
                retries = cell.retries(),
                limit,
                "stalled head evicted"
            );
            Self::remove_locked(
                this,
                &mut state,
                cell,
                Some(Arc::from(STALLED_PAST_RETRY_LIMIT)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{QueueConfig, TicketQueue};
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn queue(timeout_ms: u64, retries: u32) -> TicketQueue {
        TicketQueue::new(QueueConfig {
            timeout: Duration::from_millis(timeout_ms),
            retries,
        })
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Event>) -> Vec<Event> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_requeue_then_evict_scenario() {
        let q = queue(500, 1);
        let mut rx = q.subscribe();
        let t1 = q.acquire();
        let t2 = q.acquire();
        assert_eq!(q.first(), Some(t1.id()));

        tokio::time::sleep(Duration::from_millis(510)).await;
        assert_eq!(t1.retries(), 1);
        assert_eq!(q.first(), Some(t2.id()));
        assert_eq!(q.snapshot(), vec![t2.id(), t1.id()]);

        q.remove(&t2);
        assert_eq!(q.first(), Some(t1.id()));
        assert_eq!(t1.retries(), 1);

        tokio::time::sleep(Duration::from_millis(510)).await;
        assert!(q.is_empty());
        assert!(t1.is_disposed());
        assert!(!q.is_supervising());

        let evicted = drain(&mut rx)
            .into_iter()
            .find(|e| e.kind == EventKind::TicketRemoved && e.ticket == Some(t1.id()))
            .expect("eviction event");
        assert_eq!(evicted.reason.as_deref(), Some(STALLED_PAST_RETRY_LIMIT));
        assert_eq!(evicted.retries, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_head_requeued_exactly_limit_times() {
        let q = queue(100, 3);
        let mut rx = q.subscribe();
        let t1 = q.acquire();

        tokio::time::sleep(Duration::from_millis(450)).await;

        let events = drain(&mut rx);
        let requeues: Vec<u32> = events
            .iter()
            .filter(|e| e.kind == EventKind::TicketRequeued)
            .filter_map(|e| e.retries)
            .collect();
        assert_eq!(requeues, vec![1, 2, 3]);

        let removed: Vec<_> = events
            .iter()
            .filter(|e| e.kind == EventKind::TicketRemoved)
            .collect();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].reason.as_deref(), Some(STALLED_PAST_RETRY_LIMIT));
        assert_eq!(t1.retries(), 3);
        assert!(t1.is_disposed());
        assert_eq!(q.first(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_evicts_on_first_stall() {
        let q = queue(200, 0);
        let t1 = q.acquire();
        let t2 = q.acquire();

        tokio::time::sleep(Duration::from_millis(210)).await;

        assert!(t1.is_disposed());
        assert_eq!(t1.retries(), 0);
        assert_eq!(q.first(), Some(t2.id()));
        assert_eq!(q.supervised(), Some(t2.id()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_never_arms() {
        let q = queue(0, 1);
        let t1 = q.acquire();
        assert!(!q.is_supervising());

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(q.first(), Some(t1.id()));
        assert_eq!(t1.retries(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_follows_head() {
        let q = queue(1000, 3);
        let t1 = q.acquire();
        let t2 = q.acquire();
        assert_eq!(q.supervised(), Some(t1.id()));

        q.remove(&t2);
        assert_eq!(q.supervised(), Some(t1.id()));

        let t3 = q.acquire();
        q.remove(&t1);
        assert_eq!(q.supervised(), Some(t3.id()));

        q.remove(&t3);
        assert_eq!(q.supervised(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_head_gets_full_timeout() {
        let q = queue(500, 0);
        let t1 = q.acquire();
        let t2 = q.acquire();

        tokio::time::sleep(Duration::from_millis(400)).await;
        q.remove(&t1);

        // t2 became head at 400ms; the old 500ms deadline must not apply to it.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(q.first(), Some(t2.id()));
        assert!(!t2.is_disposed());

        tokio::time::sleep(Duration::from_millis(310)).await;
        assert!(t2.is_disposed());
        assert!(q.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_requeue_resolves_waiter_of_next_ticket() {
        let q = queue(300, 2);
        let t1 = q.acquire();
        let t2 = q.acquire();

        let wait = q.wait_for_first(&t2);
        tokio::time::sleep(Duration::from_millis(310)).await;

        wait.await.unwrap();
        assert_eq!(q.first(), Some(t2.id()));
        assert_eq!(q.snapshot(), vec![t2.id(), t1.id()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cascade_of_stalled_heads() {
        let q = queue(100, 0);
        let t1 = q.acquire();
        let t2 = q.acquire();
        let t3 = q.acquire();

        let wait = q.wait_for_first(&t3);
        wait.await.unwrap();
        assert!(t1.is_disposed());
        assert!(t2.is_disposed());
        assert_eq!(q.first(), Some(t3.id()));

        tokio::time::sleep(Duration::from_millis(110)).await;
        let err = q.wait_for_first(&t3).await.unwrap_err();
        assert_eq!(err.as_label(), "ticket_disposed");
        assert!(q.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_timer_is_ignored() {
        let q = queue(1000, 3);
        let t1 = q.acquire();
        let t2 = q.acquire();
        let mut rx = q.subscribe();

        // A timer for t2 firing while t1 is head must not touch the queue.
        Shared::on_stall(&q.shared, &t2.cell);

        assert!(drain(&mut rx).is_empty());
        assert_eq!(t2.retries(), 0);
        assert_eq!(q.snapshot(), vec![t1.id(), t2.id()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_ticket_requeues_onto_itself() {
        let q = queue(100, 2);
        let mut rx = q.subscribe();
        let t1 = q.acquire();

        tokio::time::sleep(Duration::from_millis(110)).await;

        assert_eq!(q.first(), Some(t1.id()));
        assert_eq!(t1.retries(), 1);
        let heads: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter(|e| e.is_head_change())
            .map(|e| (e.ticket, e.retries))
            .collect();
        assert_eq!(heads, vec![(Some(t1.id()), Some(0)), (Some(t1.id()), Some(1))]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_queue_disarms_timer() {
        let q = queue(100, 0);
        let t1 = q.acquire();
        drop(q);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!t1.is_disposed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_timeout_arms_without_overflow() {
        let q = TicketQueue::new(QueueConfig {
            timeout: Duration::MAX,
            retries: 1,
        });
        let t1 = q.acquire();
        let t2 = q.acquire();
        assert_eq!(q.supervised(), Some(t1.id()));

        tokio::time::sleep(Duration::from_secs(365 * 24 * 3600)).await;
        assert_eq!(q.first(), Some(t1.id()));
        assert_eq!(t1.retries(), 0);

        let wait = t2.wait_until_first();
        drop(t1);
        wait.await.unwrap();
        assert!(q.is_empty());
    }

    #[test]
    fn test_without_runtime_head_is_unsupervised() {
        let q = queue(100, 1);
        let t1 = q.acquire();
        assert_eq!(q.first(), Some(t1.id()));
        assert!(!q.is_supervising());
    }
}

//! Registry of pending "wait until first" calls, keyed by ticket.
//!
//! Each pending wait owns a `oneshot` receiver; the queue keeps the sender.
//! A sender is consumed the first time its ticket becomes head or is removed,
//! so a wait settles at most once and its registration disappears with it.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::oneshot;

use super::TicketId;
use crate::error::QueueError;

pub(crate) type WaitResult = Result<(), QueueError>;

#[derive(Default)]
pub(crate) struct Waiters {
    by_ticket: HashMap<TicketId, Vec<oneshot::Sender<WaitResult>>>,
}

impl Waiters {
    /// Registers a new wait for `id` and returns the receiving half.
    pub(crate) fn register(&mut self, id: TicketId) -> oneshot::Receiver<WaitResult> {
        let (tx, rx) = oneshot::channel();
        let slot = self.by_ticket.entry(id).or_default();
        slot.retain(|tx| !tx.is_closed());
        slot.push(tx);
        rx
    }

    /// Settles every wait on `id` successfully.
    pub(crate) fn settle_first(&mut self, id: TicketId) {
        self.settle(id, || Ok(()));
    }

    /// Fails every wait on `id` with the removal reason.
    pub(crate) fn settle_removed(&mut self, id: TicketId, reason: Option<&Arc<str>>) {
        self.settle(id, || {
            Err(QueueError::Removed {
                id,
                reason: reason.cloned(),
            })
        });
    }

    fn settle(&mut self, id: TicketId, outcome: impl Fn() -> WaitResult) {
        if let Some(senders) = self.by_ticket.remove(&id) {
            for tx in senders {
                // Receiver may have been dropped by a caller that stopped waiting.
                let _ = tx.send(outcome());
            }
        }
    }

    /// Number of tickets with at least one registered wait.
    pub(crate) fn len(&self) -> usize {
        self.by_ticket.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settle_first_resolves_all_waits_once() {
        let mut waiters = Waiters::default();
        let id = TicketId::new(1);
        let mut a = waiters.register(id);
        let mut b = waiters.register(id);

        waiters.settle_first(id);
        waiters.settle_removed(id, None);

        assert_eq!(a.try_recv().unwrap(), Ok(()));
        assert_eq!(b.try_recv().unwrap(), Ok(()));
        assert_eq!(waiters.len(), 0);
    }

    #[test]
    fn test_settle_removed_carries_reason() {
        let mut waiters = Waiters::default();
        let id = TicketId::new(5);
        let mut rx = waiters.register(id);
        let reason: Arc<str> = Arc::from("cancelled");

        waiters.settle_removed(id, Some(&reason));

        assert_eq!(
            rx.try_recv().unwrap(),
            Err(QueueError::Removed {
                id,
                reason: Some(reason)
            })
        );
    }

    #[test]
    fn test_other_tickets_untouched() {
        let mut waiters = Waiters::default();
        let mut rx = waiters.register(TicketId::new(2));

        waiters.settle_first(TicketId::new(3));

        assert!(rx.try_recv().is_err());
        assert_eq!(waiters.len(), 1);
    }

    #[test]
    fn test_dropped_receivers_are_pruned_on_register() {
        let mut waiters = Waiters::default();
        let id = TicketId::new(9);
        drop(waiters.register(id));
        let _live = waiters.register(id);

        assert_eq!(waiters.by_ticket[&id].len(), 1);
    }
}

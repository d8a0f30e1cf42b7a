//! # SubscriberSet: one lossless worker per subscriber
//!
//! Each subscriber gets its own receiver on the queue's [`Bus`] and a worker
//! task that feeds it. Workers never share a channel, so a slow or panicking
//! subscriber only delays itself.
//!
//! ## Lifecycle
//! ```text
//! attach(bus, [S1, S2])
//!    ├─► bus.subscribe() ─► worker S1 ─► recv ─► accepts? ─► on_event (catch_unwind)
//!    └─► bus.subscribe() ─► worker S2 ─► recv ─► accepts? ─► on_event (catch_unwind)
//!
//! queue dropped ─► bus dropped ─► workers drain backlog ─► recv() = None ─► WorkerReport
//! join() ─► [WorkerReport S1, WorkerReport S2]
//! ```
//!
//! Dropping a `SubscriberSet` detaches the workers; they still run until the
//! queue is gone.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use super::Subscribe;
use crate::events::{Bus, Event};

/// What one subscriber worker did over its lifetime.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkerReport {
    /// Subscriber name, from [`Subscribe::name`].
    pub name: &'static str,
    /// Events handed to `on_event` that returned normally.
    pub delivered: u64,
    /// Events skipped because [`Subscribe::accepts`] returned `false`.
    pub filtered: u64,
    /// Events whose `on_event` panicked.
    pub panicked: u64,
}

/// Worker tasks feeding the subscribers of one queue.
pub struct SubscriberSet {
    workers: Vec<(&'static str, JoinHandle<WorkerReport>)>,
}

impl SubscriberSet {
    /// A set with no workers.
    pub(crate) fn empty() -> Self {
        Self {
            workers: Vec::new(),
        }
    }

    /// Subscribes every subscriber to `bus` and spawns its worker.
    ///
    /// Must be called within a Tokio runtime.
    pub(crate) fn attach(bus: &Bus, subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let workers = subs
            .into_iter()
            .map(|sub| {
                let name = sub.name();
                let rx = bus.subscribe();
                (name, tokio::spawn(run(sub, rx)))
            })
            .collect();
        Self { workers }
    }

    /// Waits until every worker has drained its backlog and stopped.
    ///
    /// Workers stop only once the queue is dropped, so drop every
    /// [`TicketQueue`](crate::TicketQueue) clone before awaiting this.
    pub async fn join(self) -> Vec<WorkerReport> {
        let mut reports = Vec::with_capacity(self.workers.len());
        for (name, handle) in self.workers {
            match handle.await {
                Ok(report) => reports.push(report),
                Err(err) => tracing::error!(subscriber = name, %err, "subscriber worker failed"),
            }
        }
        reports
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.workers.len()
    }
}

async fn run(sub: Arc<dyn Subscribe>, mut rx: mpsc::UnboundedReceiver<Event>) -> WorkerReport {
    let mut report = WorkerReport {
        name: sub.name(),
        ..WorkerReport::default()
    };

    while let Some(ev) = rx.recv().await {
        if !sub.accepts(ev.kind) {
            report.filtered += 1;
            continue;
        }
        match AssertUnwindSafe(sub.on_event(&ev)).catch_unwind().await {
            Ok(()) => report.delivered += 1,
            Err(panic) => {
                report.panicked += 1;
                tracing::error!(
                    subscriber = report.name,
                    seq = ev.seq,
                    ticket = ?ev.ticket,
                    info = %panic_info(panic.as_ref()),
                    "subscriber panicked"
                );
            }
        }
    }

    tracing::debug!(
        subscriber = report.name,
        delivered = report.delivered,
        panicked = report.panicked,
        "subscriber worker stopped"
    );
    report
}

fn panic_info(any: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

//! # QueueBuilder: wiring a queue to its subscribers.
//!
//! The builder creates the queue state and its [`Bus`], then attaches one
//! worker per [`Subscribe`] implementation before the first ticket can be
//! acquired, so subscribers never miss an event.

use std::sync::Arc;

use super::queue::{Shared, TicketQueue};
use crate::{
    config::QueueConfig,
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`TicketQueue`] with optional subscribers.
pub struct QueueBuilder {
    cfg: QueueConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl QueueBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: QueueConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive every queue event (acquisitions, head changes,
    /// removals, requeues) in order, each through its own worker. Attaching
    /// them requires a Tokio runtime.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds a single subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds the queue; subscriber workers run detached until the queue is dropped.
    pub fn build(self) -> TicketQueue {
        self.build_attached().0
    }

    /// Builds the queue and returns the handle to its subscriber workers.
    ///
    /// Await [`SubscriberSet::join`] after dropping the queue to make sure every
    /// subscriber has handled every event.
    pub fn build_attached(self) -> (TicketQueue, SubscriberSet) {
        let shared = Arc::new(Shared::new(self.cfg, Bus::new()));

        let set = if self.subscribers.is_empty() {
            SubscriberSet::empty()
        } else if tokio::runtime::Handle::try_current().is_err() {
            tracing::warn!(
                subscribers = self.subscribers.len(),
                "no tokio runtime; subscribers not attached"
            );
            SubscriberSet::empty()
        } else {
            SubscriberSet::attach(&shared.bus, self.subscribers)
        };

        (TicketQueue::from_shared(shared), set)
    }
}

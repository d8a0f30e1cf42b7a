//! Queue events: types and delivery bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the ticket queue.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] lossless, ordered fan-out over per-receiver `tokio::sync::mpsc` channels
//!
//! ## Quick reference
//! - **Publishers**: `TicketQueue` operations and stall timers.
//! - **Consumers**: `TicketQueue::subscribe()` receivers and the subscriber workers
//!   started by `QueueBuilder::build()`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};

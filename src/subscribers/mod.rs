//! # Event subscribers for the ticket queue.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] of
//! per-subscriber workers and a built-in [`LogWriter`] (feature `logging`).
//!
//! ## Architecture
//! ```text
//! TicketQueue ── publish(Event) ──► Bus ──┬──► [channel S1] ─► worker S1 ─► S1.on_event()
//!                                         └──► [channel SN] ─► worker SN ─► SN.on_event()
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscriber;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::{SubscriberSet, WorkerReport};
pub use subscriber::Subscribe;

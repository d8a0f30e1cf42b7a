//! # turnstile
//!
//! **Turnstile** is an in-process fairness primitive for async Rust.
//!
//! It lets many independent tasks reserve their place in a first-in-first-out
//! order *without blocking*, and later block only when they need to act on that
//! order. Preparatory work runs concurrently; the final, order-sensitive step
//! (e.g. emitting messages in a guaranteed sequence) runs strictly in
//! acquisition order.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!      task A            task B            task C
//!        │ acquire()       │ acquire()       │ acquire()
//!        ▼                 ▼                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  TicketQueue                                                      │
//! │  - order: [#1, #2, #3]   (head first, no duplicates)              │
//! │  - next id counter       (strictly increasing, never reused)      │
//! │  - Waiters               (oneshot per pending wait, keyed by id)  │
//! │  - stall supervisor      (one timer, always watching the head)    │
//! │  - Bus                   (lossless, ordered queue events)         │
//! └──────┬──────────────────────────┬──────────────────────────┬──────┘
//!        │ HeadChanged(#1)          │ TicketRemoved(#2, why)   │ timer(#1) expired
//!        ▼                          ▼                          ▼
//!   settle waits on #1 (Ok)   fail waits on #2          requeue #1 (retries += 1)
//!   re-arm supervisor                                   or evict #1 after the limit
//! ```
//!
//! ### Lifecycle
//! ```text
//! acquire() ──► Ticket ──► prepare (concurrently, no queue involvement)
//!                  │
//!                  ├─► wait_until_first().await   (suspends until head, then removes)
//!                  │       ├─ Ok  ──► do the ordered work
//!                  │       └─ Err ──► Disposed / NotPresent / Removed{reason} / Closed
//!                  │
//!                  └─► drop(ticket)  ──► removed with reason "scope exited"
//!
//! stall supervision (timeout > 0):
//!   head for `timeout` ──► retries < limit ? requeue to tail : evict ("stalled past retry limit")
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                   |
//! |-------------------|---------------------------------------------------------------|--------------------------------------|
//! | **Queue**         | Acquire, remove, inspect, wait for the head.                  | [`TicketQueue`], [`Ticket`]          |
//! | **Supervision**   | Requeue or evict a head that stalls.                          | [`QueueConfig`]                      |
//! | **Events**        | Observe acquisitions, head changes, removals, requeues.       | [`Event`], [`EventKind`]             |
//! | **Subscriber API**| Hook into queue events (logging, metrics, custom subscribers).| [`Subscribe`], [`SubscriberSet`]     |
//! | **Errors**        | Typed errors for configuration and waits.                     | [`ConfigError`], [`QueueError`]      |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in `LogWriter` _(demo/reference only)_.
//!
//! ## Concurrency model
//! Acquisition, removal and head inspection are synchronous and never suspend.
//! Each of them runs in one short critical section that also delivers every
//! notification it causes, so no other operation can observe a stale head.
//! Only the wait operations suspend. Stall timers re-enter through the same
//! removal path as callers do.
//!
//! ## Example
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use std::time::Duration;
//! use turnstile::{QueueConfig, TicketQueue};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let queue = TicketQueue::new(QueueConfig::default());
//!     let out = Arc::new(Mutex::new(Vec::new()));
//!
//!     let mut handles = Vec::new();
//!     for i in 0..3u64 {
//!         // Reserve the turn before the work starts.
//!         let ticket = queue.acquire();
//!         let out = Arc::clone(&out);
//!         handles.push(tokio::spawn(async move {
//!             // Prepare concurrently; later tickets happen to finish first.
//!             tokio::time::sleep(Duration::from_millis(30 - i * 10)).await;
//!             ticket.wait_until_first().await?;
//!             out.lock().unwrap().push(i);
//!             Ok::<_, turnstile::QueueError>(())
//!         }));
//!     }
//!     for h in handles {
//!         h.await??;
//!     }
//!
//!     assert_eq!(*out.lock().unwrap(), vec![0, 1, 2]);
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod subscribers;

// ---- Public re-exports ----

pub use config::QueueConfig;
pub use self::core::{
    QueueBuilder, Ticket, TicketId, TicketQueue, SCOPE_EXITED, STALLED_PAST_RETRY_LIMIT,
};
pub use error::{ConfigError, QueueError};
pub use events::{Bus, Event, EventKind};
pub use subscribers::{Subscribe, SubscriberSet, WorkerReport};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
